//! Packet-based IO protocol
//!
//! Fixed-size, XOR-checksummed packets exchanged with the host over a byte stream.
//! [`Receiver`] assembles packets from received bytes one byte at a time and
//! resynchronizes on checksum errors by sliding its window. [`Transmitter`]
//! serializes packets into the transmit queue. Both talk to the byte stream only
//! through the [`ReceiveQueue`] and [`TransmitQueue`] traits.

/// Packet data model and wire format
pub mod packet;
/// Packet assembly from received bytes
pub mod receiver;
/// Packet serialization to the transmit queue
pub mod transmitter;

pub use packet::{Packet, CommandByte};
pub use receiver::Receiver;
pub use transmitter::Transmitter;

use crate::hal_ext::{ByteQueue, SharedQueue};

/// Source of received bytes
pub trait ReceiveQueue {
    /// Take the next received byte, if any; never blocks
    fn receive_byte(&mut self) -> Option<u8>;
}

/// Sink for bytes to be transmitted
pub trait TransmitQueue {
    /// Queue a byte for transmission; `false` if there is no space
    fn transmit_byte(&mut self, byte: u8) -> bool;

    /// Number of bytes that can currently be queued
    fn free(&self) -> usize;
}

impl<const N: usize> ReceiveQueue for ByteQueue<N> {
    fn receive_byte(&mut self) -> Option<u8> {
        self.get()
    }
}

impl<const N: usize> TransmitQueue for ByteQueue<N> {
    fn transmit_byte(&mut self, byte: u8) -> bool {
        self.put(byte)
    }

    fn free(&self) -> usize {
        ByteQueue::free(self)
    }
}

impl<const N: usize> ReceiveQueue for &SharedQueue<N> {
    fn receive_byte(&mut self) -> Option<u8> {
        self.get()
    }
}

impl<const N: usize> TransmitQueue for &SharedQueue<N> {
    fn transmit_byte(&mut self, byte: u8) -> bool {
        self.put(byte)
    }

    fn free(&self) -> usize {
        SharedQueue::free(self)
    }
}

impl<Q: ReceiveQueue + ?Sized> ReceiveQueue for &mut Q {
    fn receive_byte(&mut self) -> Option<u8> {
        (**self).receive_byte()
    }
}

impl<Q: TransmitQueue + ?Sized> TransmitQueue for &mut Q {
    fn transmit_byte(&mut self, byte: u8) -> bool {
        (**self).transmit_byte(byte)
    }

    fn free(&self) -> usize {
        (**self).free()
    }
}
