use super::TransmitQueue;
use super::packet::{Packet, PACKET_SIZE};

/// Packet transmission statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub struct Stats {
    /// Packets queued for transmission
    pub packets: u32,
    /// Packets rejected because the queue had no space for the whole frame
    pub rejected: u32,
}

/// Packet serializer
///
/// Frames are queued whole or not at all: if the transmit queue cannot take all
/// [`PACKET_SIZE`] bytes nothing is written, so the host never sees a truncated frame.
pub struct Transmitter<TX> {
    tx: TX,
    stats: Stats,
}

impl<TX: TransmitQueue> Transmitter<TX> {
    pub fn new(tx: TX) -> Self {
        Self { tx, stats: Stats::default() }
    }

    /// Encode a packet with checksum and queue it; `false` if there is not enough space
    pub fn put(&mut self, command: u8, parameter1: u8, parameter2: u8, parameter3: u8) -> bool {
        self.send(Packet::new(command, parameter1, parameter2, parameter3))
    }

    /// Queue a packet, recomputing its checksum
    pub fn send(&mut self, packet: Packet) -> bool {
        let packet = Packet::new(packet.command, packet.parameter1, packet.parameter2, packet.parameter3);

        // Single producer: free space can only grow between this check and the writes below
        if self.tx.free() < PACKET_SIZE {
            link_log!(warn, "TX queue full, dropping packet {=u8:#x}", packet.command);
            self.stats.rejected = self.stats.rejected.wrapping_add(1);
            return false;
        }

        let queued = packet.to_bytes()
            .iter()
            .all(|&byte| self.tx.transmit_byte(byte));
        debug_assert!(queued, "TX queue shrank while queueing a packet");

        self.stats.packets = self.stats.packets.wrapping_add(1);
        queued
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Access the underlying byte sink
    pub fn queue(&mut self) -> &mut TX {
        &mut self.tx
    }
}
