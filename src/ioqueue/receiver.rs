use super::ReceiveQueue;
use super::packet::{Packet, PACKET_SIZE};

/// Assembly progress, named after the slot that the next byte fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub enum State {
    AwaitingCommand,
    AwaitingParam1,
    AwaitingParam2,
    AwaitingParam3,
    AwaitingChecksum,
    /// All slots filled; only exists inside a single [`Receiver::feed`] call
    Validating,
}

impl State {
    /// Number of slots filled when in this state
    const fn cursor(self) -> usize {
        match self {
            State::AwaitingCommand => 0,
            State::AwaitingParam1 => 1,
            State::AwaitingParam2 => 2,
            State::AwaitingParam3 => 3,
            State::AwaitingChecksum => 4,
            State::Validating => 5,
        }
    }

    const fn next(self) -> Self {
        match self {
            State::AwaitingCommand => State::AwaitingParam1,
            State::AwaitingParam1 => State::AwaitingParam2,
            State::AwaitingParam2 => State::AwaitingParam3,
            State::AwaitingParam3 => State::AwaitingChecksum,
            State::AwaitingChecksum | State::Validating => State::Validating,
        }
    }
}

/// Packet reception statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub struct Stats {
    /// Valid packets assembled
    pub packets: u32,
    /// Candidate frames rejected by checksum (each one shifts the window by a byte)
    pub checksum_failures: u32,
}

/// Packet assembler
///
/// Pulls at most one byte per [`Self::try_assemble`] call from the receive queue.
/// When a complete candidate frame fails the checksum only its first byte is
/// dropped: the remaining four bytes are shifted down and the next received byte
/// is tried as the new checksum. A single stray byte in front of a valid packet
/// thus costs one failed attempt instead of the whole packet.
pub struct Receiver<RX> {
    rx: RX,
    window: [u8; PACKET_SIZE],
    state: State,
    stats: Stats,
}

impl<RX: ReceiveQueue> Receiver<RX> {
    pub fn new(rx: RX) -> Self {
        Self {
            rx,
            window: [0; PACKET_SIZE],
            state: State::AwaitingCommand,
            stats: Stats::default(),
        }
    }

    /// Consume one byte (if available) and return a packet if it completed a valid one
    pub fn try_assemble(&mut self) -> Option<Packet> {
        let byte = self.rx.receive_byte()?;
        self.feed(byte)
    }

    /// Consume received bytes until a packet is complete or the queue is empty
    pub fn drain(&mut self) -> Option<Packet> {
        while let Some(byte) = self.rx.receive_byte() {
            if let Some(packet) = self.feed(byte) {
                return Some(packet);
            }
        }
        None
    }

    /// Advance the state machine with a single byte
    pub fn feed(&mut self, byte: u8) -> Option<Packet> {
        link_log!(trace, "RX {=u8:#x}", byte);

        self.window[self.state.cursor()] = byte;
        self.state = self.state.next();

        if self.state != State::Validating {
            return None;
        }

        let packet = Packet::from_bytes(self.window);
        if packet.is_valid() {
            self.state = State::AwaitingCommand;
            self.stats.packets = self.stats.packets.wrapping_add(1);
            Some(packet)
        } else {
            link_log!(debug, "Checksum mismatch, dropping {=u8:#x}", self.window[0]);
            self.window.copy_within(1.., 0);
            self.state = State::AwaitingChecksum;
            self.stats.checksum_failures = self.stats.checksum_failures.wrapping_add(1);
            None
        }
    }

    /// Current assembly state
    pub fn state(&self) -> State {
        self.state
    }

    /// Forget any partially assembled packet
    pub fn reset(&mut self) {
        self.state = State::AwaitingCommand;
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Access the underlying byte source
    pub fn queue(&mut self) -> &mut RX {
        &mut self.rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use crate::hal_ext::ByteQueue;

    type TestReceiver = Receiver<ByteQueue<64>>;

    fn receiver_with(data: &[u8]) -> TestReceiver {
        let mut rx = Receiver::new(ByteQueue::new());
        assert!(rx.queue().put_all(data));
        rx
    }

    /// Call try_assemble once per byte, collecting the results
    fn assemble_each(rx: &mut TestReceiver, n: usize) -> Vec<Option<Packet>> {
        (0..n).map(|_| rx.try_assemble()).collect()
    }

    #[test]
    fn empty_queue() {
        let mut rx = receiver_with(&[]);
        for _ in 0..10 {
            assert_eq!(rx.try_assemble(), None);
        }
        assert_eq!(rx.state(), State::AwaitingCommand);
    }

    #[test]
    fn single_packet() {
        let mut rx = receiver_with(&[0x09, b'v', b'x', 13, 0x09 ^ b'v' ^ b'x' ^ 13]);
        let results = assemble_each(&mut rx, 5);
        assert_eq!(&results[..4], &[None; 4]);
        assert_eq!(results[4], Some(Packet::new(0x09, b'v', b'x', 13)));
        assert_eq!(rx.state(), State::AwaitingCommand);
        assert_eq!(rx.stats(), &Stats { packets: 1, checksum_failures: 0 });
    }

    #[test]
    fn consumes_one_byte_per_call() {
        let mut rx = receiver_with(&[0x04, 0, 0, 0, 0x04]);
        rx.try_assemble();
        rx.try_assemble();
        assert_eq!(rx.queue().len(), 3);
        assert_eq!(rx.state(), State::AwaitingParam2);
    }

    #[test]
    fn resync_after_stray_byte() {
        let mut rx = receiver_with(&[0xaa, 0x04, 0x00, 0x00, 0x00, 0x04]);
        let results = assemble_each(&mut rx, 6);
        assert_eq!(&results[..5], &[None; 5]);
        assert_eq!(results[5], Some(Packet::from_bytes([0x04, 0, 0, 0, 0x04])));
        assert_eq!(rx.stats().checksum_failures, 1);
    }

    #[test]
    fn mismatch_shifts_window() {
        let mut rx = receiver_with(&[0x01, 0x02, 0x03, 0x04, 0x05]);
        assert_eq!(assemble_each(&mut rx, 5), [None; 5]);
        assert_eq!(rx.state(), State::AwaitingChecksum);
        assert_eq!(&rx.window[..4], &[0x02, 0x03, 0x04, 0x05]);
    }

    #[test]
    fn stale_bytes_are_reused() {
        // 0x02 ^ 0x03 ^ 0x04 ^ 0x05 = 0x00, so after one shift a 0x00 byte completes a packet
        let mut rx = receiver_with(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x00]);
        let results = assemble_each(&mut rx, 6);
        assert_eq!(results[5], Some(Packet::from_bytes([0x02, 0x03, 0x04, 0x05, 0x00])));
    }

    #[test]
    fn resync_after_several_stray_bytes() {
        let mut data = vec![0x55, 0x66, 0x77];
        data.extend_from_slice(&Packet::new(0x0b, 1, 0x0b, 0x05).to_bytes());
        let mut rx = receiver_with(&data);
        let packets: Vec<_> = assemble_each(&mut rx, data.len()).into_iter().flatten().collect();
        assert_eq!(packets, [Packet::new(0x0b, 1, 0x0b, 0x05)]);
        assert_eq!(rx.stats().checksum_failures, 3);
    }

    #[test]
    fn partial_packet_persists() {
        let mut rx = receiver_with(&[0x84, 0x00, 0x00]);
        for _ in 0..100 {
            assert_eq!(rx.try_assemble(), None);
        }
        assert_eq!(rx.state(), State::AwaitingParam3);

        rx.queue().put_all(&[0x00, 0x84]);
        assert_eq!(rx.try_assemble(), None);
        assert_eq!(rx.try_assemble(), Some(Packet::from_bytes([0x84, 0, 0, 0, 0x84])));
    }

    #[test]
    fn ack_flag_not_special() {
        let packet = Packet::new(0x89, b'v', b'x', 13);
        let mut rx = receiver_with(&packet.to_bytes());
        let results = assemble_each(&mut rx, 5);
        assert_eq!(results[4], Some(packet));
        assert!(results[4].unwrap().ack_requested());
    }

    #[test]
    fn back_to_back_packets() {
        let a = Packet::new(0x04, 0, 0, 0);
        let b = Packet::new(0x0b, 2, 0x34, 0x12);
        let mut data = Vec::new();
        data.extend_from_slice(&a.to_bytes());
        data.extend_from_slice(&b.to_bytes());
        let mut rx = receiver_with(&data);
        assert_eq!(rx.drain(), Some(a));
        assert_eq!(rx.drain(), Some(b));
        assert_eq!(rx.drain(), None);
    }

    #[test]
    fn reset_discards_partial() {
        let mut rx = receiver_with(&[0x33, 0x44]);
        assert_eq!(rx.drain(), None);
        assert_eq!(rx.state(), State::AwaitingParam2);
        rx.reset();
        rx.queue().put_all(&Packet::new(0x04, 0, 0, 0).to_bytes());
        assert_eq!(rx.drain(), Some(Packet::new(0x04, 0, 0, 0)));
    }

    #[test]
    fn random_noise_never_yields_invalid_packets() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut rx = Receiver::new(ByteQueue::<1>::new());
        for _ in 0..20_000 {
            rx.queue().put(rng.gen());
            if let Some(packet) = rx.try_assemble() {
                assert!(packet.is_valid());
            }
            assert_ne!(rx.state(), State::Validating);
        }
    }
}
