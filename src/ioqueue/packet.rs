use bitfield::bitfield;
use static_assertions::const_assert_eq;

use crate::hal_ext::Xor8;

/// Number of bytes of a packet on the wire
pub const PACKET_SIZE: usize = 5;

/// Bit of the command byte requesting an acknowledgement
pub const ACK_FLAG: u8 = 0x80;

const_assert_eq!(PACKET_SIZE, core::mem::size_of::<[u8; 5]>());
const_assert_eq!(ACK_FLAG, 1 << 7);

bitfield! {
    /// Command byte: bit 7 requests an ACK, bits 6..0 are the command code
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct CommandByte(u8);
    impl Debug;
    pub ack, set_ack: 7;
    pub u8, code, set_code: 6, 0;
}

/// Single protocol packet
///
/// Wire format, no delimiters:
///
/// ```text
/// | command | parameter1 | parameter2 | parameter3 | checksum |
/// ```
///
/// where `checksum = command ^ parameter1 ^ parameter2 ^ parameter3`. The checksum
/// covers the command byte as transmitted, including the ACK flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub struct Packet {
    pub command: u8,
    pub parameter1: u8,
    pub parameter2: u8,
    pub parameter3: u8,
    pub checksum: u8,
}

impl Packet {
    /// Build a packet with correct checksum
    pub fn new(command: u8, parameter1: u8, parameter2: u8, parameter3: u8) -> Self {
        Self {
            command,
            parameter1,
            parameter2,
            parameter3,
            checksum: Self::compute_checksum(command, parameter1, parameter2, parameter3),
        }
    }

    /// Interpret raw bytes, keeping the received checksum as is
    pub const fn from_bytes(bytes: [u8; PACKET_SIZE]) -> Self {
        let [command, parameter1, parameter2, parameter3, checksum] = bytes;
        Self { command, parameter1, parameter2, parameter3, checksum }
    }

    pub const fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        [self.command, self.parameter1, self.parameter2, self.parameter3, self.checksum]
    }

    pub fn compute_checksum(command: u8, parameter1: u8, parameter2: u8, parameter3: u8) -> u8 {
        Xor8::of(&[command, parameter1, parameter2, parameter3])
    }

    /// Whether the stored checksum matches the other fields
    pub fn is_valid(&self) -> bool {
        self.checksum == Self::compute_checksum(self.command, self.parameter1, self.parameter2, self.parameter3)
    }

    pub fn command_byte(&self) -> CommandByte {
        CommandByte(self.command)
    }

    /// Command code without the ACK flag
    pub fn code(&self) -> u8 {
        self.command_byte().code()
    }

    pub fn ack_requested(&self) -> bool {
        self.command_byte().ack()
    }

    /// Same packet with the ACK flag set or cleared, checksum recomputed
    pub fn with_ack(&self, ack: bool) -> Self {
        let mut command = self.command_byte();
        command.set_ack(ack);
        Self::new(command.0, self.parameter1, self.parameter2, self.parameter3)
    }

    pub fn parameters(&self) -> (u8, u8, u8) {
        (self.parameter1, self.parameter2, self.parameter3)
    }
}

impl From<[u8; PACKET_SIZE]> for Packet {
    fn from(bytes: [u8; PACKET_SIZE]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Packet> for [u8; PACKET_SIZE] {
    fn from(packet: Packet) -> Self {
        packet.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_computes_checksum() {
        let p = Packet::new(0x04, 0, 0, 0);
        assert_eq!(p.to_bytes(), [0x04, 0, 0, 0, 0x04]);
        assert!(p.is_valid());

        let p = Packet::new(0x0b, 0x01, 0x0b, 0x05);
        assert_eq!(p.checksum, 0x0b ^ 0x01 ^ 0x0b ^ 0x05);
    }

    #[test]
    fn from_bytes_keeps_checksum() {
        let p = Packet::from_bytes([0x09, b'v', 1, 0, 0xee]);
        assert_eq!(p.checksum, 0xee);
        assert!(!p.is_valid());
        assert_eq!(<[u8; PACKET_SIZE]>::from(p), [0x09, b'v', 1, 0, 0xee]);
    }

    #[test]
    fn ack_flag_is_part_of_checksum() {
        let plain = Packet::new(0x04, 0, 0, 0);
        let acked = plain.with_ack(true);
        assert_eq!(acked.command, 0x84);
        assert_eq!(acked.checksum, 0x84);
        assert!(acked.is_valid());
        assert_eq!(acked.with_ack(false), plain);
    }

    #[test]
    fn command_byte_fields() {
        let p = Packet::new(0x8b, 2, 3, 4);
        assert!(p.ack_requested());
        assert_eq!(p.code(), 0x0b);

        let mut cmd = CommandByte(0x7f);
        assert!(!cmd.ack());
        cmd.set_ack(true);
        assert_eq!(cmd.0, 0xff);
        cmd.set_code(0x04);
        assert_eq!(cmd.0, 0x84);
    }
}
