//! Host command handling
//!
//! Interprets assembled packets and produces the reply packets. Bit 7 of the
//! command byte requests an acknowledgement: on success the request is echoed
//! back with the bit set (ACK), on failure with the bit cleared (NAK). Unknown
//! commands are ignored.

use heapless::Vec;
use static_assertions::const_assert;

use crate::config::LinkConfig;
use crate::ioqueue::Packet;

pub const VERSION_MAJOR: u8 = pkg_version::pkg_version_major!() as u8;
pub const VERSION_MINOR: u8 = pkg_version::pkg_version_minor!() as u8;

const_assert!(pkg_version::pkg_version_major!() <= u8::MAX as u32);
const_assert!(pkg_version::pkg_version_minor!() <= u8::MAX as u32);

/// Number of packets sent on startup
pub const STARTUP_PACKETS: usize = 3;

/// Maximum number of packets produced in response to a single request
pub const MAX_REPLIES: usize = 4;

// Startup reply plus the ACK
const_assert!(MAX_REPLIES >= STARTUP_PACKETS + 1);

pub type Replies = Vec<Packet, MAX_REPLIES>;

/// Command codes, without the ACK flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Host (re)connected, request the startup packets
    Startup = 0x04,
    /// Query firmware version
    Version = 0x09,
    /// Get or set the tower number
    TowerNumber = 0x0b,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub enum Error {
    /// Known command with parameters it does not accept
    InvalidParameters,
    /// Command code not recognized
    UnknownCommand,
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0x04 => Command::Startup,
            0x09 => Command::Version,
            0x0b => Command::TowerNumber,
            _ => return Err(Error::UnknownCommand),
        })
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> Self {
        cmd as u8
    }
}

// Parameter values of the requests
const VERSION_QUERY: (u8, u8, u8) = (b'v', b'x', b'\r');
const TOWER_NUMBER_GET: u8 = 1;
const TOWER_NUMBER_SET: u8 = 2;

/// Command handler state
pub struct Handler {
    tower_number: u16,
    nak_on_failure: bool,
}

impl Handler {
    pub const fn new(config: &LinkConfig) -> Self {
        Self {
            tower_number: config.tower_number,
            nak_on_failure: config.nak_on_failure,
        }
    }

    pub fn tower_number(&self) -> u16 {
        self.tower_number
    }

    /// Packets announcing the device: startup, version and tower number
    pub fn startup_packets(&self) -> [Packet; STARTUP_PACKETS] {
        [
            Packet::new(Command::Startup.into(), 0, 0, 0),
            version_packet(),
            self.tower_number_packet(TOWER_NUMBER_GET),
        ]
    }

    /// Handle a received packet, returning packets to be sent back
    pub fn handle(&mut self, packet: &Packet) -> Replies {
        let mut replies = Replies::new();

        let result = Command::try_from(packet.code())
            .and_then(|cmd| self.dispatch(cmd, packet, &mut replies));

        match result {
            Ok(()) => {
                link_log!(info, "Handled command {=u8:#x}", packet.command);
                if packet.ack_requested() {
                    push(&mut replies, packet.with_ack(true));
                }
            },
            Err(Error::UnknownCommand) => {
                link_log!(warn, "Unknown command {=u8:#x}", packet.command);
            },
            Err(e) => {
                link_log!(warn, "Command {=u8:#x} failed: {}", packet.command, e);
                replies.clear();
                if packet.ack_requested() && self.nak_on_failure {
                    push(&mut replies, packet.with_ack(false));
                }
            },
        }

        replies
    }

    fn dispatch(&mut self, cmd: Command, packet: &Packet, replies: &mut Replies) -> Result<(), Error> {
        match (cmd, packet.parameters()) {
            (Command::Startup, (0, _, _)) => {
                for p in self.startup_packets() {
                    push(replies, p);
                }
            },
            (Command::Version, params) if params == VERSION_QUERY => {
                push(replies, version_packet());
            },
            (Command::TowerNumber, (TOWER_NUMBER_GET, 0, 0)) => {
                push(replies, self.tower_number_packet(TOWER_NUMBER_GET));
            },
            (Command::TowerNumber, (TOWER_NUMBER_SET, lsb, msb)) => {
                self.tower_number = u16::from_le_bytes([lsb, msb]);
                link_log!(info, "Tower number set to {=u16}", self.tower_number);
                push(replies, self.tower_number_packet(TOWER_NUMBER_SET));
            },
            _ => return Err(Error::InvalidParameters),
        }
        Ok(())
    }

    fn tower_number_packet(&self, mode: u8) -> Packet {
        let [lsb, msb] = self.tower_number.to_le_bytes();
        Packet::new(Command::TowerNumber.into(), mode, lsb, msb)
    }
}

fn version_packet() -> Packet {
    Packet::new(Command::Version.into(), b'v', VERSION_MAJOR, VERSION_MINOR)
}

fn push(replies: &mut Replies, packet: Packet) {
    if replies.push(packet).is_err() {
        link_log!(error, "Too many replies, dropping {=u8:#x}", packet.command);
    }
}
