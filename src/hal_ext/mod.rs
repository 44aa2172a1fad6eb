//! Hardware abstraction extensions
//!
//! Building blocks that sit between the MCU HAL and the packet protocol:
//! interrupt-safe byte queues, the serial transport and checksum generation.

pub mod checksum;
pub mod fifo;
pub mod uart;

pub use checksum::{ChecksumGen, Xor8};
pub use fifo::{ByteQueue, SharedQueue};
