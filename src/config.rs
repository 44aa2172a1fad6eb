//! Link configuration
//!
//! Coded defaults, or generated at build time from JSON when the `json-config`
//! feature is enabled (see `packetlink-config`).

#[cfg(feature = "json-config")]
pub use generated::CONFIG;

#[cfg(not(feature = "json-config"))]
pub use code::CONFIG;

/// Static configuration of the serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub struct LinkConfig {
    /// UART baud rate
    pub baud_rate: u32,
    /// Initial tower number reported to the host
    pub tower_number: u16,
    /// Reply with NAK when a command requesting ACK fails
    pub nak_on_failure: bool,
}

#[cfg(feature = "json-config")]
mod generated {
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

#[cfg(not(feature = "json-config"))]
mod code {
    use super::LinkConfig;

    pub static CONFIG: LinkConfig = LinkConfig {
        baud_rate: 38_400,
        tower_number: 1291,
        nak_on_failure: true,
    };
}
