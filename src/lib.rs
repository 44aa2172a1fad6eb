#![no_std]

// Use std when running tests, see: https://stackoverflow.com/a/28186509
// Tests run on the host without the `firmware` feature, firmware is built with e.g.
//   cargo build --release --features firmware --target thumbv6m-none-eabi
#[cfg(test)]
#[macro_use]
extern crate std;

#[macro_use]
pub mod log;

pub mod commands;
pub mod config;
pub mod hal_ext;
pub mod ioqueue;

/// Build metadata generated by `built`
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
