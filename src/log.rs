//! Logging macros
//!
//! Library code logs through [`link_log!`] so that host builds (tests) do not
//! need a `defmt` global logger. Without the `defmt-log` feature arguments are
//! still evaluated, so there are no unused variable warnings.

#[cfg(not(feature = "defmt-log"))]
#[macro_export]
macro_rules! link_log {
    ($level:ident, $fmt:literal $(, $arg:expr)* $(,)?) => { { $( let _ = &$arg; )* } };
}

#[cfg(feature = "defmt-log")]
#[macro_export]
macro_rules! link_log {
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
}
