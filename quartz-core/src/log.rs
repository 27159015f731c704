//! Logging that forwards to `defmt` when the `defmt` feature is enabled and
//! compiles to nothing otherwise. Never call these from interrupt handlers.

macro_rules! log_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
    };
}

pub(crate) use log_debug;
