use core::fmt::{self, Display};

/// Reasons a [`ClockConfig`](crate::config::ClockConfig) can't drive the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `min_bpm` isn't positive or `max_bpm` is below it
    InvalidTempoRange,

    /// `default_bpm` lies outside `[min_bpm, max_bpm]`
    DefaultOutOfRange,

    /// The period at `min_bpm` doesn't fit the 16-bit timer
    PeriodOverflow,

    /// `timer_ticks_per_us` isn't positive
    InvalidTimerRate,

    /// Measure division with zero beats per measure
    EmptyMeasure,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTempoRange => write!(f, "tempo range must be positive and ordered"),
            ConfigError::DefaultOutOfRange => write!(f, "default tempo lies outside the tempo range"),
            ConfigError::PeriodOverflow => {
                write!(f, "minimum tempo overflows the 16-bit timer period")
            }
            ConfigError::InvalidTimerRate => write!(f, "timer tick rate must be positive"),
            ConfigError::EmptyMeasure => write!(f, "a measure needs at least one beat"),
        }
    }
}
