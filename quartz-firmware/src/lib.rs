#![no_std]

pub mod board;
mod macros;

/// 125 MHz system clock / 250 = 500 kHz, two counter ticks per microsecond.
pub const TIMER_CLOCK_DIVIDER: u8 = 250;
