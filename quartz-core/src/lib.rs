//! Timing and control engine of the Quartz MIDI clock.
//!
//! Everything here is hardware agnostic: the board crate wires the pieces to
//! its timer, pin-change interrupt, UART and shift-register lines, and the
//! simulator wires them to fakes.
//!
//! ```text
//! encoder pins -> QuadratureDecoder -> TempoModel -> TickPeriod -> timer
//! timer IRQ    -> PulseEngine -> CvDriver (gate)
//!                             -> pending pulses -> MidiEmitter (control loop)
//!                             -> beat indicator -> DisplayRenderer (control loop)
//! ```

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod cv;
pub mod display;
pub mod encoder;
pub mod error;
pub mod hal;
pub mod midi;
pub mod pulse;
pub mod shared;
pub mod shift_register;
pub mod tempo;

mod log;

#[cfg(test)]
mod mock;

pub use config::{BeatDivision, ClockConfig, PULSES_PER_BEAT};
pub use cv::CvDriver;
pub use display::DisplayRenderer;
pub use encoder::{Direction, EncoderState, QuadratureDecoder};
pub use error::ConfigError;
pub use midi::{MidiEmitter, RealTimeMessage};
pub use pulse::{BeatPhase, PulseEngine};
pub use shared::Shared;
pub use shift_register::BitSerialOutput;
pub use tempo::{TempoModel, TickPeriod};
