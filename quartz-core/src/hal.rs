//! The hardware seams of the clock. Output lines are plain
//! [`embedded_hal::digital::OutputPin`]s; everything else the core needs from
//! a board is described here.

use embedded_hal::digital::InputPin;

use crate::encoder::EncoderState;
use crate::tempo::TickPeriod;

/// Samples both encoder phases at once.
pub trait EncoderPins {
    type Error;

    fn read_pins(&mut self) -> Result<EncoderState, Self::Error>;
}

/// A periodic timer firing once per MIDI sub-pulse.
pub trait PulseTimer {
    /// Reprograms the compare value. Takes effect from the next period on.
    fn configure(&mut self, period: TickPeriod);
}

/// Byte sink for MIDI messages (a UART at [`MIDI_BAUD_RATE`](crate::config::MIDI_BAUD_RATE)).
pub trait MidiOut {
    type Error;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Setup and hold margin between two line changes of a shift register.
pub trait Settle {
    fn settle(&mut self);
}

/// No margin, for targets whose pin writes are slow enough on their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSettle;

impl Settle for NoSettle {
    #[inline(always)]
    fn settle(&mut self) {}
}

/// Encoder phases wired with pull-ups: a pin reading low is an active phase.
pub struct ActiveLowPins<A, B> {
    phase_a: A,
    phase_b: B,
}

impl<A, B> ActiveLowPins<A, B> {
    pub fn new(phase_a: A, phase_b: B) -> Self {
        Self { phase_a, phase_b }
    }

    pub fn pins_mut(&mut self) -> (&mut A, &mut B) {
        (&mut self.phase_a, &mut self.phase_b)
    }
}

impl<A, B> EncoderPins for ActiveLowPins<A, B>
where
    A: InputPin,
    B: InputPin<Error = A::Error>,
{
    type Error = A::Error;

    fn read_pins(&mut self) -> Result<EncoderState, Self::Error> {
        let a = self.phase_a.is_low()?;
        let b = self.phase_b.is_low()?;

        Ok(EncoderState::new(a, b))
    }
}
