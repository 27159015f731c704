use embedded_hal::digital::OutputPin;

use crate::hal::{NoSettle, Settle};
use crate::shift_register::BitSerialOutput;

/// Register bit wired to the gate jack.
pub const GATE_HIGH: u16 = 0x0001;
pub const GATE_LOW: u16 = 0x0000;

pub const fn gate_word(gate: bool) -> u16 {
    if gate {
        GATE_HIGH
    } else {
        GATE_LOW
    }
}

/// Drives the CV/gate register. Written once per pulse from the timer interrupt.
pub struct CvDriver<P, S = NoSettle> {
    output: BitSerialOutput<P, S>,
}

impl<P: OutputPin, S: Settle> CvDriver<P, S> {
    pub fn new(output: BitSerialOutput<P, S>) -> Self {
        Self { output }
    }

    pub fn write(&mut self, gate: bool) -> Result<(), P::Error> {
        self.output.transmit(gate_word(gate))
    }
}
