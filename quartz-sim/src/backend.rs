//! Software stand-ins for the board's pins, timer and delay.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use quartz_core::hal::{EncoderPins, PulseTimer};
use quartz_core::{BitSerialOutput, EncoderState, TickPeriod};

#[derive(Default)]
struct Register {
    data: bool,
    shift: u16,
    latched: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Data,
    Clock,
    Latch,
}

/// One line into a simulated serial-in/parallel-out register pair. The
/// register shifts on the rising clock edge and latches on the rising latch
/// edge, like the real parts.
pub struct RegisterLine {
    role: Role,
    register: Rc<RefCell<Register>>,
}

impl ErrorType for RegisterLine {
    type Error = Infallible;
}

impl OutputPin for RegisterLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.role == Role::Data {
            self.register.borrow_mut().data = false;
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut register = self.register.borrow_mut();

        match self.role {
            Role::Data => register.data = true,
            Role::Clock => register.shift = (register.shift << 1) | register.data as u16,
            Role::Latch => {
                let word = register.shift;
                register.latched.push(word);
            }
        }

        Ok(())
    }
}

/// Read side of a simulated register: the words it latched, oldest first.
#[derive(Clone)]
pub struct RegisterProbe {
    register: Rc<RefCell<Register>>,
}

impl RegisterProbe {
    pub fn take_words(&self) -> Vec<u16> {
        std::mem::take(&mut self.register.borrow_mut().latched)
    }
}

/// Builds a transmitter over a fresh simulated register. The idle latch level
/// set on construction isn't reported as a word.
pub fn register() -> (BitSerialOutput<RegisterLine>, RegisterProbe) {
    let register = Rc::new(RefCell::new(Register::default()));
    let line = |role| RegisterLine {
        role,
        register: register.clone(),
    };

    let output = BitSerialOutput::new(line(Role::Data), line(Role::Clock), line(Role::Latch))
        .unwrap_or_else(|never| match never {});
    let probe = RegisterProbe { register };
    probe.take_words();

    (output, probe)
}

/// Encoder whose contacts are set by the scenario.
#[derive(Debug, Default)]
pub struct SimEncoder {
    state: EncoderState,
}

impl SimEncoder {
    pub fn set(&mut self, state: EncoderState) {
        self.state = state;
    }
}

impl EncoderPins for SimEncoder {
    type Error = Infallible;

    fn read_pins(&mut self) -> Result<EncoderState, Self::Error> {
        Ok(self.state)
    }
}

/// Remembers the period last programmed into it.
#[derive(Debug)]
pub struct SimTimer {
    period: TickPeriod,
    reprogrammed: u32,
}

impl SimTimer {
    pub fn new(period: TickPeriod) -> Self {
        Self {
            period,
            reprogrammed: 0,
        }
    }

    pub fn period(&self) -> TickPeriod {
        self.period
    }

    pub fn reprogrammed(&self) -> u32 {
        self.reprogrammed
    }
}

impl PulseTimer for SimTimer {
    fn configure(&mut self, period: TickPeriod) {
        self.period = period;
        self.reprogrammed += 1;
    }
}

/// The display hold time doesn't matter off the board.
#[derive(Debug, Default)]
pub struct SimDelay;

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
