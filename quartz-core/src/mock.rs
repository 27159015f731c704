//! Recording stand-ins for board peripherals, shared by the unit tests.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::hal::{MidiOut, Settle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Data,
    Clock,
    Latch,
    /// A settle wait, not a line
    Hold,
}

pub type Journal = Rc<RefCell<Vec<(Line, bool)>>>;

/// An output line appending every level it's driven to into a shared journal.
pub struct RecordingPin {
    line: Line,
    journal: Journal,
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.journal.borrow_mut().push((self.line, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.journal.borrow_mut().push((self.line, true));
        Ok(())
    }
}

/// Returns (data, clock, latch) pins sharing one journal.
pub fn line_set() -> (RecordingPin, RecordingPin, RecordingPin, Journal) {
    let journal = Journal::default();
    let pin = |line| RecordingPin {
        line,
        journal: journal.clone(),
    };

    (pin(Line::Data), pin(Line::Clock), pin(Line::Latch), journal)
}

/// Reassembles the words committed by each latch rising edge.
pub fn latched_words(journal: &Journal) -> Vec<u16> {
    let mut words = Vec::new();
    let mut data = false;
    let mut clock = false;
    let mut latch = true;
    let mut shift: u16 = 0;

    for &(line, level) in journal.borrow().iter() {
        match line {
            Line::Data => data = level,
            Line::Clock => {
                if level && !clock {
                    shift = (shift << 1) | data as u16;
                }
                clock = level;
            }
            Line::Latch => {
                if level && !latch {
                    words.push(shift);
                }
                latch = level;
            }
            Line::Hold => {}
        }
    }

    words
}

/// Settle hook that marks each wait in the line journal.
pub struct JournalSettle(pub Journal);

impl Settle for JournalSettle {
    fn settle(&mut self) {
        self.0.borrow_mut().push((Line::Hold, false));
    }
}

/// A delay that only counts how long it was asked to wait.
#[derive(Default)]
pub struct CountingDelay {
    pub total_ns: u64,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

#[derive(Default)]
pub struct ByteSink {
    pub bytes: Vec<u8>,
}

impl MidiOut for ByteSink {
    type Error = Infallible;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }
}
