use embedded_hal::digital::OutputPin;

use crate::hal::{NoSettle, Settle};

/// Width of one shift-register transfer (two daisy-chained 8-bit registers).
pub const WORD_BITS: u32 = u16::BITS;

const MSB: u16 = 0x8000;

/// Bit-serial transmitter for a pair of chained serial-in/parallel-out registers,
/// e.g. https://www.ti.com/lit/ds/symlink/sn74hc595.pdf
///
/// Each line set (data, clock, latch) belongs to exactly one instance; a
/// transfer must not be interrupted by another transfer on the same lines.
///
/// `S` waits out the register's setup and pulse-width margins after every
/// line change. Hosts use [`NoSettle`]; a fast MCU supplies a short busy wait.
pub struct BitSerialOutput<P, S = NoSettle> {
    data: P,
    clock: P,
    latch: P,
    settle: S,
}

impl<P: OutputPin> BitSerialOutput<P, NoSettle> {
    /// Takes ownership of the three lines and parks them: data and clock low,
    /// latch high (idle).
    pub fn new(data: P, clock: P, latch: P) -> Result<Self, P::Error> {
        Self::with_settle(data, clock, latch, NoSettle)
    }
}

impl<P: OutputPin, S: Settle> BitSerialOutput<P, S> {
    /// Like [`new`](BitSerialOutput::new), holding every line change for `settle`.
    pub fn with_settle(mut data: P, mut clock: P, mut latch: P, settle: S) -> Result<Self, P::Error> {
        data.set_low()?;
        clock.set_low()?;
        latch.set_high()?;

        Ok(Self {
            data,
            clock,
            latch,
            settle,
        })
    }

    #[inline]
    fn pulse_clock(&mut self) -> Result<(), P::Error> {
        self.clock.set_high()?;
        self.settle.settle();
        self.clock.set_low()?;
        self.settle.settle();

        Ok(())
    }

    /// Shifts `word` out MSB first. The latch is pulled low before the first
    /// bit and raised after the last one, committing the word to the outputs.
    pub fn transmit(&mut self, mut word: u16) -> Result<(), P::Error> {
        self.latch.set_low()?;
        self.settle.settle();

        for _ in 0..WORD_BITS {
            let bit = word & MSB != 0;
            word <<= 1;

            self.data.set_state(bit.into())?;
            self.settle.settle();

            self.pulse_clock()?;
        }

        self.latch.set_high()?;
        self.settle.settle();

        Ok(())
    }

    pub fn release(self) -> (P, P, P) {
        (self.data, self.clock, self.latch)
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use super::*;
    use crate::mock::{latched_words, line_set, JournalSettle, Line};

    #[test]
    fn transmits_digit_one_msb_first() {
        let (data, clock, latch, journal) = line_set();
        let mut output = BitSerialOutput::new(data, clock, latch).unwrap();
        journal.borrow_mut().clear();

        // CHAR1 pattern in the high byte, DIGIT1 select in the low byte
        output.transmit(0x063F).unwrap();

        let events = journal.borrow().clone();

        // Data level sampled at every clock rising edge
        let mut data = false;
        let mut bits = Vec::new();
        for &(line, level) in &events {
            match line {
                Line::Data => data = level,
                Line::Clock if level => bits.push(if data { '1' } else { '0' }),
                _ => {}
            }
        }
        assert_eq!(bits.into_iter().collect::<String>(), "0000011000111111");

        // Latch only before the first bit and after the last
        let latch: Vec<_> = events
            .iter()
            .enumerate()
            .filter(|(_, (line, _))| *line == Line::Latch)
            .collect();
        assert_eq!(latch.len(), 2);
        assert_eq!(*latch[0].1, (Line::Latch, false));
        assert_eq!(latch[0].0, 0);
        assert_eq!(*latch[1].1, (Line::Latch, true));
        assert_eq!(latch[1].0, events.len() - 1);
    }

    #[test]
    fn toggles_clock_and_latch_thirty_four_times() {
        let (data, clock, latch, journal) = line_set();
        let mut output = BitSerialOutput::new(data, clock, latch).unwrap();
        journal.borrow_mut().clear();

        output.transmit(0xA5A5).unwrap();

        let toggles = journal
            .borrow()
            .iter()
            .filter(|(line, _)| *line != Line::Data)
            .count();
        assert_eq!(toggles, 16 * 2 + 2);
    }

    #[test]
    fn consecutive_words_are_latched_independently() {
        let (data, clock, latch, journal) = line_set();
        let mut output = BitSerialOutput::new(data, clock, latch).unwrap();

        output.transmit(0xFFFF).unwrap();
        output.transmit(0x0000).unwrap();
        output.transmit(0x8001).unwrap();

        assert_eq!(latched_words(&journal), [0xFFFF, 0x0000, 0x8001]);
    }

    #[test]
    fn every_line_change_is_held() {
        let (data, clock, latch, journal) = line_set();
        let settle = JournalSettle(journal.clone());
        let mut output = BitSerialOutput::with_settle(data, clock, latch, settle).unwrap();
        journal.borrow_mut().clear();

        output.transmit(0x063F).unwrap();

        let events = journal.borrow().clone();
        let holds = events.iter().filter(|(line, _)| *line == Line::Hold).count();
        assert_eq!(holds, 1 + 16 * 3 + 1);

        // Lines and holds alternate, ending on a hold after the latch
        for pair in events.chunks(2) {
            assert_ne!(pair[0].0, Line::Hold);
            assert_eq!(pair[1].0, Line::Hold);
        }

        assert_eq!(latched_words(&journal), [0x063F]);
    }
}
