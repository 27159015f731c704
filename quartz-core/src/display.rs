//! Four-digit multiplexed seven-segment display behind two chained shift
//! registers: segment pattern in the high byte, digit select in the low byte.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::hal::{NoSettle, Settle};
use crate::shift_register::BitSerialOutput;

/// Segment patterns for the digits 0 through 9.
pub const CHARS: [u8; 10] = [0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F];
pub const CHAR_DOT: u8 = 0x80;
pub const CHAR_NONE: u8 = 0x00;

pub const DIGIT1: u8 = 0x01;
pub const DIGIT2: u8 = 0x02;
pub const DIGIT3: u8 = 0x04;
pub const DIGIT4: u8 = 0x08;
/// The last bit of the select register drives the beat LED directly.
pub const DIGIT_LED: u8 = 0x80;
pub const DIGIT_NONE: u8 = 0x00;

pub const DIGIT_COUNT: usize = 4;
const DIGIT_SELECT: [u8; DIGIT_COUNT] = [DIGIT1, DIGIT2, DIGIT3, DIGIT4];

/// Position carrying the decimal point (`120.0`)
const DOT_POSITION: usize = 2;
/// Position whose word also carries the beat LED
const INDICATOR_POSITION: usize = 3;

/// Persistence of one digit per refresh pass.
pub const LED_DELAY_MS: u32 = 5;

/// Largest value four digits can show, in tenths.
const MAX_TENTHS: u16 = 9_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayWord(u16);

impl DisplayWord {
    pub const fn new(pattern: u8, select: u8) -> Self {
        Self(((pattern as u16) << 8) | select as u16)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn pattern(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn select(self) -> u8 {
        self.0 as u8
    }
}

/// Segment pattern for a decimal digit, blank for anything else.
pub fn char_pattern(digit: u8) -> u8 {
    CHARS.get(digit as usize).copied().unwrap_or(CHAR_NONE)
}

/// Builds the words of one refresh pass for `bpm` shown with one decimal.
pub fn frame(bpm: f32, beat_indicator: bool) -> [DisplayWord; DIGIT_COUNT] {
    let tenths = if bpm > 0.0 {
        ((bpm * 10.0 + 0.5) as u16).min(MAX_TENTHS)
    } else {
        0
    };

    let digits = [
        (tenths / 1000) as u8,
        (tenths / 100 % 10) as u8,
        (tenths / 10 % 10) as u8,
        (tenths % 10) as u8,
    ];

    let mut words = [DisplayWord::new(CHAR_NONE, DIGIT_NONE); DIGIT_COUNT];

    for (position, (&digit, &select)) in digits.iter().zip(DIGIT_SELECT.iter()).enumerate() {
        let mut pattern = if position == 0 && digit == 0 {
            CHAR_NONE
        } else {
            char_pattern(digit)
        };

        if position == DOT_POSITION {
            pattern |= CHAR_DOT;
        }

        let mut select = select;
        if position == INDICATOR_POSITION && beat_indicator {
            select |= DIGIT_LED;
        }

        words[position] = DisplayWord::new(pattern, select);
    }

    words
}

/// Multiplexes the tempo onto the display, one digit per transmit.
pub struct DisplayRenderer<P, D, S = NoSettle> {
    output: BitSerialOutput<P, S>,
    delay: D,
}

impl<P: OutputPin, D: DelayNs, S: Settle> DisplayRenderer<P, D, S> {
    pub fn new(output: BitSerialOutput<P, S>, delay: D) -> Self {
        Self { output, delay }
    }

    /// One full refresh pass: four transmits, each held for [`LED_DELAY_MS`].
    pub fn render(&mut self, bpm: f32, beat_indicator: bool) -> Result<(), P::Error> {
        for word in frame(bpm, beat_indicator) {
            self.output.transmit(word.bits())?;
            self.delay.delay_ms(LED_DELAY_MS);
        }

        Ok(())
    }

    /// Turns every digit off.
    pub fn blank(&mut self) -> Result<(), P::Error> {
        self.output
            .transmit(DisplayWord::new(CHAR_NONE, DIGIT_NONE).bits())
    }
}
