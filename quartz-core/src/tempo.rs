use crate::config::{
    ClockConfig, DEFAULT_BPM, MAX_BPM, MICROS_PER_MINUTE, MIN_BPM, PULSES_PER_BEAT,
};
use crate::encoder::Direction;
use crate::log::log_debug;

/// Hardware timer counts between two MIDI sub-pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickPeriod(u16);

impl TickPeriod {
    pub const MAX: Self = Self(u16::MAX);

    /// Sub-pulse period for `bpm` on a timer counting `ticks_per_us` per
    /// microsecond. Rounds to the nearest count and saturates to `1..=u16::MAX`.
    pub fn from_bpm(bpm: f32, ticks_per_us: f32) -> Self {
        if !(bpm > 0.0) {
            return Self::MAX;
        }

        let micros = MICROS_PER_MINUTE / (bpm * PULSES_PER_BEAT as f32);
        let ticks = micros * ticks_per_us + 0.5;

        if ticks >= u16::MAX as f32 {
            Self::MAX
        } else if ticks < 1.0 {
            Self(1)
        } else {
            Self(ticks as u16)
        }
    }

    pub const fn ticks(self) -> u16 {
        self.0
    }

    pub fn as_micros(self, ticks_per_us: f32) -> f32 {
        self.0 as f32 / ticks_per_us
    }
}

/// Owns the current tempo. Only the control loop writes it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TempoModel {
    bpm: f32,
    min_bpm: f32,
    max_bpm: f32,
    ticks_per_us: f32,
}

impl TempoModel {
    pub fn new(config: &ClockConfig) -> Self {
        // A zero, negative or NaN floor would let the period divide by zero
        let min_bpm = if config.min_bpm > 0.0 && config.min_bpm.is_finite() {
            config.min_bpm
        } else {
            MIN_BPM
        };
        let max_bpm = if config.max_bpm.is_finite() {
            config.max_bpm.max(min_bpm)
        } else {
            MAX_BPM.max(min_bpm)
        };
        let default_bpm = if config.default_bpm.is_finite() {
            config.default_bpm
        } else {
            DEFAULT_BPM
        };

        Self {
            bpm: default_bpm.clamp(min_bpm, max_bpm),
            min_bpm,
            max_bpm,
            ticks_per_us: config.timer_ticks_per_us,
        }
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Left speeds up by one BPM, right slows down by one. Returns whether the
    /// tempo changed (it doesn't at the ends of the range).
    pub fn apply(&mut self, direction: Direction) -> bool {
        let step = match direction {
            Direction::Left => 1.0,
            Direction::Right => -1.0,
            Direction::None => return false,
        };

        let bpm = (self.bpm + step).clamp(self.min_bpm, self.max_bpm);
        if bpm == self.bpm {
            log_debug!("tempo held at limit {}", bpm);
            return false;
        }

        self.bpm = bpm;
        true
    }

    /// Recomputes the sub-pulse period from the current tempo.
    pub fn current_period(&self) -> TickPeriod {
        TickPeriod::from_bpm(self.bpm, self.ticks_per_us)
    }

    pub fn ticks_per_us(&self) -> f32 {
        self.ticks_per_us
    }
}
