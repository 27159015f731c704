use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// MIDI timing clock resolution: clock messages per quarter-note beat.
pub const PULSES_PER_BEAT: u16 = 24;

/// MIDI messages are transmitted serially at 31.25 kbit/s.
pub const MIDI_BAUD_RATE: u32 = 31_250;

pub const MICROS_PER_MINUTE: f32 = 60.0 * 1_000_000.0;

pub const DEFAULT_BPM: f32 = 120.0;
pub const MIN_BPM: f32 = 20.0;
pub const MAX_BPM: f32 = 300.0;
pub const DEFAULT_BEATS_PER_MEASURE: u8 = 4;

/// Tick rate of the 16-bit pulse timer (125 MHz system clock divided by 250).
pub const DEFAULT_TIMER_TICKS_PER_US: f32 = 0.5;

/// Where the pulse engine places its boundary (beat indicator flip and gate pulse).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "lowercase")]
pub enum BeatDivision {
    /// One boundary every beat (24 pulses)
    #[default]
    Beat,

    /// One boundary every measure (24 pulses times `beats_per_measure`)
    Measure,
}

/// Static configuration of the clock. The device compiles in [`ClockConfig::DEFAULT`];
/// host tools load it from a file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct ClockConfig {
    /// Tempo at power-on
    pub default_bpm: f32,

    /// Lowest tempo the encoder can reach, keeps the tick period inside 16 bits
    pub min_bpm: f32,

    /// Highest tempo the encoder can reach
    pub max_bpm: f32,

    /// Boundary policy of the pulse engine
    pub division: BeatDivision,

    /// Only used with [`BeatDivision::Measure`]
    pub beats_per_measure: u8,

    /// Hardware timer counts per microsecond
    pub timer_ticks_per_us: f32,
}

impl ClockConfig {
    pub const DEFAULT: Self = Self {
        default_bpm: DEFAULT_BPM,
        min_bpm: MIN_BPM,
        max_bpm: MAX_BPM,
        division: BeatDivision::Beat,
        beats_per_measure: DEFAULT_BEATS_PER_MEASURE,
        timer_ticks_per_us: DEFAULT_TIMER_TICKS_PER_US,
    };

    /// Number of sub-pulses between two boundaries of the pulse engine.
    pub fn pulses_per_boundary(&self) -> u16 {
        match self.division {
            BeatDivision::Beat => PULSES_PER_BEAT,
            BeatDivision::Measure => PULSES_PER_BEAT * self.beats_per_measure.max(1) as u16,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.timer_ticks_per_us > 0.0) {
            return Err(ConfigError::InvalidTimerRate);
        }

        let finite = [self.default_bpm, self.min_bpm, self.max_bpm]
            .iter()
            .all(|bpm| bpm.is_finite());

        if !finite || !(self.min_bpm > 0.0) || !(self.max_bpm >= self.min_bpm) {
            return Err(ConfigError::InvalidTempoRange);
        }

        if self.default_bpm < self.min_bpm || self.default_bpm > self.max_bpm {
            return Err(ConfigError::DefaultOutOfRange);
        }

        if self.division == BeatDivision::Measure && self.beats_per_measure == 0 {
            return Err(ConfigError::EmptyMeasure);
        }

        // The slowest tempo has the longest period
        let longest = MICROS_PER_MINUTE / (self.min_bpm * PULSES_PER_BEAT as f32)
            * self.timer_ticks_per_us;

        if longest > u16::MAX as f32 {
            return Err(ConfigError::PeriodOverflow);
        }

        Ok(())
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ClockConfig::DEFAULT.validate(), Ok(()));
        assert_eq!(ClockConfig::DEFAULT.pulses_per_boundary(), 24);
    }

    #[test]
    fn measure_division_multiplies_boundary() {
        let config = ClockConfig {
            division: BeatDivision::Measure,
            ..ClockConfig::DEFAULT
        };

        assert_eq!(config.pulses_per_boundary(), 96);
    }

    #[test]
    fn rejects_min_tempo_that_overflows_the_counter() {
        // 10 BPM at 0.5 ticks/us is 125_000 ticks per pulse
        let config = ClockConfig {
            min_bpm: 10.0,
            ..ClockConfig::DEFAULT
        };

        assert_eq!(config.validate(), Err(ConfigError::PeriodOverflow));
    }

    #[test]
    fn rejects_zero_and_inverted_ranges() {
        let zero = ClockConfig {
            min_bpm: 0.0,
            ..ClockConfig::DEFAULT
        };
        assert_eq!(zero.validate(), Err(ConfigError::InvalidTempoRange));

        let inverted = ClockConfig {
            min_bpm: 200.0,
            max_bpm: 100.0,
            ..ClockConfig::DEFAULT
        };
        assert_eq!(inverted.validate(), Err(ConfigError::InvalidTempoRange));

        let nan_default = ClockConfig {
            default_bpm: f32::NAN,
            ..ClockConfig::DEFAULT
        };
        assert_eq!(nan_default.validate(), Err(ConfigError::InvalidTempoRange));

        let infinite_max = ClockConfig {
            max_bpm: f32::INFINITY,
            ..ClockConfig::DEFAULT
        };
        assert_eq!(infinite_max.validate(), Err(ConfigError::InvalidTempoRange));

        let outside = ClockConfig {
            default_bpm: 400.0,
            ..ClockConfig::DEFAULT
        };
        assert_eq!(outside.validate(), Err(ConfigError::DefaultOutOfRange));
    }

    #[test]
    fn tempo_model_recovers_from_a_non_finite_config() {
        use crate::encoder::Direction;
        use crate::tempo::TempoModel;

        let config = ClockConfig {
            default_bpm: f32::NAN,
            max_bpm: f32::INFINITY,
            ..ClockConfig::DEFAULT
        };
        let mut tempo = TempoModel::new(&config);

        assert_eq!(tempo.bpm(), DEFAULT_BPM);
        for _ in 0..5 {
            tempo.apply(Direction::Left);
        }
        assert_eq!(tempo.bpm(), DEFAULT_BPM + 5.0);
        assert!(tempo.current_period().ticks() < u16::MAX);

        let nan_range = ClockConfig {
            min_bpm: f32::NAN,
            max_bpm: f32::NAN,
            ..ClockConfig::DEFAULT
        };
        let tempo = TempoModel::new(&nan_range);
        assert_eq!(tempo.bpm(), DEFAULT_BPM);
    }
}
