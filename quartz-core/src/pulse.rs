use crate::config::ClockConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BeatPhase {
    #[default]
    WithinBeat,
    AtBeatBoundary,
}

/// Sub-pulse engine driven by the periodic timer interrupt.
///
/// Every [`tick`](Self::tick) is one MIDI clock pulse. The engine counts pulses
/// up to the boundary, flips the beat indicator and opens the gate for exactly
/// the tick that crosses it. Pulses are also accumulated into a pending count
/// the control loop drains to send MIDI clock messages, so the interrupt never
/// touches the UART.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseEngine {
    pulses_per_boundary: u16,
    sub_pulse: u16,
    phase: BeatPhase,
    beat_indicator: bool,
    gate: bool,
    pending: u16,
    saturated: bool,
    boundaries: u32,
}

impl PulseEngine {
    pub const fn new(pulses_per_boundary: u16) -> Self {
        Self {
            pulses_per_boundary: if pulses_per_boundary == 0 {
                1
            } else {
                pulses_per_boundary
            },
            sub_pulse: 0,
            phase: BeatPhase::WithinBeat,
            beat_indicator: false,
            gate: false,
            pending: 0,
            saturated: false,
            boundaries: 0,
        }
    }

    pub fn from_config(config: &ClockConfig) -> Self {
        Self::new(config.pulses_per_boundary())
    }

    /// Advances one sub-pulse. Constant time, no I/O.
    #[inline]
    pub fn tick(&mut self) -> BeatPhase {
        match self.pending.checked_add(1) {
            Some(pending) => self.pending = pending,
            None => self.saturated = true,
        }

        self.sub_pulse += 1;

        if self.sub_pulse >= self.pulses_per_boundary {
            self.sub_pulse = 0;
            self.phase = BeatPhase::AtBeatBoundary;
            self.beat_indicator = !self.beat_indicator;
            self.gate = true;
            self.boundaries = self.boundaries.wrapping_add(1);
        } else {
            self.phase = BeatPhase::WithinBeat;
            self.gate = false;
        }

        self.phase
    }

    /// Re-aligns to the start of a beat without touching pending pulses.
    pub fn reset(&mut self) {
        self.sub_pulse = 0;
        self.phase = BeatPhase::WithinBeat;
        self.gate = false;
    }

    pub fn sub_pulse(&self) -> u16 {
        self.sub_pulse
    }

    pub fn pulses_per_boundary(&self) -> u16 {
        self.pulses_per_boundary
    }

    pub fn phase(&self) -> BeatPhase {
        self.phase
    }

    pub fn gate(&self) -> bool {
        self.gate
    }

    pub fn beat_indicator(&self) -> bool {
        self.beat_indicator
    }

    /// Boundaries crossed since power-on (wrapping).
    pub fn boundaries(&self) -> u32 {
        self.boundaries
    }

    /// Drains the pulses accumulated since the last call.
    pub fn take_pending_pulses(&mut self) -> u16 {
        core::mem::take(&mut self.pending)
    }

    /// Whether pulses were dropped because the control loop fell behind by
    /// more than `u16::MAX` pulses. Clears the flag.
    pub fn take_saturated(&mut self) -> bool {
        core::mem::take(&mut self.saturated)
    }
}

impl Default for PulseEngine {
    fn default() -> Self {
        Self::from_config(&ClockConfig::DEFAULT)
    }
}
