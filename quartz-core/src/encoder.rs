//! Quadrature decoding for the tempo encoder.
//!
//! Rest is both phases inactive (`00`). A detent-to-detent step walks the Gray
//! sequence and comes back to rest:
//!
//! ```text
//! left  (A leads): 00 -> 10 -> 11 -> 01 -> 00
//! right (B leads): 00 -> 01 -> 11 -> 10 -> 00
//! ```
//!
//! A direction is only committed when the pair returns to rest after the full
//! sequence. Anything else (bounce back to rest, reversal, a skipped state) ends
//! the cycle without a tick.

use crate::hal::EncoderPins;

pub const PHASE_A: u8 = 0b10;
pub const PHASE_B: u8 = 0b01;

/// Raw snapshot of both encoder phases (logical levels, 1 = active).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderState(u8);

impl EncoderState {
    pub const REST: Self = Self(0);

    pub const fn new(a: bool, b: bool) -> Self {
        Self(((a as u8) << 1) | b as u8)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & (PHASE_A | PHASE_B))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn a(self) -> bool {
        self.0 & PHASE_A != 0
    }

    pub const fn b(self) -> bool {
        self.0 & PHASE_B != 0
    }

    pub const fn is_rest(self) -> bool {
        self.0 == 0
    }

    /// Which phases differ between `previous` and `self`.
    pub const fn transitions_from(self, previous: Self) -> TransitionMask {
        TransitionMask(self.0 ^ previous.0)
    }
}

/// XOR of two consecutive [`EncoderState`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransitionMask(u8);

impl TransitionMask {
    pub const fn phase_a(self) -> bool {
        self.0 & PHASE_A != 0
    }

    pub const fn phase_b(self) -> bool {
        self.0 & PHASE_B != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    /// The pin states one clean detent step in this direction walks through.
    pub const fn gray_sequence(self) -> &'static [EncoderState] {
        const LEFT: [EncoderState; 4] = [
            EncoderState::from_bits(0b10),
            EncoderState::from_bits(0b11),
            EncoderState::from_bits(0b01),
            EncoderState::REST,
        ];
        const RIGHT: [EncoderState; 4] = [
            EncoderState::from_bits(0b01),
            EncoderState::from_bits(0b11),
            EncoderState::from_bits(0b10),
            EncoderState::REST,
        ];

        match self {
            Direction::Left => &LEFT,
            Direction::Right => &RIGHT,
            Direction::None => &[],
        }
    }
}

/// Position inside the Gray sequence of a tracked step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Only the origin phase is active
    Leading,
    /// Both phases are active
    Both,
    /// Only the following phase is still active
    Trailing,
    /// The sequence was broken, wait for rest and drop the step
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderState {
    Idle,
    TrackingLeft(Stage),
    TrackingRight(Stage),
}

/// Debounced quadrature state machine.
///
/// [`on_pin_change`](Self::on_pin_change) belongs to the pin-change interrupt,
/// [`take_direction`](Self::take_direction) to the control loop.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuadratureDecoder {
    previous: EncoderState,
    state: DecoderState,
    latched: Direction,
    rejected: u32,
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self {
            previous: EncoderState::REST,
            state: DecoderState::Idle,
            latched: Direction::None,
            rejected: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Number of started steps that ended without a tick.
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Reads the pins and feeds the snapshot to the state machine.
    pub fn poll<E: EncoderPins>(&mut self, pins: &mut E) -> Result<(), E::Error> {
        let current = pins.read_pins()?;
        self.on_pin_change(current);

        Ok(())
    }

    pub fn on_pin_change(&mut self, current: EncoderState) {
        let mask = current.transitions_from(self.previous);
        self.previous = current;

        if mask.is_empty() {
            return;
        }

        self.state = match self.state {
            DecoderState::Idle => {
                if !current.is_rest() && mask.phase_a() && mask.phase_b() {
                    // Both phases jumped at once, the order is unknown
                    DecoderState::TrackingLeft(Stage::Aborted)
                } else if mask.phase_a() && current.a() {
                    DecoderState::TrackingLeft(Stage::Leading)
                } else if mask.phase_b() && current.b() {
                    DecoderState::TrackingRight(Stage::Leading)
                } else {
                    DecoderState::Idle
                }
            }
            DecoderState::TrackingLeft(stage) => {
                self.track(stage, current, current.a(), current.b(), Direction::Left)
            }
            DecoderState::TrackingRight(stage) => {
                self.track(stage, current, current.b(), current.a(), Direction::Right)
            }
        };
    }

    /// Advances a tracked step, `origin` being the phase that led it.
    fn track(
        &mut self,
        stage: Stage,
        current: EncoderState,
        origin: bool,
        follower: bool,
        direction: Direction,
    ) -> DecoderState {
        if current.is_rest() {
            if stage == Stage::Trailing {
                self.latched = direction;
            } else {
                self.rejected = self.rejected.wrapping_add(1);
            }

            return DecoderState::Idle;
        }

        let next = match (stage, origin, follower) {
            (Stage::Aborted, _, _) => Stage::Aborted,
            (_, true, true) => Stage::Both,
            // Origin back on its own: the follower bounced, allowed until it lets go
            (Stage::Leading | Stage::Both, true, false) => Stage::Leading,
            (Stage::Both | Stage::Trailing, false, true) => Stage::Trailing,
            // Skipped a Gray state
            _ => Stage::Aborted,
        };

        match direction {
            Direction::Left => DecoderState::TrackingLeft(next),
            _ => DecoderState::TrackingRight(next),
        }
    }

    /// Returns the latched direction and clears it. A second call without a
    /// completed step in between returns [`Direction::None`].
    pub fn take_direction(&mut self) -> Direction {
        core::mem::take(&mut self.latched)
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}
