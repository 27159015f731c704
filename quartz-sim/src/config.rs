use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use quartz_core::{ClockConfig, Direction};

#[derive(Deserialize, Debug)]
pub struct Scenario {
    /// Clock settings, the device defaults when omitted
    #[serde(default)]
    pub clock: ClockConfig,

    /// Number of beats to run
    #[serde(default = "default_beats")]
    pub beats: u32,

    /// Encoder movements, applied at the start of their beat
    #[serde(default)]
    pub turns: Vec<Turn>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Left,
    Right,
}

impl From<TurnDirection> for Direction {
    fn from(direction: TurnDirection) -> Self {
        match direction {
            TurnDirection::Left => Direction::Left,
            TurnDirection::Right => Direction::Right,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct Turn {
    pub at_beat: u32,
    pub direction: TurnDirection,

    /// Detents to move
    #[serde(default = "default_steps")]
    pub steps: u32,

    /// Make the contacts chatter once before every detent
    #[serde(default)]
    pub bounce: bool,
}

fn default_beats() -> u32 {
    8
}

fn default_steps() -> u32 {
    1
}

pub fn parse_scenario(path: &Path) -> Result<Scenario> {
    if !path.exists() {
        return Err(anyhow!("scenario file `{}` does not exist", path.display()));
    }

    let scenario_file = std::fs::read_to_string(path)
        .with_context(|| format!("could not read file `{}`", path.display()))?;

    parse_scenario_str(&scenario_file)
        .with_context(|| format!("could not parse file `{}`", path.display()))
}

pub fn parse_scenario_str(source: &str) -> Result<Scenario> {
    let scenario: Scenario = toml::from_str(source)?;

    scenario
        .clock
        .validate()
        .map_err(|e| anyhow!("invalid [clock] table: {}", e))?;

    if let Some(turn) = scenario.turns.iter().find(|t| t.at_beat >= scenario.beats) {
        return Err(anyhow!(
            "turn at beat {} is past the end of the scenario ({} beats)",
            turn.at_beat,
            scenario.beats
        ));
    }

    Ok(scenario)
}
