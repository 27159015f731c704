use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use quartz_core::{config::MIDI_BAUD_RATE, Direction};

use crate::{clock::Simulator, io::MidiTap};

mod backend;
mod clock;
mod config;
mod io;

/// Runs the Quartz clock core against simulated hardware
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct QuartzArgs {
    /// Path to the scenario file
    #[arg(short, long)]
    pub path: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Serial port to stream the MIDI clock to
    #[arg(short, long)]
    pub serial_port: Option<String>,

    /// Serial port baud rate
    #[arg(short, long, default_value_t = MIDI_BAUD_RATE)]
    pub baud_rate: u32,

    /// Pace the pulses in real time instead of running as fast as possible
    #[arg(short, long)]
    pub realtime: bool,
}

fn main() -> Result<()> {
    /* Parse the CLI arguments and the scenario */

    let args = QuartzArgs::parse();
    let scenario = config::parse_scenario(&args.path)?;

    println!();
    println!("Scenario");
    println!("========");
    println!("Tempo: {:.1} BPM", scenario.clock.default_bpm);
    println!(
        "Range: {:.1} - {:.1} BPM",
        scenario.clock.min_bpm, scenario.clock.max_bpm
    );
    println!("Division: {:?}", scenario.clock.division);
    println!("Beats: {}", scenario.beats);
    println!("Turns: {}", scenario.turns.len());
    println!();

    /* Open the serial port if the clock should leave the machine */

    let port = match &args.serial_port {
        Some(port) => {
            println!();
            for available in serialport::available_ports()? {
                println!("{:?}", available);
            }
            println!();

            println!("Serial Connection");
            println!("=================");
            println!("Port: {}", port);
            println!("Baud Rate: {}", args.baud_rate);
            println!();

            let serial_port = serialport::new(port, args.baud_rate)
                .open()
                .with_context(|| format!("could not open serial port `{}`", port))?;

            pause!("Press any key to start the clock...");

            Some(serial_port)
        }
        None => None,
    };

    /* Run the scenario */

    let midi = MidiTap::new(port, args.verbose);
    let mut sim = Simulator::new(&scenario.clock, midi)?
        .realtime(args.realtime)
        .verbose(args.verbose);

    sim.start()?;

    for beat in 0..scenario.beats {
        for turn in scenario.turns.iter().filter(|t| t.at_beat == beat) {
            for _ in 0..turn.steps {
                sim.turn(Direction::from(turn.direction), turn.bounce)?;
            }
        }

        let report = sim.run_beat()?;

        println!(
            "beat {:>4}  {:>5.1} BPM  {:>5} ticks ({:>8.1} us)  gate {}  led {}  display {:04X?}  clocks {}",
            report.beat,
            report.bpm,
            report.period_ticks,
            report.period_us,
            report.gates,
            if report.beat_led { "on " } else { "off" },
            report.display,
            report.clocks,
        );
    }

    sim.stop()?;

    /* Summary */

    println!();
    println!("Final tempo: {:.1} BPM", sim.bpm());
    println!("Boundaries: {}", sim.boundaries());
    println!("Clock messages: {}", sim.clocks_sent());
    println!("MIDI bytes: {}", sim.midi().bytes().len());
    println!("Timer reprogrammed: {} times", sim.timer().reprogrammed());
    println!("Rejected encoder cycles: {}", sim.rejected());

    Ok(())
}
