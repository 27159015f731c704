use std::{thread, time::Duration};

use anyhow::{anyhow, Result};
use quartz_core::display::DIGIT_COUNT;
use quartz_core::hal::{MidiOut, PulseTimer};
use quartz_core::{
    ClockConfig, CvDriver, Direction, DisplayRenderer, EncoderState, MidiEmitter, PulseEngine,
    QuadratureDecoder, Shared, TempoModel, PULSES_PER_BEAT,
};

use crate::backend::{register, RegisterLine, RegisterProbe, SimDelay, SimEncoder, SimTimer};

/// What one simulated beat looked like from the outside.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatReport {
    pub beat: u32,
    pub bpm: f32,
    pub period_ticks: u16,
    pub period_us: f32,
    pub gates: u32,
    pub beat_led: bool,
    pub display: [u16; DIGIT_COUNT],
    pub clocks: u16,
}

/// Runs the clock core the way the board does, with the interrupt handlers
/// turned into direct calls.
pub struct Simulator<M> {
    engine: Shared<PulseEngine>,
    decoder: Shared<QuadratureDecoder>,
    encoder: SimEncoder,
    timer: SimTimer,
    tempo: TempoModel,
    emitter: MidiEmitter,
    cv: CvDriver<RegisterLine>,
    cv_words: RegisterProbe,
    display: DisplayRenderer<RegisterLine, SimDelay>,
    display_words: RegisterProbe,
    midi: M,
    beat: u32,
    realtime: bool,
    verbose: bool,
}

impl<M: MidiOut> Simulator<M>
where
    M::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn new(config: &ClockConfig, midi: M) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow!("clock configuration rejected: {}", e))?;

        let engine = Shared::new();
        engine.init(PulseEngine::from_config(config));

        let decoder = Shared::new();
        decoder.init(QuadratureDecoder::new());

        let tempo = TempoModel::new(config);
        let mut timer = SimTimer::new(tempo.current_period());
        timer.configure(tempo.current_period());

        let (cv_output, cv_words) = register();
        let (display_output, display_words) = register();

        Ok(Self {
            engine,
            decoder,
            encoder: SimEncoder::default(),
            timer,
            tempo,
            emitter: MidiEmitter::new(),
            cv: CvDriver::new(cv_output),
            cv_words,
            display: DisplayRenderer::new(display_output, SimDelay),
            display_words,
            midi,
            beat: 0,
            realtime: false,
            verbose: false,
        })
    }

    /// Sleeps one pulse period after every pulse.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Prints every gate change.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sends START and re-aligns the pulse engine so the next pulse opens a beat.
    pub fn start(&mut self) -> Result<()> {
        self.engine.with(|engine| engine.reset());
        self.emitter.start(&mut self.midi)?;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.emitter.stop(&mut self.midi)?;
        Ok(())
    }

    pub fn bpm(&self) -> f32 {
        self.tempo.bpm()
    }

    pub fn rejected(&self) -> u32 {
        self.decoder.with(|d| d.rejected()).unwrap_or_default()
    }

    pub fn clocks_sent(&self) -> u32 {
        self.emitter.clocks_sent()
    }

    pub fn boundaries(&self) -> u32 {
        self.engine.with(|e| e.boundaries()).unwrap_or_default()
    }

    pub fn timer(&self) -> &SimTimer {
        &self.timer
    }

    pub fn midi(&self) -> &M {
        &self.midi
    }

    /// Turns the encoder by one detent, optionally with a contact chatter
    /// before it, and lets the control loop pick it up.
    pub fn turn(&mut self, direction: Direction, bounce: bool) -> Result<()> {
        let sequence = direction.gray_sequence();

        if bounce {
            if let Some(&first) = sequence.first() {
                self.pin_change(first);
                self.pin_change(EncoderState::REST);
            }
        }

        for &state in sequence {
            self.pin_change(state);
        }

        self.control_pass()
    }

    fn pin_change(&mut self, state: EncoderState) {
        self.encoder.set(state);

        let encoder = &mut self.encoder;
        self.decoder.with(|decoder| {
            decoder
                .poll(encoder)
                .unwrap_or_else(|never| match never {})
        });
    }

    /// Timer interrupt: one sub-pulse and the matching CV word.
    fn timer_interrupt(&mut self) -> bool {
        let gate = self
            .engine
            .with(|engine| {
                engine.tick();
                engine.gate()
            })
            .unwrap_or_default();

        self.cv
            .write(gate)
            .unwrap_or_else(|never| match never {});

        gate
    }

    /// One pass of the control loop, without the display refresh.
    fn control_pass(&mut self) -> Result<()> {
        let direction = self
            .decoder
            .with(|decoder| decoder.take_direction())
            .unwrap_or_default();

        if self.tempo.apply(direction) {
            let period = self.tempo.current_period();
            self.timer.configure(period);

            if self.verbose {
                println!(
                    "  tempo {:.1} BPM, period {} ticks",
                    self.tempo.bpm(),
                    period.ticks()
                );
            }
        }

        let (pulses, saturated) = self
            .engine
            .with(|engine| (engine.take_pending_pulses(), engine.take_saturated()))
            .unwrap_or_default();

        if saturated {
            println!("warning: pending pulses saturated, clocks were dropped");
        }

        self.emitter.emit_clocks(pulses, &mut self.midi)?;

        Ok(())
    }

    /// Runs one beat's worth of pulses at the current tempo.
    pub fn run_beat(&mut self) -> Result<BeatReport> {
        let period = self.timer.period();
        let period_us = period.as_micros(self.tempo.ticks_per_us());
        let clocks_before = self.emitter.clocks_sent();
        let mut gates = 0;

        for _ in 0..PULSES_PER_BEAT {
            if self.realtime {
                thread::sleep(Duration::from_secs_f32(period_us / 1_000_000.0));
            }

            if self.timer_interrupt() {
                gates += 1;
            }

            if self.verbose {
                for word in self.cv_words.take_words() {
                    if word != 0 {
                        println!("  cv   {:04X}", word);
                    }
                }
            }

            self.control_pass()?;
        }

        // The board refreshes continuously, one pass per beat is enough here
        let beat_led = self.engine.with(|e| e.beat_indicator()).unwrap_or_default();
        self.display
            .render(self.tempo.bpm(), beat_led)
            .unwrap_or_else(|never| match never {});

        let mut display = [0; DIGIT_COUNT];
        let words = self.display_words.take_words();
        display.copy_from_slice(&words[words.len() - DIGIT_COUNT..]);
        self.cv_words.take_words();

        let report = BeatReport {
            beat: self.beat,
            bpm: self.tempo.bpm(),
            period_ticks: period.ticks(),
            period_us,
            gates,
            beat_led,
            display,
            clocks: self.emitter.clocks_sent().wrapping_sub(clocks_before) as u16,
        };

        self.beat += 1;

        Ok(report)
    }
}
