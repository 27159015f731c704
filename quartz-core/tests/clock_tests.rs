//! End-to-end behaviour of the clock core: encoder through tempo, pulse
//! engine, CV, display and MIDI, driven the way the board drives it.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use quartz_core::display::{frame, DIGIT4, DIGIT_LED};
use quartz_core::hal::{MidiOut, PulseTimer};
use quartz_core::{
    BitSerialOutput, ClockConfig, CvDriver, Direction, DisplayRenderer, MidiEmitter,
    PulseEngine, QuadratureDecoder, Shared, TempoModel, TickPeriod, PULSES_PER_BEAT,
};

/// Output line that shifts into a software register and records latched words.
#[derive(Clone)]
struct Lines(Rc<RefCell<Register>>);

#[derive(Default)]
struct Register {
    data: bool,
    shift: u16,
    latched: Vec<u16>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Data,
    Clock,
    Latch,
}

struct Line {
    role: Role,
    register: Lines,
}

impl ErrorType for Line {
    type Error = Infallible;
}

impl OutputPin for Line {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.role == Role::Data {
            self.register.0.borrow_mut().data = false;
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut register = self.register.0.borrow_mut();
        match self.role {
            Role::Data => register.data = true,
            Role::Clock => register.shift = (register.shift << 1) | register.data as u16,
            Role::Latch => {
                let word = register.shift;
                register.latched.push(word);
            }
        }
        Ok(())
    }
}

fn register() -> (BitSerialOutput<Line>, Lines) {
    let lines = Lines(Rc::default());
    let line = |role| Line {
        role,
        register: lines.clone(),
    };
    let output = BitSerialOutput::new(line(Role::Data), line(Role::Clock), line(Role::Latch)).unwrap();
    lines.0.borrow_mut().latched.clear();

    (output, lines)
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Default)]
struct Uart(Vec<u8>);

impl MidiOut for Uart {
    type Error = Infallible;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.0.extend_from_slice(bytes);
        Ok(())
    }
}

#[derive(Default)]
struct Timer(Vec<TickPeriod>);

impl PulseTimer for Timer {
    fn configure(&mut self, period: TickPeriod) {
        self.0.push(period);
    }
}

fn turn(decoder: &Shared<QuadratureDecoder>, direction: Direction) {
    for &state in direction.gray_sequence() {
        decoder.with(|decoder| decoder.on_pin_change(state));
    }
}

#[test]
fn six_left_steps_raise_the_tempo_to_126() {
    let config = ClockConfig::DEFAULT;
    let decoder = Shared::new();
    decoder.init(QuadratureDecoder::new());
    let mut tempo = TempoModel::new(&config);
    let mut timer = Timer::default();

    let before = tempo.current_period();
    timer.configure(before);

    for _ in 0..6 {
        turn(&decoder, Direction::Left);

        // One control-loop pass per step
        let direction = decoder.with(|d| d.take_direction()).unwrap_or_default();
        if tempo.apply(direction) {
            timer.configure(tempo.current_period());
        }
    }

    assert_eq!(tempo.bpm(), 126.0);

    // The period only changes when recomputed, the old value stays as it was
    let after = tempo.current_period();
    assert_eq!(before, TickPeriod::from_bpm(120.0, config.timer_ticks_per_us));
    assert_eq!(after, TickPeriod::from_bpm(126.0, config.timer_ticks_per_us));
    assert!(after < before);
    assert_eq!(timer.0.len(), 7);
    assert_eq!(timer.0.last(), Some(&after));
}

#[test]
fn steps_faster_than_the_loop_collapse_into_one() {
    let decoder = Shared::new();
    decoder.init(QuadratureDecoder::new());

    turn(&decoder, Direction::Right);
    turn(&decoder, Direction::Right);

    assert_eq!(decoder.with(|d| d.take_direction()), Some(Direction::Right));
    assert_eq!(decoder.with(|d| d.take_direction()), Some(Direction::None));
}

#[test]
fn one_beat_of_interrupts_drives_cv_display_and_midi() {
    let config = ClockConfig::DEFAULT;
    let engine = Shared::new();
    engine.init(PulseEngine::from_config(&config));
    let (cv_output, cv_lines) = register();
    let mut cv = CvDriver::new(cv_output);
    let (display_output, display_lines) = register();
    let mut display = DisplayRenderer::new(display_output, NoDelay);
    let tempo = TempoModel::new(&config);
    let mut emitter = MidiEmitter::new();
    let mut uart = Uart::default();

    emitter.start(&mut uart).unwrap();

    for pulse in 1..=PULSES_PER_BEAT {
        // Timer interrupt
        let gate = engine.with(|e| {
            e.tick();
            e.gate()
        });
        cv.write(gate.unwrap()).unwrap();

        // Control loop pass every third pulse
        if pulse % 3 == 0 {
            let (pulses, indicator) = engine
                .with(|e| (e.take_pending_pulses(), e.beat_indicator()))
                .unwrap();
            emitter.emit_clocks(pulses, &mut uart).unwrap();
            display.render(tempo.bpm(), indicator).unwrap();
        }
    }

    assert_eq!(engine.with(|e| (e.sub_pulse(), e.boundaries())), Some((0, 1)));

    let cv_register = cv_lines.0.borrow();
    let gates = &cv_register.latched;
    assert_eq!(gates.len(), PULSES_PER_BEAT as usize);
    assert_eq!(gates.iter().filter(|&&w| w != 0).count(), 1);

    // START then one CLOCK per pulse
    assert_eq!(uart.0.len(), 2 + 2 * PULSES_PER_BEAT as usize);
    assert_eq!(&uart.0[..2], &[0xFA, 0x00]);
    assert!(uart.0[2..].chunks(2).all(|m| m == [0xF8, 0x00]));
    assert_eq!(emitter.clocks_sent(), PULSES_PER_BEAT as u32);

    // Last pass saw the flipped indicator on the fourth digit
    let display_register = display_lines.0.borrow();
    let words = &display_register.latched;
    let last_pass = &words[words.len() - 4..];
    let expected: Vec<u16> = frame(120.0, true).iter().map(|w| w.bits()).collect();
    assert_eq!(last_pass, expected.as_slice());
    assert_eq!(last_pass[3] & 0xFF, (DIGIT4 | DIGIT_LED) as u16);
}
