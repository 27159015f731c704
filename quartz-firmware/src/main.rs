#![no_std]
#![no_main]

use cortex_m::peripheral::NVIC;
use defmt_rtt as _;
use panic_probe as _;
use rp_pico::{
    entry,
    hal::{
        self,
        fugit::RateExtU32,
        uart::{DataBits, StopBits, UartConfig, UartPeripheral},
    },
};

use hal::{
    clocks::{init_clocks_and_plls, Clock},
    gpio::FunctionUart,
    pac::{self, interrupt},
    watchdog::Watchdog,
    Sio,
};

use quartz_core::{
    config::MIDI_BAUD_RATE,
    hal::{EncoderPins, PulseTimer},
    ClockConfig, CvDriver, Direction, DisplayRenderer, MidiEmitter, PulseEngine,
    QuadratureDecoder, Shared, TempoModel,
};
use quartz_firmware::board::{
    clear_encoder_interrupts, encoder_levels, listen_encoder, shift_register, EncoderInputs,
    HoldCycles, MidiUart, OutputLine, PwmTimer,
};

/* State shared with the interrupt handlers */

// Written by PWM_IRQ_WRAP, drained by the main loop
static ENGINE: Shared<PulseEngine> = Shared::new();

// Written by IO_IRQ_BANK0, drained by the main loop
static DECODER: Shared<QuadratureDecoder> = Shared::new();

// Only touched by the handlers after init
static ENCODER_PINS: Shared<EncoderInputs> = Shared::new();
static CV: Shared<CvDriver<OutputLine, HoldCycles>> = Shared::new();

// Reprogrammed by the main loop, acknowledged by PWM_IRQ_WRAP
static PULSE_TIMER: Shared<PwmTimer> = Shared::new();

const CONFIG: ClockConfig = ClockConfig::DEFAULT;

#[entry]
fn main() -> ! {
    defmt::info!("Quartz MIDI Clock v{}", env!("CARGO_PKG_VERSION"));

    CONFIG.validate().unwrap();

    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let sio = Sio::new(pac.SIO);

    let clocks = init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let delay = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    /* Set up the shift registers */

    let display_register = shift_register(
        pins.gpio2.into_push_pull_output().into_dyn_pin(),
        pins.gpio3.into_push_pull_output().into_dyn_pin(),
        pins.gpio4.into_push_pull_output().into_dyn_pin(),
    );
    let mut display = DisplayRenderer::new(display_register, delay);
    display.blank().unwrap();

    let cv_register = shift_register(
        pins.gpio6.into_push_pull_output().into_dyn_pin(),
        pins.gpio7.into_push_pull_output().into_dyn_pin(),
        pins.gpio8.into_push_pull_output().into_dyn_pin(),
    );
    let mut cv = CvDriver::new(cv_register);
    cv.write(false).unwrap();

    /* Set up the MIDI UART */

    let uart_pins = (
        pins.gpio0.into_function::<FunctionUart>(),
        pins.gpio1.into_function::<FunctionUart>(),
    );
    let uart = UartPeripheral::new(pac.UART0, uart_pins, &mut pac.RESETS)
        .enable(
            UartConfig::new(MIDI_BAUD_RATE.Hz(), DataBits::Eight, None, StopBits::One),
            clocks.peripheral_clock.freq(),
        )
        .unwrap();
    let mut midi = MidiUart::new(uart);

    /* Set up the encoder */

    let mut encoder = EncoderInputs::new(pins.gpio10.reconfigure(), pins.gpio11.reconfigure());
    let (a, b) = encoder_levels(&mut encoder);
    defmt::debug!("encoder at rest: a={} b={}", a, b);
    listen_encoder(&mut encoder);

    /* Set up the pulse timer */

    let mut tempo = TempoModel::new(&CONFIG);
    let period = tempo.current_period();

    let pwm_slices = hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
    let pulse_timer = PwmTimer::new(pwm_slices.pwm0, period);

    defmt::info!(
        "Starting at {} BPM ({} ticks per pulse, {})",
        tempo.bpm(),
        period.ticks(),
        CONFIG.division
    );

    /* Hand the interrupt-owned state over and start */

    ENGINE.init(PulseEngine::from_config(&CONFIG));
    DECODER.init(QuadratureDecoder::new());
    ENCODER_PINS.init(encoder);
    CV.init(cv);
    PULSE_TIMER.init(pulse_timer);

    // START marks the first pulse of a beat
    let mut emitter = MidiEmitter::new();
    ENGINE.with(|engine| engine.reset());
    emitter.start(&mut midi).unwrap();

    unsafe {
        NVIC::unmask(pac::Interrupt::IO_IRQ_BANK0);
        NVIC::unmask(pac::Interrupt::PWM_IRQ_WRAP);
    }

    PULSE_TIMER.with(|timer| timer.start());

    defmt::info!("Started pulse timer!");

    /* Control loop */

    let mut rejected = 0;

    loop {
        let (direction, rejected_now) = DECODER
            .with(|decoder| (decoder.take_direction(), decoder.rejected()))
            .unwrap_or_default();

        if direction != Direction::None && tempo.apply(direction) {
            let period = tempo.current_period();
            PULSE_TIMER.with(|timer| timer.configure(period));

            defmt::info!("{} BPM ({} ticks per pulse)", tempo.bpm(), period.ticks());
        }

        if rejected_now != rejected {
            defmt::warn!(
                "Ignored {} incomplete encoder cycle(s)",
                rejected_now.wrapping_sub(rejected)
            );
            rejected = rejected_now;
        }

        let (pulses, saturated, indicator) = ENGINE
            .with(|engine| {
                (
                    engine.take_pending_pulses(),
                    engine.take_saturated(),
                    engine.beat_indicator(),
                )
            })
            .unwrap_or_default();

        if saturated {
            defmt::warn!("Control loop fell behind, MIDI clock pulses were dropped!");
        }

        emitter.emit_clocks(pulses, &mut midi).unwrap();

        // Blocks for one multiplex pass, pulses keep accumulating meanwhile
        display.render(tempo.bpm(), indicator).unwrap();
    }
}

/// Fires once per MIDI sub-pulse.
#[interrupt]
fn PWM_IRQ_WRAP() {
    critical_section::with(|cs| {
        PULSE_TIMER.with_cs(cs, |timer| timer.acknowledge());

        let Some(gate) = ENGINE.with_cs(cs, |engine| {
            engine.tick();
            engine.gate()
        }) else {
            return;
        };

        CV.with_cs(cs, |cv| cv.write(gate).unwrap());
    });
}

/// Fires on every edge of either encoder phase.
#[interrupt]
fn IO_IRQ_BANK0() {
    critical_section::with(|cs| {
        let Some(state) = ENCODER_PINS.with_cs(cs, |pins| {
            clear_encoder_interrupts(pins);
            pins.read_pins().unwrap()
        }) else {
            return;
        };

        DECODER.with_cs(cs, |decoder| decoder.on_pin_change(state));
    });
}
