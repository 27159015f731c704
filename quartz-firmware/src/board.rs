//! Pin map and peripheral adapters for the Raspberry Pi Pico.
//!
//! | GPIO | Use |
//! |------|-----|
//! | 0    | UART0 TX, MIDI out |
//! | 1    | UART0 RX (unused) |
//! | 2-4  | display register data, clock, latch |
//! | 6-8  | CV register data, clock, latch |
//! | 10   | encoder phase A |
//! | 11   | encoder phase B |

use embedded_hal::digital::InputPin;
use quartz_core::hal::{ActiveLowPins, MidiOut, PulseTimer, Settle};
use quartz_core::shift_register::BitSerialOutput;
use quartz_core::TickPeriod;
use rp_pico::hal::{
    gpio::{
        bank0::{Gpio0, Gpio1, Gpio10, Gpio11},
        DynPinId, FunctionSio, FunctionUart, Interrupt, Pin, PullDown, PullUp, SioInput,
        SioOutput,
    },
    pac::UART0,
    pwm::{FreeRunning, Pwm0, Slice},
    uart::{Enabled, UartPeripheral},
};

use crate::TIMER_CLOCK_DIVIDER;

pub type OutputLine = Pin<DynPinId, FunctionSio<SioOutput>, PullDown>;
pub type ShiftRegister = BitSerialOutput<OutputLine, HoldCycles>;

/// 74HC595 setup time and clock/latch pulse width at 3.3 V are ~25 ns, four
/// cycles at 125 MHz plus the SIO write itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldCycles;

impl Settle for HoldCycles {
    #[inline(always)]
    fn settle(&mut self) {
        crate::delay_cycles!(4);
    }
}

/// Parks three pins as a shift register line set with the board's margins.
pub fn shift_register(data: OutputLine, clock: OutputLine, latch: OutputLine) -> ShiftRegister {
    BitSerialOutput::with_settle(data, clock, latch, HoldCycles).unwrap()
}

pub type EncoderPinA = Pin<Gpio10, FunctionSio<SioInput>, PullUp>;
pub type EncoderPinB = Pin<Gpio11, FunctionSio<SioInput>, PullUp>;
pub type EncoderInputs = ActiveLowPins<EncoderPinA, EncoderPinB>;

pub type UartPins = (
    Pin<Gpio0, FunctionUart, PullDown>,
    Pin<Gpio1, FunctionUart, PullDown>,
);
pub type MidiUartPeripheral = UartPeripheral<Enabled, UART0, UartPins>;

const ENCODER_EDGES: [Interrupt; 2] = [Interrupt::EdgeLow, Interrupt::EdgeHigh];

/// Enables both edge interrupts on both encoder phases.
pub fn listen_encoder(inputs: &mut EncoderInputs) {
    let (a, b) = inputs.pins_mut();

    for edge in ENCODER_EDGES {
        a.set_interrupt_enabled(edge, true);
        b.set_interrupt_enabled(edge, true);
    }
}

/// Acknowledges every pending edge on the encoder pins.
pub fn clear_encoder_interrupts(inputs: &mut EncoderInputs) {
    let (a, b) = inputs.pins_mut();

    for edge in ENCODER_EDGES {
        a.clear_interrupt(edge);
        b.clear_interrupt(edge);
    }
}

/// Raw pin levels, for the boot log.
pub fn encoder_levels(inputs: &mut EncoderInputs) -> (bool, bool) {
    let (a, b) = inputs.pins_mut();
    (a.is_high().unwrap(), b.is_high().unwrap())
}

/// PWM slice 0 in free-running mode, used only for its wrap interrupt.
pub struct PwmTimer {
    slice: Slice<Pwm0, FreeRunning>,
}

impl PwmTimer {
    pub fn new(mut slice: Slice<Pwm0, FreeRunning>, period: TickPeriod) -> Self {
        slice.set_div_int(TIMER_CLOCK_DIVIDER);
        slice.set_div_frac(0);

        let mut timer = Self { slice };
        timer.configure(period);
        timer
    }

    pub fn start(&mut self) {
        self.slice.clear_interrupt();
        self.slice.enable_interrupt();
        self.slice.enable();
    }

    pub fn acknowledge(&mut self) {
        self.slice.clear_interrupt();
    }
}

impl PulseTimer for PwmTimer {
    /// The counter runs 0..=top, so one period is `top + 1` ticks. The new
    /// top is double buffered and takes effect at the next wrap.
    fn configure(&mut self, period: TickPeriod) {
        self.slice.set_top(period.ticks().saturating_sub(1));
    }
}

pub struct MidiUart {
    uart: MidiUartPeripheral,
}

impl MidiUart {
    pub fn new(uart: MidiUartPeripheral) -> Self {
        Self { uart }
    }
}

impl MidiOut for MidiUart {
    type Error = core::convert::Infallible;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.uart.write_full_blocking(bytes);
        Ok(())
    }
}
