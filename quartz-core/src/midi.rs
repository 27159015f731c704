use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::hal::MidiOut;
use crate::log::log_debug;

/// Padding byte following every real-time status byte on the wire.
pub const DATA_BYTE: u8 = 0x00;

/// MIDI system real-time messages the clock emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RealTimeMessage {
    Clock = 0xF8,
    Start = 0xFA,
    Continue = 0xFB,
    Stop = 0xFC,
}

impl RealTimeMessage {
    pub fn to_bytes(self) -> [u8; 2] {
        [self.into(), DATA_BYTE]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transport {
    #[default]
    Stopped,
    Running,
}

/// Turns pulse counts drained from the pulse engine into clock messages.
/// Clocks are only sent while the transport is running.
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MidiEmitter {
    transport: Transport,
    clocks_sent: u32,
}

impl MidiEmitter {
    pub const fn new() -> Self {
        Self {
            transport: Transport::Stopped,
            clocks_sent: 0,
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Clock messages sent since the last start (wrapping).
    pub fn clocks_sent(&self) -> u32 {
        self.clocks_sent
    }

    fn send<O: MidiOut>(&mut self, message: RealTimeMessage, out: &mut O) -> Result<(), O::Error> {
        out.write(&message.to_bytes())
    }

    /// Sends START and begins a new song position.
    pub fn start<O: MidiOut>(&mut self, out: &mut O) -> Result<(), O::Error> {
        self.send(RealTimeMessage::Start, out)?;
        self.transport = Transport::Running;
        self.clocks_sent = 0;

        Ok(())
    }

    /// Sends CONTINUE, resuming from the current song position.
    pub fn resume<O: MidiOut>(&mut self, out: &mut O) -> Result<(), O::Error> {
        if self.transport == Transport::Running {
            return Ok(());
        }

        self.send(RealTimeMessage::Continue, out)?;
        self.transport = Transport::Running;

        Ok(())
    }

    pub fn stop<O: MidiOut>(&mut self, out: &mut O) -> Result<(), O::Error> {
        if self.transport == Transport::Stopped {
            return Ok(());
        }

        self.send(RealTimeMessage::Stop, out)?;
        self.transport = Transport::Stopped;

        Ok(())
    }

    /// Sends one CLOCK per pending pulse. Returns how many were sent.
    pub fn emit_clocks<O: MidiOut>(&mut self, pulses: u16, out: &mut O) -> Result<u16, O::Error> {
        if self.transport == Transport::Stopped {
            if pulses > 0 {
                log_debug!("dropping {} pulses while stopped", pulses);
            }
            return Ok(0);
        }

        for _ in 0..pulses {
            self.send(RealTimeMessage::Clock, out)?;
            self.clocks_sent = self.clocks_sent.wrapping_add(1);
        }

        Ok(pulses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ByteSink;

    #[test]
    fn status_bytes_round_trip_through_u8() {
        assert_eq!(u8::from(RealTimeMessage::Clock), 0xF8);
        assert_eq!(RealTimeMessage::try_from(0xFC).ok(), Some(RealTimeMessage::Stop));
        assert!(RealTimeMessage::try_from(0x90).is_err());
    }

    #[test]
    fn start_clocks_stop_framing() {
        let mut sink = ByteSink::default();
        let mut emitter = MidiEmitter::new();

        emitter.start(&mut sink).unwrap();
        assert_eq!(emitter.emit_clocks(2, &mut sink), Ok(2));
        emitter.stop(&mut sink).unwrap();

        assert_eq!(
            sink.bytes,
            [0xFA, 0x00, 0xF8, 0x00, 0xF8, 0x00, 0xFC, 0x00]
        );
        assert_eq!(emitter.clocks_sent(), 2);
    }

    #[test]
    fn no_clocks_while_stopped() {
        let mut sink = ByteSink::default();
        let mut emitter = MidiEmitter::new();

        assert_eq!(emitter.emit_clocks(3, &mut sink), Ok(0));
        emitter.stop(&mut sink).unwrap();

        assert!(sink.bytes.is_empty());
    }

    #[test]
    fn resume_sends_continue_once() {
        let mut sink = ByteSink::default();
        let mut emitter = MidiEmitter::new();

        emitter.resume(&mut sink).unwrap();
        emitter.resume(&mut sink).unwrap();

        assert_eq!(sink.bytes, [0xFB, 0x00]);
        assert_eq!(emitter.transport(), Transport::Running);
    }
}
