use std::io::Write;

use quartz_core::hal::MidiOut;
use serialport::SerialPort;

#[macro_export]
macro_rules! pause {
    () => {
        $crate::io::pause_impl(None);
    };
    ($($arg:tt)*) => {
        $crate::io::pause_impl(Some(&format!($($arg)*)));
    };
}

pub fn pause_impl(message: Option<&str>) {
    use std::io::{stdin, stdout};
    use termion::input::TermRead;
    use termion::raw::IntoRawMode;

    println!("{}", message.unwrap_or("Press any key to continue..."));

    let mut stdout = stdout().into_raw_mode().unwrap();
    stdout.flush().unwrap();
    stdin().events().next();
}

/// MIDI byte sink that keeps a copy of everything written and, when a port
/// is attached, forwards it to the wire as it happens.
#[derive(Default)]
pub struct MidiTap {
    port: Option<Box<dyn SerialPort>>,
    bytes: Vec<u8>,
    verbose: bool,
}

impl MidiTap {
    pub fn new(port: Option<Box<dyn SerialPort>>, verbose: bool) -> Self {
        Self {
            port,
            bytes: Vec::new(),
            verbose,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl MidiOut for MidiTap {
    type Error = std::io::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.verbose {
            println!("  midi {:02X?}", bytes);
        }

        self.bytes.extend_from_slice(bytes);

        if let Some(port) = self.port.as_mut() {
            port.write_all(bytes)?;
            port.flush()?;
        }

        Ok(())
    }
}
