//! Shared helpers for the inline test modules.

use core::convert::Infallible;

use embedded_hal_mock::eh1::digital::{State as PinState, Transaction as PinTx};

use crate::frame::Health;
use crate::indicator::Indicator;

/// High-pulse length of a `1` bit, in polls.
pub const ONE_HIGH_POLLS: usize = 70;
/// High-pulse length of a `0` bit, in polls.
pub const ZERO_HIGH_POLLS: usize = 27;

/// MCU pulls the line low, then releases it.
pub fn start_signal() -> Vec<PinTx> {
    vec![PinTx::set(PinState::Low), PinTx::set(PinState::High)]
}

/// Sensor response: ~80us low, ~80us high, then the first bit's sync low.
pub fn handshake() -> Vec<PinTx> {
    vec![
        // wait for the sensor to pull low
        PinTx::get(PinState::High),
        PinTx::get(PinState::Low),
        // wait for it to release
        PinTx::get(PinState::Low),
        PinTx::get(PinState::High),
        // wait for the end of the response high phase
        PinTx::get(PinState::High),
        PinTx::get(PinState::Low),
    ]
}

/// One data bit: sync low, then a high pulse whose length encodes the bit.
pub fn bit_transactions(bit: bool) -> Vec<PinTx> {
    let polls = if bit { ONE_HIGH_POLLS } else { ZERO_HIGH_POLLS };
    let mut tx = vec![PinTx::get(PinState::Low), PinTx::get(PinState::High)];
    tx.extend(std::iter::repeat_n(PinTx::get(PinState::High), polls));
    tx.push(PinTx::get(PinState::Low));
    tx
}

/// Complete transaction delivering `bytes`, MSB first.
pub fn frame_transactions(bytes: &[u8]) -> Vec<PinTx> {
    let mut tx = start_signal();
    tx.extend(handshake());
    for byte in bytes {
        for i in 0..8 {
            tx.extend(bit_transactions((byte >> (7 - i)) & 1 == 1));
        }
    }
    tx
}

/// Start signal followed by a sensor that never answers.
pub fn silent_sensor() -> Vec<PinTx> {
    let mut tx = start_signal();
    tx.extend(std::iter::repeat_n(PinTx::get(PinState::High), 100));
    tx
}

/// Serial sink collecting everything written to it.
#[derive(Default)]
pub struct SerialLog {
    pub bytes: Vec<u8>,
}

impl SerialLog {
    pub fn text(&self) -> &str {
        core::str::from_utf8(&self.bytes).unwrap()
    }
}

impl embedded_io::ErrorType for SerialLog {
    type Error = Infallible;
}

impl embedded_io::Write for SerialLog {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Indicator remembering every health value it was asked to show.
#[derive(Default)]
pub struct RecordingIndicator {
    pub shown: Vec<Health>,
}

impl Indicator for RecordingIndicator {
    type Error = Infallible;

    fn show(&mut self, health: Health) -> Result<(), Self::Error> {
        self.shown.push(health);
        Ok(())
    }
}
