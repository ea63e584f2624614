//! Single-byte commands received over the serial link.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use embedded_io::Write;

use crate::indicator::Indicator;
use crate::scheduler::ReadScheduler;
use crate::wire;

/// Decoded command byte.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// `R`: take a reading now and send it.
    Read,
    /// `S`: report the sensor health without reading.
    Status,
    /// `C`: re-establish the sensor line configuration.
    Calibrate,
    /// Any other byte.
    Unknown(u8),
}

impl Command {
    /// Decodes a received byte. Every byte maps to a command.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'R' => Command::Read,
            b'S' => Command::Status,
            b'C' => Command::Calibrate,
            other => Command::Unknown(other),
        }
    }
}

impl From<u8> for Command {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl<PIN, DELAY, E, IND, TX> ReadScheduler<'_, PIN, DELAY, IND, TX>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
    IND: Indicator,
    TX: Write,
{
    /// Executes one command and sends its reply.
    ///
    /// A read request arriving while another read is pending is dropped
    /// without any reply; the pending read still runs on the next
    /// [`poll`](ReadScheduler::poll).
    pub fn handle(&mut self, command: Command) -> Result<(), TX::Error> {
        debug!("command: {}", command);
        match command {
            Command::Read => {
                if self.request() {
                    self.poll()?;
                } else {
                    trace!("read already pending, request dropped");
                }
                Ok(())
            }
            Command::Status => {
                self.send(wire::SYSTEM_OK.as_bytes())?;
                self.send(wire::status_line(self.health()).as_bytes())
            }
            Command::Calibrate => {
                let reply = if self.reinitialize() {
                    wire::CALIBRATED
                } else {
                    wire::CALIBRATION_FAILED
                };
                self.send(reply.as_bytes())
            }
            Command::Unknown(_) => self.send(wire::UNKNOWN_COMMAND.as_bytes()),
        }
    }
}
