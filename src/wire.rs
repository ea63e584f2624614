//! Lines sent to the host over the serial link.
//!
//! Every line is ASCII and terminated by CR LF.

use core::fmt::Write as _;

use heapless::String;

use crate::frame::{Health, Reading, Validation};

/// Capacity of one outbound line; fits the widest reading line.
pub const LINE_CAPACITY: usize = 40;

/// A formatted outbound line.
pub type Line = String<LINE_CAPACITY>;

pub const BANNER: &str = "IoT Home Automation System Initialized\r\n";
pub const READY: &str = "System: Ready\r\n";
pub const SYSTEM_OK: &str = "System Status: OK\r\n";
pub const CALIBRATED: &str = "Calibration Complete\r\n";
pub const CALIBRATION_FAILED: &str = "Calibration Failed\r\n";
pub const UNKNOWN_COMMAND: &str = "Unknown Command\r\n";

/// How readings are rendered on the wire.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    /// `TEMP:24 HUM:65 STATUS:1`: tens and ones digit of the integer parts.
    ///
    /// Values of 100 and above wrap; fractions are not sent. Kept for hosts
    /// parsing the historical format.
    #[default]
    TwoDigit,
    /// `TEMP:24.5 HUM:65.0 STATUS:1`: full integer part and one decimal.
    Decimal,
}

/// Formats the line reporting a reading.
pub fn reading_line(reading: &Reading, encoding: Encoding) -> Line {
    let mut line = Line::new();
    let status = reading.health().as_digit() as char;
    // Capacity covers the widest line, formatting cannot fail.
    let _ = match encoding {
        Encoding::TwoDigit => write!(
            line,
            "TEMP:{}{} HUM:{}{} STATUS:{}\r\n",
            tens(reading.temperature_integer),
            ones(reading.temperature_integer),
            tens(reading.humidity_integer),
            ones(reading.humidity_integer),
            status,
        ),
        Encoding::Decimal => write!(
            line,
            "TEMP:{}.{} HUM:{}.{} STATUS:{}\r\n",
            reading.temperature_integer,
            reading.temperature_fraction,
            reading.humidity_integer,
            reading.humidity_fraction,
            status,
        ),
    };
    line
}

/// Formats the line reporting the outcome of one read attempt.
///
/// When no frame was received there is no data to report, so only the
/// failed status is sent. A frame that failed its checksum is reported with
/// the received values and `STATUS:0`.
pub fn outcome_line(validation: &Validation, encoding: Encoding) -> Line {
    match validation.fault {
        Some(kind) if kind.is_transport() => {
            let mut line = Line::new();
            let _ = write!(line, "STATUS:{}\r\n", Health::Error.as_digit() as char);
            line
        }
        _ => reading_line(&validation.reading, encoding),
    }
}

/// Formats the reply to a status request.
pub fn status_line(health: Health) -> Line {
    let mut line = Line::new();
    let _ = write!(line, "Sensor Status: {}\r\n", health.as_digit() as char);
    line
}

fn tens(value: u8) -> u8 {
    (value / 10) % 10
}

fn ones(value: u8) -> u8 {
    value % 10
}
