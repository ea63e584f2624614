//! Checksum validation and decoding of the raw 5-byte DHT11 frame.

use crate::error::{DhtError, ErrorKind};

/// Number of bytes in one DHT11 frame.
pub const FRAME_LEN: usize = 5;

/// Raw frame as received from the sensor, MSB-first per byte:
/// humidity integer, humidity fraction, temperature integer,
/// temperature fraction, checksum.
pub type RawFrame = [u8; FRAME_LEN];

/// Reading produced by one protocol cycle.
///
/// A reading is kept even when it failed validation so the received bytes
/// stay visible for diagnostics; check [`Reading::valid`] before using it.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reading {
    pub humidity_integer: u8,
    pub humidity_fraction: u8,
    pub temperature_integer: u8,
    pub temperature_fraction: u8,
    pub checksum: u8,
    /// True when the checksum matched the payload.
    pub valid: bool,
}

impl Reading {
    /// Reading used when no frame was received at all.
    pub const fn invalid() -> Self {
        Reading {
            humidity_integer: 0,
            humidity_fraction: 0,
            temperature_integer: 0,
            temperature_fraction: 0,
            checksum: 0,
            valid: false,
        }
    }

    /// Builds a reading from a raw frame, validating its checksum.
    pub fn from_frame(frame: RawFrame) -> Self {
        let [hum_int, hum_frac, temp_int, temp_frac, checksum] = frame;
        Reading {
            humidity_integer: hum_int,
            humidity_fraction: hum_frac,
            temperature_integer: temp_int,
            temperature_fraction: temp_frac,
            checksum,
            valid: checksum_of(&frame[..4]) == checksum,
        }
    }

    /// Relative humidity in percent.
    pub fn humidity(&self) -> f32 {
        self.humidity_integer as f32 + self.humidity_fraction as f32 / 10.0
    }

    /// Temperature in degrees Celsius.
    pub fn temperature(&self) -> f32 {
        self.temperature_integer as f32 + self.temperature_fraction as f32 / 10.0
    }

    /// Health status implied by this reading.
    pub fn health(&self) -> Health {
        if self.valid {
            Health::Operational
        } else {
            Health::Error
        }
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Health of the sensor link, derived from the most recent reading.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Health {
    Operational,
    Error,
}

impl Health {
    /// Digit used for this status on the serial line.
    pub fn as_digit(self) -> u8 {
        match self {
            Health::Operational => b'1',
            Health::Error => b'0',
        }
    }
}

/// Outcome of validating one driver result.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validation {
    pub reading: Reading,
    /// Why the reading is invalid, `None` when it is valid.
    pub fault: Option<ErrorKind>,
}

impl Validation {
    pub fn health(&self) -> Health {
        self.reading.health()
    }
}

/// 8-bit truncated sum of `data`.
pub fn checksum_of(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, v| sum.wrapping_add(*v))
}

/// Resolves a protocol driver result into a reading.
///
/// Transport failures produce [`Reading::invalid`]; a frame with a bad
/// checksum keeps the received bytes and is reported as
/// [`ErrorKind::ChecksumMismatch`].
pub fn validate<E>(result: Result<RawFrame, DhtError<E>>) -> Validation {
    match result {
        Ok(frame) => {
            let reading = Reading::from_frame(frame);
            let fault = (!reading.valid).then_some(ErrorKind::ChecksumMismatch);
            Validation { reading, fault }
        }
        Err(e) => Validation {
            reading: Reading::invalid(),
            fault: Some(e.kind()),
        },
    }
}
