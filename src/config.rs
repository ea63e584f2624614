//! Poller configuration.

use crate::dht11::LineTiming;
use crate::wire::Encoding;

/// The DHT11 must not be sampled more often than once per second.
pub const MIN_POLL_INTERVAL_MS: u32 = 1000;

/// Errors returned when building a [`Config`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The hardware tick period must be non-zero.
    ZeroTickPeriod,
    /// Polling faster than the sensor's minimum sampling interval.
    IntervalTooShort,
}

/// Runtime configuration of the poller.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Period of the automatic read trigger.
    pub poll_interval_ms: u32,
    /// Period of the hardware timer interrupt driving [`PeriodicTrigger`].
    ///
    /// [`PeriodicTrigger`]: crate::signal::PeriodicTrigger
    pub tick_period_ms: u32,
    /// Format of the reading line sent over serial.
    pub encoding: Encoding,
    /// Protocol timing for the sensor line.
    pub timing: LineTiming,
}

impl Config {
    /// Reads every 5 s from a 5 ms tick, legacy two-digit wire format.
    pub const DEFAULT: Config = Config {
        poll_interval_ms: 5000,
        tick_period_ms: 5,
        encoding: Encoding::TwoDigit,
        timing: LineTiming::DEFAULT,
    };

    /// Creates a configuration with the given polling and tick periods.
    pub fn new(poll_interval_ms: u32, tick_period_ms: u32) -> Result<Self, ConfigError> {
        if tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(ConfigError::IntervalTooShort);
        }
        Ok(Config {
            poll_interval_ms,
            tick_period_ms,
            ..Self::DEFAULT
        })
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_timing(mut self, timing: LineTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Number of timer ticks between two automatic reads, at least one.
    pub const fn ticks_per_read(&self) -> u32 {
        if self.tick_period_ms == 0 {
            return 1;
        }
        let ticks = self.poll_interval_ms / self.tick_period_ms;
        if ticks == 0 { 1 } else { ticks }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}
