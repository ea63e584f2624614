use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::error::DhtError;
use crate::frame::{FRAME_LEN, RawFrame, Reading};

/// Protocol timing used by the DHT11 driver.
///
/// Durations measured while waiting on the line are counted in polling
/// steps of 1us each; how closely that matches wall time depends on the
/// calibration of the delay provider.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineTiming {
    /// How long the MCU holds the line low to request a measurement.
    pub start_low_ms: u32,
    /// Wait after releasing the line before sampling the response.
    pub release_settle_us: u32,
    /// Timeout for each phase of the sensor's response handshake.
    pub response_timeout_us: u32,
    /// Timeout for the low sync phase and the high pulse of every data bit.
    pub bit_timeout_us: u32,
    /// High pulses at least this long decode as `1`, shorter ones as `0`.
    pub bit_threshold_us: u32,
}

impl LineTiming {
    pub const DEFAULT: LineTiming = LineTiming {
        start_low_ms: 18,
        release_settle_us: 30,
        response_timeout_us: 100,
        bit_timeout_us: 100,
        bit_threshold_us: 40,
    };
}

impl Default for LineTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Driver for the DHT11 temperature and humidity sensor.
pub struct Dht11<PIN, D> {
    pin: PIN,
    delay: D,
    timing: LineTiming,
}

impl<PIN, DELAY, E> Dht11<PIN, DELAY>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
{
    /// Creates a new instance of the DHT11 driver with the default timing.
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO pin connected to the DHT11 data line. Must support
    ///   both input and output (open-drain with an external pull-up).
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    pub fn new(pin: PIN, delay: DELAY) -> Self {
        Self::with_timing(pin, delay, LineTiming::DEFAULT)
    }

    /// Creates a driver with custom protocol timing.
    pub fn with_timing(pin: PIN, delay: DELAY, timing: LineTiming) -> Self {
        Dht11 { pin, delay, timing }
    }

    /// Current protocol timing.
    pub fn timing(&self) -> &LineTiming {
        &self.timing
    }

    /// Releases the data line to its idle-high level.
    ///
    /// Called once at boot and again whenever the line configuration has to
    /// be re-established. Does not talk to the sensor.
    pub fn init(&mut self) -> Result<(), E> {
        self.pin.set_high()
    }

    /// Gives back the pin and delay provider.
    pub fn release(self) -> (PIN, DELAY) {
        (self.pin, self.delay)
    }

    /// Reads a measurement and validates its checksum.
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the transaction completed and the checksum is valid.
    /// * `Err(DhtError)` if a communication or checksum error occurs.
    pub fn read(&mut self) -> Result<Reading, DhtError<E>> {
        let reading = Reading::from_frame(self.read_raw()?);
        if reading.valid {
            Ok(reading)
        } else {
            Err(DhtError::ChecksumMismatch)
        }
    }

    /// Executes one complete transaction and returns the 5 raw bytes.
    ///
    /// Any timeout aborts the whole transaction; a partial frame is never
    /// returned. The handshake and bit reception run inside a critical
    /// section since interrupt jitter would corrupt the pulse measurements.
    pub fn read_raw(&mut self) -> Result<RawFrame, DhtError<E>> {
        self.start()?;
        critical_section::with(|_| self.receive())
    }

    /// Sends the start signal: line low for the start pulse, then released.
    fn start(&mut self) -> Result<(), DhtError<E>> {
        self.pin.set_low()?;
        self.delay.delay_ms(self.timing.start_low_ms);
        self.pin.set_high()?;
        self.delay.delay_us(self.timing.release_settle_us);
        Ok(())
    }

    /// Waits for the sensor's response and reads the 40 data bits.
    fn receive(&mut self) -> Result<RawFrame, DhtError<E>> {
        let timeout = self.timing.response_timeout_us;

        // Sensor acknowledges by pulling the line low...
        self.wait_while(true, timeout)?.ok_or(DhtError::NoResponse)?;
        // ...for ~80us, then high for ~80us before the first bit.
        self.wait_while(false, timeout)?.ok_or(DhtError::ResponseTimeout)?;
        self.wait_while(true, timeout)?.ok_or(DhtError::ResponseTimeout)?;

        let mut frame = [0; FRAME_LEN];
        for b in frame.iter_mut() {
            *b = self.read_byte()?;
        }
        Ok(frame)
    }

    /// Reads one byte (8 bits, MSB first) from the sensor.
    fn read_byte(&mut self) -> Result<u8, DhtError<E>> {
        let mut byte: u8 = 0;

        for i in 0..8 {
            let bit_mask = 1 << (7 - i);
            if self.read_bit()? {
                byte |= bit_mask;
            }
        }

        Ok(byte)
    }

    /// Reads a single bit from the sensor.
    ///
    /// Each bit starts with a ~50us low sync phase followed by a high pulse
    /// of ~26-28us for a `0` or ~70us for a `1`.
    fn read_bit(&mut self) -> Result<bool, DhtError<E>> {
        let timeout = self.timing.bit_timeout_us;

        self.wait_while(false, timeout)?.ok_or(DhtError::BitTimeout)?;
        let high_us = self.wait_while(true, timeout)?.ok_or(DhtError::BitTimeout)?;

        Ok(high_us >= self.timing.bit_threshold_us)
    }

    /// Polls the line every 1us while it stays at the given level.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(elapsed))` once the level changes, `elapsed` being the
    ///   number of polls that still saw the old level.
    /// * `Ok(None)` when the level did not change within `timeout_us` polls.
    fn wait_while(&mut self, high: bool, timeout_us: u32) -> Result<Option<u32>, E> {
        for elapsed in 0..timeout_us {
            if self.pin.is_high()? != high {
                return Ok(Some(elapsed));
            }
            self.delay.delay_us(1);
        }
        Ok(None)
    }
}
