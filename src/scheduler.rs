//! Serialized sensor reads driven by the periodic trigger and by commands.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use embedded_io::Write;

use crate::command::Command;
use crate::config::Config;
use crate::dht11::Dht11;
use crate::error::ErrorKind;
use crate::frame::{self, Health, Reading, Validation};
use crate::indicator::Indicator;
use crate::signal::{CommandSlot, ReadGate};
use crate::wire::{self, Encoding};

/// Counters over all read attempts since boot.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub attempts: u32,
    /// Reads that ended without a valid reading, for any reason.
    pub failures: u32,
    /// Subset of `failures` where a complete frame failed its checksum.
    pub checksum_failures: u32,
}

impl ReadStats {
    fn record(&mut self, fault: Option<ErrorKind>) {
        self.attempts = self.attempts.wrapping_add(1);
        if let Some(kind) = fault {
            self.failures = self.failures.wrapping_add(1);
            if kind == ErrorKind::ChecksumMismatch {
                self.checksum_failures = self.checksum_failures.wrapping_add(1);
            }
        }
    }
}

/// Owns the sensor, the status indicator and the serial output, and runs at
/// most one read at a time.
///
/// Interrupt handlers interact with it only through the shared
/// [`ReadGate`] (and the [`CommandSlot`] passed to [`service`]).
///
/// [`service`]: ReadScheduler::service
pub struct ReadScheduler<'a, PIN, D, IND, TX> {
    sensor: Dht11<PIN, D>,
    indicator: IND,
    serial: TX,
    gate: &'a ReadGate,
    encoding: Encoding,
    reading: Reading,
    health: Health,
    stats: ReadStats,
}

impl<'a, PIN, DELAY, E, IND, TX> ReadScheduler<'a, PIN, DELAY, IND, TX>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
    IND: Indicator,
    TX: Write,
{
    /// Creates a scheduler. No reading has been taken yet, so the health
    /// starts as [`Health::Error`].
    pub fn new(
        sensor: Dht11<PIN, DELAY>,
        indicator: IND,
        serial: TX,
        gate: &'a ReadGate,
        config: &Config,
    ) -> Self {
        ReadScheduler {
            sensor,
            indicator,
            serial,
            gate,
            encoding: config.encoding,
            reading: Reading::invalid(),
            health: Health::Error,
            stats: ReadStats::default(),
        }
    }

    /// Prepares the sensor line and announces readiness on the serial link.
    ///
    /// The indicator shows the ready (green) state until the first read
    /// reports otherwise, even though [`health`](Self::health) stays
    /// `Error` until a valid reading arrives.
    pub fn start(&mut self) -> Result<(), TX::Error> {
        if self.sensor.init().is_err() {
            warn!("failed to release sensor line");
        }
        self.show(Health::Operational);
        info!("poller ready");
        self.serial.write_all(wire::BANNER.as_bytes())?;
        self.serial.write_all(wire::READY.as_bytes())
    }

    /// Last reading, valid or not.
    pub fn reading(&self) -> &Reading {
        &self.reading
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    /// On-demand trigger. Returns `false` if a read was already pending or
    /// in progress, in which case the request is dropped.
    pub fn request(&self) -> bool {
        self.gate.request()
    }

    /// Runs the pending read, if any, and emits its line.
    ///
    /// Returns the reading that was taken, or `None` if no read was pending.
    /// The gate goes back to idle even if the serial write fails.
    pub fn poll(&mut self) -> Result<Option<Reading>, TX::Error> {
        if !self.gate.begin() {
            return Ok(None);
        }

        let validation = self.acquire();
        let sent = self.send(wire::outcome_line(&validation, self.encoding).as_bytes());
        self.gate.finish();
        sent?;

        Ok(Some(validation.reading))
    }

    /// One main loop iteration: a pending read first, then at most one
    /// received command byte.
    pub fn service(&mut self, commands: &CommandSlot) -> Result<(), TX::Error> {
        self.poll()?;
        if let Some(byte) = commands.take() {
            self.handle(Command::from_byte(byte))?;
        }
        Ok(())
    }

    /// Re-establishes the sensor line configuration.
    pub(crate) fn reinitialize(&mut self) -> bool {
        match self.sensor.init() {
            Ok(()) => true,
            Err(_) => {
                warn!("failed to reinitialize sensor line");
                false
            }
        }
    }

    pub(crate) fn send(&mut self, line: &[u8]) -> Result<(), TX::Error> {
        self.serial.write_all(line)
    }

    /// Performs one transaction and records its outcome.
    fn acquire(&mut self) -> Validation {
        let validation = frame::validate(self.sensor.read_raw());

        self.reading = validation.reading;
        self.health = validation.health();
        self.stats.record(validation.fault);

        match validation.fault {
            None => debug!(
                "reading: humidity {}.{} %, temperature {}.{} C",
                self.reading.humidity_integer,
                self.reading.humidity_fraction,
                self.reading.temperature_integer,
                self.reading.temperature_fraction,
            ),
            Some(kind) => warn!("read failed: {}", kind),
        }

        self.show(self.health);
        validation
    }

    fn show(&mut self, health: Health) {
        if self.indicator.show(health).is_err() {
            warn!("failed to update status indicator");
        }
    }
}

#[cfg(test)]
impl<PIN, D, IND> ReadScheduler<'_, PIN, D, IND, crate::testing::SerialLog> {
    pub(crate) fn serial_text(&self) -> &str {
        self.serial.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{PeriodicTrigger, ReadState};
    use crate::testing::{RecordingIndicator, SerialLog, frame_transactions, silent_sensor};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTx,
    };

    type Scheduler<'a> = ReadScheduler<'a, PinMock, NoopDelay, RecordingIndicator, SerialLog>;

    fn scheduler<'a>(pin: &PinMock, gate: &'a ReadGate, config: &Config) -> Scheduler<'a> {
        ReadScheduler::new(
            Dht11::new(pin.clone(), NoopDelay),
            RecordingIndicator::default(),
            SerialLog::default(),
            gate,
            config,
        )
    }

    #[test]
    fn test_start() {
        let gate = ReadGate::new();
        let mut pin = PinMock::new(&[PinTx::set(PinState::High)]);
        let mut poller = scheduler(&pin, &gate, &Config::DEFAULT);

        poller.start().unwrap();

        assert_eq!(
            poller.serial.text(),
            "IoT Home Automation System Initialized\r\nSystem: Ready\r\n"
        );
        // Green at boot, but no reading has validated yet
        assert_eq!(poller.indicator.shown, vec![Health::Operational]);
        assert_eq!(poller.health(), Health::Error);
        pin.done();
    }

    #[test]
    fn test_poll_without_request_does_nothing() {
        let gate = ReadGate::new();
        let mut pin = PinMock::new(&[]);
        let mut poller = scheduler(&pin, &gate, &Config::DEFAULT);

        assert_eq!(poller.poll().unwrap(), None);
        assert!(poller.serial.bytes.is_empty());
        assert_eq!(poller.stats().attempts, 0);
        pin.done();
    }

    #[test]
    fn test_valid_read() {
        let gate = ReadGate::new();
        let mut pin = PinMock::new(&frame_transactions(&[0x41, 0x00, 0x18, 0x05, 0x5E]));
        let mut poller = scheduler(&pin, &gate, &Config::DEFAULT);

        assert!(poller.request());
        let reading = poller.poll().unwrap().unwrap();

        assert!(reading.valid);
        assert_eq!(poller.serial.text(), "TEMP:24 HUM:65 STATUS:1\r\n");
        assert_eq!(poller.health(), Health::Operational);
        assert_eq!(poller.indicator.shown, vec![Health::Operational]);
        assert_eq!(gate.state(), ReadState::Idle);
        pin.done();
    }

    #[test]
    fn test_checksum_mismatch() {
        let gate = ReadGate::new();
        let mut pin = PinMock::new(&frame_transactions(&[0x41, 0x00, 0x18, 0x05, 0x00]));
        let mut poller = scheduler(&pin, &gate, &Config::DEFAULT);

        assert!(poller.request());
        let reading = poller.poll().unwrap().unwrap();

        assert!(!reading.valid);
        assert_eq!(reading.humidity_integer, 0x41);
        assert_eq!(poller.serial.text(), "TEMP:24 HUM:65 STATUS:0\r\n");
        assert_eq!(poller.health(), Health::Error);
        assert_eq!(
            *poller.stats(),
            ReadStats {
                attempts: 1,
                failures: 1,
                checksum_failures: 1,
            }
        );
        pin.done();
    }

    #[test]
    fn test_no_response() {
        let gate = ReadGate::new();
        let mut pin = PinMock::new(&silent_sensor());
        let mut poller = scheduler(&pin, &gate, &Config::DEFAULT);

        assert!(poller.request());
        let reading = poller.poll().unwrap().unwrap();

        assert_eq!(reading, Reading::invalid());
        // No frame, so no data fields: only the failed status
        assert_eq!(poller.serial.text(), "STATUS:0\r\n");
        assert!(!poller.serial.text().contains("TEMP:"));
        assert_eq!(poller.health(), Health::Error);
        assert_eq!(poller.stats().checksum_failures, 0);
        assert_eq!(poller.stats().failures, 1);
        // The scheduler keeps going after a failure
        assert_eq!(gate.state(), ReadState::Idle);
        assert!(poller.request());
        pin.done();
    }

    #[test]
    fn test_failure_after_success_resets_health() {
        let gate = ReadGate::new();
        let mut transactions = frame_transactions(&[0x41, 0x00, 0x18, 0x05, 0x5E]);
        transactions.extend(silent_sensor());
        let mut pin = PinMock::new(&transactions);
        let mut poller = scheduler(&pin, &gate, &Config::DEFAULT);

        poller.request();
        poller.poll().unwrap();
        assert_eq!(poller.health(), Health::Operational);

        poller.request();
        poller.poll().unwrap();
        assert_eq!(poller.health(), Health::Error);
        assert_eq!(poller.indicator.shown, vec![Health::Operational, Health::Error]);
        assert_eq!(poller.serial.text(), "TEMP:24 HUM:65 STATUS:1\r\nSTATUS:0\r\n");
        pin.done();
    }

    #[test]
    fn test_coalesced_triggers_run_one_transaction() {
        let gate = ReadGate::new();
        // Exactly one transaction is expected by the mock
        let mut pin = PinMock::new(&frame_transactions(&[0x41, 0x00, 0x18, 0x05, 0x5E]));
        let mut poller = scheduler(&pin, &gate, &Config::DEFAULT);
        let trigger = PeriodicTrigger::new(1);

        assert!(trigger.tick(&gate));
        assert!(!trigger.tick(&gate));
        assert!(!poller.request());

        assert!(poller.poll().unwrap().is_some());
        assert_eq!(poller.poll().unwrap(), None);
        assert_eq!(poller.serial.text().lines().count(), 1);
        assert_eq!(poller.stats().attempts, 1);
        pin.done();
    }

    #[test]
    fn test_trigger_during_read_is_dropped() {
        let gate = ReadGate::new();
        let mut pin = PinMock::new(&[]);
        let mut poller = scheduler(&pin, &gate, &Config::DEFAULT);
        let trigger = PeriodicTrigger::new(1);

        // Simulate the timer firing while a transaction owns the line
        assert!(gate.request());
        assert!(gate.begin());
        assert!(!trigger.tick(&gate));
        gate.finish();

        assert_eq!(poller.poll().unwrap(), None);
        assert!(poller.serial.bytes.is_empty());
        pin.done();
    }

    #[test]
    fn test_decimal_encoding() {
        let gate = ReadGate::new();
        let mut pin = PinMock::new(&frame_transactions(&[0x41, 0x00, 0x18, 0x05, 0x5E]));
        let config = Config::DEFAULT.with_encoding(Encoding::Decimal);
        let mut poller = scheduler(&pin, &gate, &config);

        poller.request();
        poller.poll().unwrap();

        assert_eq!(poller.serial.text(), "TEMP:24.5 HUM:65.0 STATUS:1\r\n");
        pin.done();
    }

    #[test]
    fn test_service_runs_read_before_command() {
        let gate = ReadGate::new();
        let commands = CommandSlot::new();
        let mut pin = PinMock::new(&frame_transactions(&[0x41, 0x00, 0x18, 0x05, 0x5E]));
        let mut poller = scheduler(&pin, &gate, &Config::DEFAULT);

        gate.request();
        commands.post(b'S');
        poller.service(&commands).unwrap();

        assert_eq!(
            poller.serial.text(),
            "TEMP:24 HUM:65 STATUS:1\r\nSystem Status: OK\r\nSensor Status: 1\r\n"
        );
        assert_eq!(commands.take(), None);
        pin.done();
    }
}
