//! Interrupt-safe handoffs between interrupt handlers and the main loop.
//!
//! Each type here is meant to live in a `static` and be shared by
//! reference: interrupt handlers only ever touch these, never the
//! scheduler or the sensor line.
//!
//! Atomics come from `portable-atomic`, which falls back to critical
//! sections on cores without compare-and-swap (Cortex-M0/M0+).

use portable_atomic::{AtomicU8, AtomicU16, AtomicU32, Ordering};

use crate::config::Config;

/// State of the single read slot.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadState {
    Idle = 0,
    ReadPending = 1,
    ReadInProgress = 2,
}

impl ReadState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => ReadState::ReadPending,
            2 => ReadState::ReadInProgress,
            _ => ReadState::Idle,
        }
    }
}

/// Serializes read requests: at most one read is pending or in flight.
///
/// Requests made while a read is pending or in progress are coalesced,
/// not queued.
pub struct ReadGate {
    state: AtomicU8,
}

impl ReadGate {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(ReadState::Idle as u8),
        }
    }

    /// Requests a read. Returns `false` if the request was dropped because
    /// the gate was not idle.
    pub fn request(&self) -> bool {
        self.transition(ReadState::Idle, ReadState::ReadPending)
    }

    /// Claims a pending read for execution. Returns `false` if no read was
    /// pending.
    pub fn begin(&self) -> bool {
        self.transition(ReadState::ReadPending, ReadState::ReadInProgress)
    }

    /// Marks the in-flight read as finished, whatever its outcome.
    pub fn finish(&self) {
        self.state.store(ReadState::Idle as u8, Ordering::Release);
    }

    pub fn state(&self) -> ReadState {
        ReadState::from_raw(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: ReadState, to: ReadState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for ReadGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Divides a fixed hardware tick down to the polling interval.
///
/// `tick` is called from the timer interrupt only; it is the single writer
/// of the tick counter.
pub struct PeriodicTrigger {
    ticks_per_read: u32,
    elapsed: AtomicU32,
}

impl PeriodicTrigger {
    /// Creates a trigger requesting a read every `ticks_per_read` ticks.
    pub const fn new(ticks_per_read: u32) -> Self {
        let ticks_per_read = if ticks_per_read == 0 { 1 } else { ticks_per_read };
        Self {
            ticks_per_read,
            elapsed: AtomicU32::new(0),
        }
    }

    pub const fn from_config(config: &Config) -> Self {
        Self::new(config.ticks_per_read())
    }

    pub fn ticks_per_read(&self) -> u32 {
        self.ticks_per_read
    }

    /// Advances the divider by one tick.
    ///
    /// Returns `true` when this tick produced a new read request; a period
    /// that ends while the gate is busy is dropped.
    pub fn tick(&self, gate: &ReadGate) -> bool {
        let elapsed = self.elapsed.load(Ordering::Relaxed) + 1;
        if elapsed < self.ticks_per_read {
            self.elapsed.store(elapsed, Ordering::Relaxed);
            return false;
        }
        self.elapsed.store(0, Ordering::Relaxed);
        gate.request()
    }
}

/// One-byte mailbox from the serial receive interrupt to the main loop.
pub struct CommandSlot {
    slot: AtomicU16,
}

const EMPTY: u16 = 0x100;

impl CommandSlot {
    pub const fn new() -> Self {
        Self {
            slot: AtomicU16::new(EMPTY),
        }
    }

    /// Stores a received byte. If the previous byte was not taken yet it is
    /// overwritten and returned.
    pub fn post(&self, byte: u8) -> Option<u8> {
        Self::decode(self.slot.swap(byte as u16, Ordering::AcqRel))
    }

    /// Takes the pending byte, if any.
    pub fn take(&self) -> Option<u8> {
        Self::decode(self.slot.swap(EMPTY, Ordering::AcqRel))
    }

    fn decode(raw: u16) -> Option<u8> {
        u8::try_from(raw).ok()
    }
}

impl Default for CommandSlot {
    fn default() -> Self {
        Self::new()
    }
}
