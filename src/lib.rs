//! DHT11 Sensor Poller for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the DHT11 temperature
//! and humidity sensor, built on top of the [`embedded-hal`] traits, together
//! with the scheduling logic that samples it periodically and on request and
//! reports readings to a host over a serial link.
//!
//! # Features
//! - Blocking synchronous driver using `embedded-hal` traits
//! - Checksum validation that keeps failed frames for diagnostics
//! - Interrupt-safe read triggers with coalescing, no queueing
//! - Single-byte command interface (`R`, `S`, `C`) over any [`embedded-io`] writer
//! - Designed for `no_std` environments
//! - Optional logging support via `defmt`
//!
//! # Wiring it up
//!
//! The timer interrupt calls [`PeriodicTrigger::tick`], the serial receive
//! interrupt calls [`CommandSlot::post`], and the main loop repeatedly calls
//! [`ReadScheduler::service`]. The gate, trigger and command slot are meant
//! to live in `static`s:
//!
//! ```ignore
//! static GATE: ReadGate = ReadGate::new();
//! static TRIGGER: PeriodicTrigger = PeriodicTrigger::from_config(&Config::DEFAULT);
//! static COMMANDS: CommandSlot = CommandSlot::new();
//!
//! // timer interrupt, every `tick_period_ms`
//! TRIGGER.tick(&GATE);
//! // serial receive interrupt
//! COMMANDS.post(byte);
//!
//! let sensor = Dht11::new(pin, CalibratedDelay::from_clock(CPU_HZ, 4));
//! let mut poller = ReadScheduler::new(sensor, DualLed::new(green, red), uart, &GATE, &Config::DEFAULT);
//! poller.start()?;
//! loop {
//!     // A failed serial write is not fatal: log it and keep polling.
//!     if poller.service(&COMMANDS).is_err() {
//!         defmt::warn!("serial write failed");
//!     }
//! }
//! ```
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` for logging support and emits
//!   driver logs through `defmt`
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`embedded-io`]: https://docs.rs/embedded-io

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod command;
pub mod config;
pub mod dht11;
pub mod error;
pub mod frame;
pub mod indicator;
pub mod scheduler;
pub mod signal;
pub mod timing;
pub mod wire;

#[cfg(test)]
mod testing;

pub use command::Command;
pub use config::{Config, ConfigError};
pub use dht11::{Dht11, LineTiming};
pub use error::{DhtError, ErrorKind};
pub use frame::{Health, Reading, Validation};
pub use indicator::{DualLed, Indicator};
pub use scheduler::{ReadScheduler, ReadStats};
pub use signal::{CommandSlot, PeriodicTrigger, ReadGate, ReadState};
pub use timing::CalibratedDelay;
pub use wire::Encoding;
