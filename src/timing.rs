//! Calibrated busy-wait delay.
//!
//! The DHT11 protocol only needs a coarse blocking delay, so the timing
//! primitive is a spin loop whose iteration count per microsecond is an
//! injected calibration constant. Any other [`DelayNs`] implementation (a
//! HAL timer, `embassy-time`'s blocking delay, ...) can be used with the
//! driver instead.

use embedded_hal::delay::DelayNs;

/// Busy-wait delay calibrated in spin-loop iterations per microsecond.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibratedDelay {
    loops_per_us: u32,
}

impl CalibratedDelay {
    /// Creates a delay that spins `loops_per_us` iterations per microsecond.
    ///
    /// A zero calibration is raised to one iteration so that delays never
    /// collapse to nothing.
    pub const fn new(loops_per_us: u32) -> Self {
        let loops_per_us = if loops_per_us == 0 { 1 } else { loops_per_us };
        Self { loops_per_us }
    }

    /// Derives the calibration from the core clock.
    ///
    /// # Arguments
    ///
    /// * `cpu_hz` - Core clock frequency in Hz.
    /// * `cycles_per_loop` - Clock cycles consumed by one spin iteration on
    ///   the target, including loop overhead.
    pub const fn from_clock(cpu_hz: u32, cycles_per_loop: u32) -> Self {
        let cycles_per_loop = if cycles_per_loop == 0 { 1 } else { cycles_per_loop };
        Self::new(cpu_hz / 1_000_000 / cycles_per_loop)
    }

    /// Spin-loop iterations per microsecond.
    pub const fn loops_per_us(&self) -> u32 {
        self.loops_per_us
    }

    /// Number of iterations needed to wait at least `ns` nanoseconds.
    pub const fn loops_for_ns(&self, ns: u32) -> u64 {
        (ns as u64 * self.loops_per_us as u64).div_ceil(1000)
    }
}

impl DelayNs for CalibratedDelay {
    fn delay_ns(&mut self, ns: u32) {
        for i in 0..self.loops_for_ns(ns) {
            // Keep the optimizer from removing the loop body.
            core::hint::black_box(i);
            core::hint::spin_loop();
        }
    }
}
