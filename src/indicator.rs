//! Status output driven by the sensor health.

use embedded_hal::digital::OutputPin;

use crate::frame::Health;

/// Something that can display the current [`Health`].
pub trait Indicator {
    type Error;

    fn show(&mut self, health: Health) -> Result<(), Self::Error>;
}

/// Green/red LED pair: green while operational, red on error.
pub struct DualLed<OK, ERR> {
    ok: OK,
    err: ERR,
}

impl<OK, ERR, E> DualLed<OK, ERR>
where
    OK: OutputPin<Error = E>,
    ERR: OutputPin<Error = E>,
{
    pub fn new(ok: OK, err: ERR) -> Self {
        DualLed { ok, err }
    }

    /// Gives back both pins.
    pub fn release(self) -> (OK, ERR) {
        (self.ok, self.err)
    }
}

impl<OK, ERR, E> Indicator for DualLed<OK, ERR>
where
    OK: OutputPin<Error = E>,
    ERR: OutputPin<Error = E>,
{
    type Error = E;

    fn show(&mut self, health: Health) -> Result<(), E> {
        match health {
            Health::Operational => {
                self.ok.set_high()?;
                self.err.set_low()
            }
            Health::Error => {
                self.err.set_high()?;
                self.ok.set_low()
            }
        }
    }
}
