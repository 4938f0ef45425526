//! Hardware adapter — bridges real peripherals to the domain port traits.
//!
//! Owns the [`SensorHub`] and exposes it (plus the ISR-fed rain-gauge
//! counter) through [`SensorPort`].  This is the only module besides the
//! drivers that touches actual hardware; on non-espidf targets the
//! underlying drivers use cfg-gated simulation stubs.

use embedded_hal::i2c::I2c;

use crate::app::ports::SensorPort;
use crate::fsm::context::SensorSnapshot;
use crate::sensors::{SensorHub, rain};

/// Concrete adapter that combines all sensors behind the port trait.
pub struct HardwareAdapter<I2C> {
    hub: SensorHub<I2C>,
}

impl<I2C: I2c> HardwareAdapter<I2C> {
    pub fn new(hub: SensorHub<I2C>) -> Self {
        Self { hub }
    }

    /// One-shot sensor bring-up (BME280 configuration).
    pub fn init(&mut self) {
        self.hub.init();
    }
}

impl<I2C: I2c> SensorPort for HardwareAdapter<I2C> {
    fn read_all(&mut self) -> SensorSnapshot {
        self.hub.read_all()
    }

    fn take_rain_tips(&mut self) -> u16 {
        rain::take_tips()
    }
}
