//! Sensor subsystem — individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and produces a [`SensorSnapshot`] each
//! tick that gets written into the scheduler context.  The rain gauge is
//! the exception: its counter is ISR-owned and RTC-resident, so it is
//! sampled through [`rain`] directly rather than through the hub.

pub mod battery;
pub mod environment;
pub mod rain;
pub mod solar;
pub mod water_level;

use embedded_hal::i2c::I2c;
use log::warn;

use crate::fsm::context::SensorSnapshot;
use battery::BatterySensor;
use environment::{Bme280, EnvReading};
use solar::SolarSensor;
use water_level::WaterLevelSensor;

/// Aggregates all sensor drivers and produces a unified snapshot.
pub struct SensorHub<I2C> {
    pub battery: BatterySensor,
    pub water_level: WaterLevelSensor,
    pub solar: SolarSensor,
    pub environment: Bme280<I2C>,
    /// Last good environment reading, reused when an I2C read glitches —
    /// a flaky sensor must not stall the report cycle.
    last_env: EnvReading,
}

impl<I2C: I2c> SensorHub<I2C> {
    /// Construct a new hub.  Pass in pre-built drivers (built in main
    /// where peripheral ownership is established).
    pub fn new(
        battery: BatterySensor,
        water_level: WaterLevelSensor,
        solar: SolarSensor,
        environment: Bme280<I2C>,
    ) -> Self {
        Self {
            battery,
            water_level,
            solar,
            environment,
            last_env: EnvReading::default(),
        }
    }

    /// Bring up the sensors that need it.  An environment-sensor failure is
    /// logged and degrades its fields to zero; the analog channels and the
    /// rain gauge still work.
    pub fn init(&mut self) {
        if let Err(e) = self.environment.init() {
            warn!("sensors: BME280 init failed ({e}), env fields will be stale");
        }
    }

    /// Read every sensor and return a unified snapshot.
    pub fn read_all(&mut self) -> SensorSnapshot {
        let battery = self.battery.read();
        let water = self.water_level.read();
        let solar = self.solar.read();

        match self.environment.read() {
            Ok(env) => self.last_env = env,
            Err(e) => warn!("sensors: BME280 read failed ({e}), keeping last value"),
        }

        SensorSnapshot {
            battery_volts: battery.volts,
            water_level_cm: water.depth_cm,
            solar_pct: solar.percent,
            temperature_f: self.last_env.temperature_f,
            pressure_inhg: self.last_env.pressure_inhg,
            humidity_pct: self.last_env.humidity_pct,
        }
    }
}
