//! Solar irradiance sensor (photodiode amplifier into ADC1).
//!
//! Reported as percent of the amplifier's full-scale output.  Mostly useful
//! for spotting a panel buried in snow or a failing charge controller, so
//! relative units are enough.

use core::sync::atomic::AtomicU16;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

static SIM_SOLAR_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_solar_adc(raw: u16) {
    SIM_SOLAR_ADC.store(raw, Ordering::Relaxed);
}

const ADC_MAX: f32 = 4095.0;

#[derive(Debug, Clone, Copy)]
pub struct SolarReading {
    pub raw: u16,
    pub percent: f32,
}

pub struct SolarSensor {
    _adc_gpio: i32,
}

impl SolarSensor {
    pub fn new(adc_gpio: i32) -> Self {
        Self { _adc_gpio: adc_gpio }
    }

    pub fn read(&self) -> SolarReading {
        let raw = self.read_adc();
        SolarReading {
            raw,
            percent: f32::from(raw) / ADC_MAX * 100.0,
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(crate::pins::ADC1_CH_SOLAR)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_SOLAR_ADC.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_tracks_raw() {
        let s = SolarSensor::new(34);
        sim_set_solar_adc(2048);
        let pct = s.read().percent;
        assert!((pct - 50.0).abs() < 0.1, "got {pct}");
    }
}
