//! Canal water-level sensor (analog pressure transducer into ADC1).
//!
//! The transducer sits at the bottom of the irrigation canal and outputs a
//! voltage proportional to the head of water above it.  The reported value
//! is depth in centimetres over the sensor's rated span.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static AtomicU16 for injection.

use core::sync::atomic::AtomicU16;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

static SIM_WATER_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_water_adc(raw: u16) {
    SIM_WATER_ADC.store(raw, Ordering::Relaxed);
}

const ADC_MAX: f32 = 4095.0;
/// Rated measurement span of the transducer.
const FULL_SCALE_CM: f32 = 100.0;

#[derive(Debug, Clone, Copy)]
pub struct WaterLevelReading {
    pub raw: u16,
    pub depth_cm: f32,
}

pub struct WaterLevelSensor {
    _adc_gpio: i32,
}

impl WaterLevelSensor {
    pub fn new(adc_gpio: i32) -> Self {
        Self { _adc_gpio: adc_gpio }
    }

    pub fn read(&self) -> WaterLevelReading {
        let raw = self.read_adc();
        WaterLevelReading {
            raw,
            depth_cm: f32::from(raw) / ADC_MAX * FULL_SCALE_CM,
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(crate::pins::ADC1_CH_WATER_LEVEL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_WATER_ADC.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_spans_the_rated_range() {
        let s = WaterLevelSensor::new(35);
        sim_set_water_adc(0);
        assert_eq!(s.read().depth_cm, 0.0);
        sim_set_water_adc(4095);
        assert!((s.read().depth_cm - 100.0).abs() < 0.01);
    }
}
