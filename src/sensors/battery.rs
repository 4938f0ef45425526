//! Battery voltage sensor (resistive divider into ADC1).
//!
//! The battery (nominally 12–14.5 V from the solar-charged LiFePO4 pack)
//! feeds a divider so the tap stays inside the ADC range.  Divider values
//! are the actual measured resistances, and a per-device calibration factor
//! corrects for ADC and resistor tolerance, calibrated against a known
//! input at normal battery voltage.
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

static SIM_BATTERY_ADC: AtomicU16 = AtomicU16::new(2048);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_adc(raw: u16) {
    SIM_BATTERY_ADC.store(raw, Ordering::Relaxed);
}

const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;

#[derive(Debug, Clone, Copy)]
pub struct BatteryReading {
    pub raw: u16,
    pub volts: f32,
}

pub struct BatterySensor {
    r1_ohms: f32,
    r2_ohms: f32,
    calibration: f32,
    _adc_gpio: i32,
}

impl BatterySensor {
    pub fn new(adc_gpio: i32, r1_ohms: f32, r2_ohms: f32, calibration: f32) -> Self {
        Self {
            r1_ohms,
            r2_ohms,
            calibration,
            _adc_gpio: adc_gpio,
        }
    }

    pub fn read(&self) -> BatteryReading {
        let raw = self.read_adc();
        BatteryReading {
            raw,
            volts: self.raw_to_volts(raw),
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(crate::pins::ADC1_CH_BATTERY)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_BATTERY_ADC.load(Ordering::Relaxed)
    }

    fn raw_to_volts(&self, raw: u16) -> f32 {
        let tap = f32::from(raw) / ADC_MAX * V_REF;
        tap * (self.r1_ohms + self.r2_ohms) / self.r2_ohms * self.calibration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor() -> BatterySensor {
        BatterySensor::new(33, 100_500.0, 22_040.0, 0.98)
    }

    #[test]
    fn zero_raw_is_zero_volts() {
        assert_eq!(sensor().raw_to_volts(0), 0.0);
    }

    #[test]
    fn full_scale_matches_divider_ratio() {
        let s = sensor();
        let expected = 3.3 * (100_500.0 + 22_040.0) / 22_040.0 * 0.98;
        assert!((s.raw_to_volts(4095) - expected).abs() < 0.001);
    }

    #[test]
    fn mid_pack_voltage_lands_in_lifepo4_range() {
        // ~2390 counts ≈ 13.2 V with the measured divider values.
        let v = sensor().raw_to_volts(2390);
        assert!((12.5..14.0).contains(&v), "got {v}");
    }
}
