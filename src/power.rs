//! Deep-sleep controller.
//!
//! Owns the two wake sources (RTC timer deadline, rain-gauge EXT0 edge)
//! and the one-way transition into deep sleep.  Entering sleep ends this
//! run of the program: execution resumes at the top of `main`, never at
//! the call site, which is why [`PowerManager::enter_deep_sleep`] returns
//! `!` — the type system keeps any code after it unreachable.
//!
//! On the host the same API logs what it would have armed and exits the
//! process, preserving the never-returns contract for simulation runs.

use embedded_hal::digital::PinState;
use log::info;

use crate::wake::WakeSources;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU8, Ordering};

/// Simulated wake cause for host runs: bit 0 = timer, bit 1 = edge.
#[cfg(not(target_os = "espidf"))]
static SIM_WAKE_SOURCES: AtomicU8 = AtomicU8::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_wake_sources(timer: bool, sensor_edge: bool) {
    SIM_WAKE_SOURCES.store(
        u8::from(timer) | (u8::from(sensor_edge) << 1),
        Ordering::Relaxed,
    );
}

pub struct PowerManager {
    /// RTC-capable GPIO the rain gauge is wired to.
    rain_gauge_pin: i32,
    /// Pin level that wakes the device (board-revision dependent).
    wake_level: PinState,
}

impl PowerManager {
    pub fn new(rain_gauge_pin: i32, wake_high: bool) -> Self {
        Self {
            rain_gauge_pin,
            wake_level: if wake_high { PinState::High } else { PinState::Low },
        }
    }

    /// Which armed wake source(s) ended the last sleep.  A cold power-on
    /// reports neither.
    #[cfg(target_os = "espidf")]
    pub fn wake_sources(&self) -> WakeSources {
        // SAFETY: esp_sleep_get_wakeup_cause reads a boot-time status
        // register; no preconditions.
        let cause = unsafe { esp_sleep_get_wakeup_cause() };
        WakeSources {
            timer: cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER,
            sensor_edge: cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT0,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn wake_sources(&self) -> WakeSources {
        let bits = SIM_WAKE_SOURCES.load(Ordering::Relaxed);
        WakeSources {
            timer: bits & 0b01 != 0,
            sensor_edge: bits & 0b10 != 0,
        }
    }

    /// Arm the wake sources and commit to deep sleep.
    ///
    /// `duration_secs == 0` means the schedule is already overdue: the
    /// timer source is armed at zero and the device re-wakes immediately,
    /// which is the defined behaviour rather than an error.
    #[cfg(target_os = "espidf")]
    pub fn enter_deep_sleep(&self, duration_secs: u32, arm_edge_wake: bool) -> ! {
        info!(
            "power: deep sleep for {}s (edge wake: {})",
            duration_secs, arm_edge_wake
        );

        // SAFETY: the esp_sleep_* calls only latch wake-source config;
        // esp_deep_sleep_start powers down the core and does not return.
        unsafe {
            esp_sleep_enable_timer_wakeup(u64::from(duration_secs) * 1_000_000);
            if arm_edge_wake {
                let level = match self.wake_level {
                    PinState::High => 1,
                    PinState::Low => 0,
                };
                esp_sleep_enable_ext0_wakeup(self.rain_gauge_pin, level);
            }
            esp_deep_sleep_start();
        }
        unreachable!("esp_deep_sleep_start does not return");
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn enter_deep_sleep(&self, duration_secs: u32, arm_edge_wake: bool) -> ! {
        info!(
            "power(sim): would deep sleep for {}s (edge wake: {}, pin {}, level {:?})",
            duration_secs, arm_edge_wake, self.rain_gauge_pin, self.wake_level
        );
        std::process::exit(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_wake_sources_roundtrip() {
        sim_set_wake_sources(false, false);
        let pm = PowerManager::new(32, true);
        assert_eq!(pm.wake_sources(), WakeSources::default());

        sim_set_wake_sources(true, false);
        assert!(pm.wake_sources().timer);
        assert!(!pm.wake_sources().sensor_edge);

        sim_set_wake_sources(true, true);
        let both = pm.wake_sources();
        assert!(both.timer && both.sensor_edge);
    }

    #[test]
    fn wake_level_follows_config() {
        assert_eq!(PowerManager::new(32, true).wake_level, PinState::High);
        assert_eq!(PowerManager::new(32, false).wake_level, PinState::Low);
    }
}
