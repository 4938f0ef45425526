//! ESP32 time adapter.
//!
//! Two clocks with two jobs:
//!
//! - **Monotonic uptime** (`uptime_ms`) paces the session stopwatches.  It
//!   restarts at every boot, which is fine — the stopwatches never cross a
//!   sleep.
//! - **Wall clock** (`wallclock_secs`) stamps sleep entry so the next wake
//!   can compute how long the device slept.  The RTC keeps it ticking
//!   through deep sleep.  The epoch is whatever it is — the device never
//!   syncs NTP, and only deltas matter.
//!
//! On the host both clocks derive from `std::time::Instant` for testing
//! and simulation.

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time reads the free-running system timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Wall-clock seconds from the RTC.  Survives deep sleep, not power
    /// loss; unsynced epoch.
    #[cfg(target_os = "espidf")]
    pub fn wallclock_secs(&self) -> u32 {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval { tv_sec: 0, tv_usec: 0 };
        // SAFETY: gettimeofday writes into the provided struct; a null
        // timezone is the documented "don't care" argument.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return 0;
        }
        tv.tv_sec as u32
    }

    /// Wall-clock seconds.  On the host this is uptime-based, which is
    /// enough for simulation (the epoch is arbitrary on hardware too).
    #[cfg(not(target_os = "espidf"))]
    pub fn wallclock_secs(&self) -> u32 {
        (self.start.elapsed().as_secs()) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_is_monotonic() {
        let t = Esp32TimeAdapter::new();
        let a = t.uptime_ms();
        let b = t.uptime_ms();
        assert!(b >= a);
    }
}
