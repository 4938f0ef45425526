//! Tipping-bucket rain gauge driver.
//!
//! The gauge closes a reed switch once per bucket dump.  An ISR increments
//! an atomic counter on each edge; the scheduler samples and resets it at
//! its own cadence.  The ISR is the only writer and the scheduler the only
//! reader/resetter, so the counter needs no locking — an edge landing
//! between a `swap` and the ISR's `fetch_add` is simply carried into the
//! next sample.
//!
//! The counter lives in the RTC slow-memory section so pending dumps
//! survive deep sleep (the ISR writes straight into retained memory, and
//! whatever was unreported at sleep entry is still there on wake).

use core::sync::atomic::{AtomicU16, Ordering};

/// Bucket dumps since the last `take_tips()`.
/// `static` because ISR callbacks in ESP-IDF cannot capture closures;
/// RTC-resident so the count survives deep sleep.
#[cfg_attr(target_os = "espidf", unsafe(link_section = ".rtc.data"))]
static TIP_COUNT: AtomicU16 = AtomicU16::new(0);

/// Called from the GPIO ISR on each reed-switch edge.
/// Increment by exactly one; no other work happens in interrupt context.
pub fn rain_tip_isr_handler() {
    TIP_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// Atomically read and reset the pending dump count.
pub fn take_tips() -> u16 {
    TIP_COUNT.swap(0, Ordering::Relaxed)
}

/// Pending dump count without consuming it.
pub fn pending_tips() -> u16 {
    TIP_COUNT.load(Ordering::Relaxed)
}

/// Add unreported dumps back into the retained counter (used when entering
/// sleep with tips that were drained into the session but never sent).
pub fn credit_tips(count: u16) {
    if count > 0 {
        TIP_COUNT.fetch_add(count, Ordering::Relaxed);
    }
}

/// Clear the counter outright.  Only legitimate on a cold boot, when the
/// RTC domain holds garbage.
pub fn reset_tips() {
    TIP_COUNT.store(0, Ordering::Relaxed);
}

/// Serialises tests that manipulate the process-wide counter (the unit
/// tests here and in `adapters::rtc_store` share the same static).
#[cfg(test)]
pub static COUNTER_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Convert a dump count for one sampling window into a rain rate:
/// `dumps × volume-per-dump ÷ window-seconds`.
pub fn rain_rate(dump_count: u16, bucket_volume: f32, sample_interval_secs: u16) -> f32 {
    f32::from(dump_count) * bucket_volume / f32::from(sample_interval_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_exact_for_reference_inputs() {
        assert_eq!(rain_rate(3, 100.0, 60), 5.0);
    }

    #[test]
    fn zero_dumps_is_zero_rate() {
        assert_eq!(rain_rate(0, 100.0, 60), 0.0);
    }

    #[test]
    fn rate_scales_linearly_with_dumps() {
        let one = rain_rate(1, 100.0, 60);
        let four = rain_rate(4, 100.0, 60);
        assert_eq!(four, one * 4.0);
    }

    // The counter is a process-wide static, so every operation on it is
    // exercised within a single test, serialised against the rtc_store
    // tests that touch the same static.
    #[test]
    fn counter_take_credit_reset_cycle() {
        let _guard = COUNTER_TEST_LOCK.lock().unwrap();
        reset_tips();
        assert_eq!(pending_tips(), 0);

        rain_tip_isr_handler();
        rain_tip_isr_handler();
        rain_tip_isr_handler();
        assert_eq!(pending_tips(), 3);

        assert_eq!(take_tips(), 3);
        assert_eq!(pending_tips(), 0);
        assert_eq!(take_tips(), 0);

        credit_tips(2);
        assert_eq!(pending_tips(), 2);
        reset_tips();
        assert_eq!(pending_tips(), 0);
    }
}
