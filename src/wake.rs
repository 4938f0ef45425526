//! Wake classification.
//!
//! Every run of the firmware begins with exactly one question: why are we
//! awake?  The two armed wake sources (RTC timer deadline, rain-gauge edge)
//! give two answers with very different consequences — a timer wake means
//! "report now", an edge wake means "it just started raining".  The
//! classifier answers it once per boot and reconciles the retained report
//! countdown against how long the device actually slept.

use log::info;

use crate::config::SystemConfig;
use crate::retained::RetainedState;

/// Raw wake-source flags as reported by the power-management hardware.
/// Both can be set when an edge lands in the same instant as the timer
/// match; a cold power-on sets neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WakeSources {
    pub timer: bool,
    pub sensor_edge: bool,
}

/// The classified cause of the current wake, immutable for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Scheduled report deadline (or a first boot with no sleep record,
    /// which behaves identically).
    TimerDeadline,
    /// The rain gauge tipped while we slept.
    SensorEdge,
}

/// Classify the wake and fold the elapsed sleep into the retained state.
///
/// * Edge wake — the device slept `now - sleep_entry_timestamp` seconds of
///   its report countdown; subtract them (clamped at zero: an overdue
///   report is simply due now).  The dump that woke us predates ISR
///   attachment and was never counted, so it is credited here.
/// * Timer wake / power-on — the countdown has fully elapsed by
///   definition; restart it at the configured interval.
///
/// Precedence: the edge wins a simultaneous wake, because missing a rain
/// onset costs more than a slightly early report.
pub fn classify(
    sources: WakeSources,
    retained: &mut RetainedState,
    now_secs: u32,
    config: &SystemConfig,
) -> WakeReason {
    if sources.sensor_edge {
        let seconds_asleep = now_secs.saturating_sub(retained.sleep_entry_timestamp);
        let clamped = seconds_asleep.min(u32::from(u16::MAX)) as u16;
        retained.seconds_until_next_report =
            retained.seconds_until_next_report.saturating_sub(clamped);
        retained.rain_event_count = retained.rain_event_count.saturating_add(1);

        info!(
            "wake: rain edge after {}s asleep, {}s of countdown left",
            seconds_asleep, retained.seconds_until_next_report
        );
        WakeReason::SensorEdge
    } else {
        retained.seconds_until_next_report = config.report_interval_secs;
        info!(
            "wake: {} (countdown restarted at {}s)",
            if sources.timer { "timer deadline" } else { "power-on" },
            config.report_interval_secs
        );
        WakeReason::TimerDeadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retained(budget: u16, slept_at: u32) -> RetainedState {
        RetainedState {
            rain_event_count: 0,
            seconds_until_next_report: budget,
            sleep_entry_timestamp: slept_at,
        }
    }

    #[test]
    fn timer_wake_restarts_the_countdown() {
        let config = SystemConfig::default();
        let mut state = retained(37, 1_000);
        let reason = classify(
            WakeSources { timer: true, sensor_edge: false },
            &mut state,
            1_900,
            &config,
        );
        assert_eq!(reason, WakeReason::TimerDeadline);
        assert_eq!(state.seconds_until_next_report, 900);
    }

    #[test]
    fn power_on_is_treated_as_a_timer_wake() {
        let config = SystemConfig::default();
        let mut state = RetainedState::cold_boot(config.report_interval_secs);
        let reason = classify(WakeSources::default(), &mut state, 0, &config);
        assert_eq!(reason, WakeReason::TimerDeadline);
        assert_eq!(state.seconds_until_next_report, 900);
    }

    #[test]
    fn edge_wake_subtracts_the_sleep_from_the_countdown() {
        let config = SystemConfig::default();
        let mut state = retained(900, 5_000);
        let reason = classify(
            WakeSources { timer: false, sensor_edge: true },
            &mut state,
            5_350, // slept 350 s
            &config,
        );
        assert_eq!(reason, WakeReason::SensorEdge);
        assert_eq!(state.seconds_until_next_report, 550);
    }

    #[test]
    fn edge_wake_credits_the_waking_dump() {
        let config = SystemConfig::default();
        let mut state = retained(900, 0);
        classify(
            WakeSources { timer: false, sensor_edge: true },
            &mut state,
            10,
            &config,
        );
        assert_eq!(state.rain_event_count, 1);
    }

    #[test]
    fn countdown_never_goes_negative() {
        let config = SystemConfig::default();
        // Slept far longer than the remaining budget.
        for (budget, slept) in [(900u16, 901u32), (10, 100_000), (0, 5)] {
            let mut state = retained(budget, 0);
            classify(
                WakeSources { timer: false, sensor_edge: true },
                &mut state,
                slept,
                &config,
            );
            assert_eq!(state.seconds_until_next_report, 0, "budget {budget} slept {slept}");
        }
    }

    #[test]
    fn simultaneous_causes_resolve_to_the_edge() {
        let config = SystemConfig::default();
        let mut state = retained(900, 0);
        let reason = classify(
            WakeSources { timer: true, sensor_edge: true },
            &mut state,
            900,
            &config,
        );
        assert_eq!(reason, WakeReason::SensorEdge);
        // And the edge semantics applied: countdown reconciled, not reset.
        assert_eq!(state.seconds_until_next_report, 0);
    }

    #[test]
    fn clock_stepping_backwards_reads_as_no_sleep() {
        let config = SystemConfig::default();
        let mut state = retained(600, 10_000);
        classify(
            WakeSources { timer: false, sensor_edge: true },
            &mut state,
            9_000,
            &config,
        );
        assert_eq!(state.seconds_until_next_report, 600);
    }
}
