//! Whole-session scenarios: wake classification through FSM ticks to the
//! sleep request, against recording mocks.

use crate::mock_hw::{MockHardware, MockRadio, RecordingSink};
use wxnode::app::service::AppService;
use wxnode::config::SystemConfig;
use wxnode::fsm::StateId;
use wxnode::retained::RetainedState;
use wxnode::sensors::rain::rain_rate;
use wxnode::wake::{self, WakeSources};

const TICK_MS: u64 = 250;
const SAMPLE_MS: u64 = 60_000;

/// One simulated awake session with a scriptable clock and gauge.
struct Session {
    app: AppService,
    hw: MockHardware,
    radio: MockRadio,
    sink: RecordingSink,
    now_ms: u64,
}

impl Session {
    fn wake(sources: WakeSources, mut retained: RetainedState, wallclock_secs: u32) -> Self {
        let config = SystemConfig::default();
        let reason = wake::classify(sources, &mut retained, wallclock_secs, &config);

        let mut s = Self {
            app: AppService::new(config, retained, reason, 0),
            hw: MockHardware::new(),
            radio: MockRadio::new(),
            sink: RecordingSink::new(),
            now_ms: 0,
        };
        s.app.start(&mut s.hw, &mut s.radio, &mut s.sink);
        s
    }

    fn timer_wake() -> Self {
        Self::wake(
            WakeSources { timer: true, sensor_edge: false },
            RetainedState {
                rain_event_count: 0,
                seconds_until_next_report: 0, // fully elapsed, as a timer wake implies
                sleep_entry_timestamp: 1_000,
            },
            1_900,
        )
    }

    /// Edge wake `slept_secs` into a 900 s sleep.
    fn edge_wake(slept_secs: u32) -> Self {
        Self::wake(
            WakeSources { timer: false, sensor_edge: true },
            RetainedState {
                rain_event_count: 0,
                seconds_until_next_report: 900,
                sleep_entry_timestamp: 100_000,
            },
            100_000 + slept_secs,
        )
    }

    /// Advance the session clock by `ms`, ticking at the firmware cadence.
    fn run_for(&mut self, ms: u64) {
        let target = self.now_ms + ms;
        while self.now_ms < target {
            self.now_ms += TICK_MS;
            self.app
                .tick(self.now_ms, &mut self.hw, &mut self.radio, &mut self.sink);
        }
    }
}

// ── Timer-deadline sessions ───────────────────────────────────

#[test]
fn dry_timer_wake_reports_once_and_sleeps_a_full_interval() {
    let mut s = Session::timer_wake();

    // The wake-up pair goes out immediately: one full telemetry report and
    // one zero rain rate.
    assert_eq!(s.app.state(), StateId::Reporting);
    assert_eq!(s.radio.telemetry_count(), 1);
    assert_eq!(s.radio.rain_rates(), vec![0.0]);

    // Ride out the settle delay with no rain.
    s.run_for(2_500);
    let req = s.app.sleep_request().expect("sleep requested");
    assert_eq!(req.duration_secs, 900);
    assert!(req.arm_edge_wake);

    // Exactly the one report pair — nothing was double-sent.
    assert_eq!(s.radio.telemetry_count(), 1);
    assert_eq!(s.radio.rain_rates().len(), 1);

    let snapshot = s.app.sleep_snapshot(42_000);
    assert_eq!(snapshot.rain_event_count, 0);
    assert_eq!(snapshot.seconds_until_next_report, 900);
    assert_eq!(snapshot.sleep_entry_timestamp, 42_000);
}

#[test]
fn cold_boot_behaves_like_a_timer_wake() {
    let mut s = Session::wake(
        WakeSources::default(), // power-on: neither source fired
        RetainedState::cold_boot(900),
        0,
    );
    assert_eq!(s.app.state(), StateId::Reporting);
    assert_eq!(s.radio.telemetry_count(), 1);

    s.run_for(2_500);
    assert_eq!(s.app.sleep_request().unwrap().duration_secs, 900);
}

#[test]
fn rain_during_settle_keeps_the_node_awake() {
    let mut s = Session::timer_wake();

    s.hw.tip(1); // bucket dump while settling
    s.run_for(2_500);
    assert_eq!(s.app.state(), StateId::RainMonitoring);
    assert!(s.app.sleep_request().is_none());
}

// ── Sensor-edge sessions ──────────────────────────────────────

#[test]
fn edge_wake_monitors_without_an_upfront_report() {
    let s = Session::edge_wake(0);
    assert_eq!(s.app.state(), StateId::RainMonitoring);
    assert_eq!(s.radio.telemetry_count(), 0);
    assert!(s.radio.rain_rates().is_empty());
}

#[test]
fn edge_wake_counts_the_waking_dump_in_the_first_sample() {
    let mut s = Session::edge_wake(0);

    s.run_for(SAMPLE_MS);
    // Only the dump that woke us fell in the first minute.
    let expected = rain_rate(1, 100.0, 60);
    assert_eq!(s.radio.rain_rates(), vec![expected]);
}

#[test]
fn quiet_gauge_puts_the_node_back_to_sleep_realigned() {
    let mut s = Session::edge_wake(0);

    // The waking dump is the only one: sample 1 sees it, samples 2-4 are
    // quiet, and the third quiet sample ends monitoring at t=240 s.
    s.run_for(4 * SAMPLE_MS);

    let req = s.app.sleep_request().expect("sleep requested");
    assert_eq!(req.duration_secs, 900 - 240);
    assert!(req.arm_edge_wake);

    // Four rain-rate frames went out (zero rates included), no telemetry.
    assert_eq!(s.radio.rain_rates().len(), 4);
    assert_eq!(s.radio.telemetry_count(), 0);
    assert_eq!(s.app.sleep_snapshot(0).seconds_until_next_report, 660);
}

#[test]
fn report_countdown_expiring_mid_storm_emits_telemetry() {
    // Wake 840 s into the 900 s sleep: only 60 s of countdown left.
    let mut s = Session::edge_wake(840);

    // Rain through the first two samples.
    s.hw.tip(2);
    s.run_for(SAMPLE_MS);
    // The countdown expired during the first sample window.
    assert_eq!(s.radio.telemetry_count(), 1);
    assert_eq!(s.app.state(), StateId::RainMonitoring);

    s.hw.tip(1);
    s.run_for(SAMPLE_MS);
    // Then three quiet samples end the session at t=300 s.
    s.run_for(3 * SAMPLE_MS);

    let req = s.app.sleep_request().expect("sleep requested");
    // Countdown restarted at t=60 s; 240 s of it burned by t=300 s.
    assert_eq!(req.duration_secs, 900 - 240);
}

#[test]
fn fully_overdue_countdown_reports_immediately_while_monitoring() {
    // Slept longer than the whole budget: the report is due now even
    // though we woke for rain.
    let mut s = Session::edge_wake(2_000);
    assert_eq!(s.app.sleep_snapshot(0).seconds_until_next_report, 0);

    s.run_for(TICK_MS);
    assert_eq!(s.radio.telemetry_count(), 1);
    assert_eq!(s.app.state(), StateId::RainMonitoring);
}

#[test]
fn fresh_rain_during_monitoring_extends_the_session() {
    let mut s = Session::edge_wake(0);

    // Two quiet samples...
    s.run_for(SAMPLE_MS);
    s.run_for(SAMPLE_MS);
    s.run_for(SAMPLE_MS);
    assert!(s.app.sleep_request().is_none(), "two quiet samples must not sleep");

    // ...rain returns, resetting the quiet streak...
    s.hw.tip(3);
    s.run_for(SAMPLE_MS);
    assert!(s.app.sleep_request().is_none());

    // ...and only three further quiet samples end it.
    s.run_for(3 * SAMPLE_MS);
    assert!(s.app.sleep_request().is_some());
}

#[test]
fn session_events_tell_the_story_in_order() {
    let mut s = Session::timer_wake();
    s.run_for(2_500);

    assert!(s.sink.events[0].starts_with("Started"));
    assert!(
        s.sink.events.iter().any(|e| e.starts_with("StateChanged")),
        "the transition to PreparingSleep should be surfaced: {:?}",
        s.sink.events
    );
}
