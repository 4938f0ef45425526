//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the FSM and its context for one awake session.  It
//! exposes a clean, hardware-agnostic API: construct from the classified
//! wake reason, `tick` until a sleep request appears, then snapshot the
//! retained state for persistence.  All I/O flows through port traits
//! injected at call sites, making the entire scheduling core testable with
//! mock adapters.
//!
//! ```text
//!   SensorPort ──▶ ┌───────────────────────┐ ──▶ TelemetryPort
//!                  │      AppService        │
//!                  │   wake · FSM · reports │ ──▶ EventSink
//!                  └───────────────────────┘
//! ```

use log::info;

use crate::config::SystemConfig;
use crate::fsm::context::{FsmContext, ReportAction, SleepRequest};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::retained::RetainedState;
use crate::wake::WakeReason;

use super::events::AppEvent;
use super::ports::{EventSink, ReportField, SensorPort, TelemetryPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// Orchestrates one awake session of the scheduler.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
}

impl AppService {
    /// Construct the service for a freshly classified wake.
    ///
    /// The starting state follows the wake reason: a timer deadline opens
    /// with the scheduled report, a rain edge goes straight to monitoring
    /// without one.  Does **not** run the initial state — call [`start`]
    /// next.
    ///
    /// [`start`]: Self::start
    pub fn new(
        config: SystemConfig,
        retained: RetainedState,
        wake_reason: WakeReason,
        now_ms: u64,
    ) -> Self {
        let initial = match wake_reason {
            WakeReason::TimerDeadline => StateId::Reporting,
            WakeReason::SensorEdge => StateId::RainMonitoring,
        };
        let mut ctx = FsmContext::new(config, retained, wake_reason, now_ms);

        // Dumps recorded before this wake (retained across sleep, plus the
        // edge that woke us) seed the session accumulator; the retained
        // copy is now represented there.
        ctx.session_tips = core::mem::take(&mut ctx.retained.rain_event_count);

        Self {
            fsm: Fsm::new(build_state_table(), initial),
            ctx,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the initial state's entry action and read the first snapshot.
    pub fn start(&mut self, hw: &mut impl SensorPort, radio: &mut impl TelemetryPort, sink: &mut impl EventSink) {
        self.ctx.sensors = hw.read_all();
        self.ctx.session_tips = self
            .ctx
            .session_tips
            .saturating_add(hw.take_rain_tips());

        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started {
            reason: self.ctx.wake_reason,
            state: self.fsm.current_state(),
        });
        self.apply_reports(radio, sink);
        info!("session started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full scheduler cycle: read sensors → drain the gauge →
    /// FSM tick → transmit whatever became due, in order.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut impl SensorPort,
        radio: &mut impl TelemetryPort,
        sink: &mut impl EventSink,
    ) {
        let prev_state = self.fsm.current_state();
        self.ctx.now_ms = now_ms;

        // 1. Fresh sensor snapshot and any new bucket dumps.
        self.ctx.sensors = hw.read_all();
        self.ctx.session_tips = self
            .ctx
            .session_tips
            .saturating_add(hw.take_rain_tips());

        // 2. FSM tick (pure state logic; outputs land in ctx.commands).
        self.fsm.tick(&mut self.ctx);

        // 3. Transmit queued reports in the order they became due.
        self.apply_reports(radio, sink);

        // 4. Surface the transition, if any.
        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }
    }

    // ── Sleep handover ────────────────────────────────────────

    /// The pending sleep request, if the machine has decided to sleep.
    /// Leaves the request in place: the composition root reads it once and
    /// never comes back.
    pub fn sleep_request(&self) -> Option<SleepRequest> {
        self.ctx.commands.sleep_request
    }

    /// The retained-state image to persist before sleeping: the realigned
    /// report countdown, any dumps that arrived after the last sample, and
    /// the caller-supplied wall-clock stamp.
    pub fn sleep_snapshot(&self, wallclock_secs: u32) -> RetainedState {
        RetainedState {
            rain_event_count: self.ctx.session_tips,
            seconds_until_next_report: self.ctx.retained.seconds_until_next_report,
            sleep_entry_timestamp: wallclock_secs,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Awake-session polling cadence from the live configuration.
    pub fn tick_interval_ms(&self) -> u32 {
        self.ctx.config.tick_interval_ms
    }

    // ── Internal ──────────────────────────────────────────────

    /// Drain `ctx.commands.reports` into the radio, preserving order.
    fn apply_reports(&mut self, radio: &mut impl TelemetryPort, sink: &mut impl EventSink) {
        for action in self.ctx.commands.reports.iter().copied() {
            match action {
                ReportAction::Telemetry => {
                    let snap = self.ctx.sensors;
                    for field in ReportField::ALL {
                        let value = match field {
                            ReportField::BatteryVoltage => snap.battery_volts,
                            ReportField::WaterLevel => snap.water_level_cm,
                            ReportField::SolarIrradiance => snap.solar_pct,
                            ReportField::Temperature => snap.temperature_f,
                            ReportField::Pressure => snap.pressure_inhg,
                            ReportField::Humidity => snap.humidity_pct,
                        };
                        radio.send_report(field, value);
                    }
                    sink.emit(&AppEvent::Telemetry(snap));
                }
                ReportAction::RainRate(rate) => {
                    radio.send_rain_rate(rate);
                    sink.emit(&AppEvent::RainRate(rate));
                }
            }
        }
        self.ctx.commands.reports.clear();
    }
}
