//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  timer wake ──▶ REPORTING ──[settle over, no tips]──▶ PREPARING_SLEEP ──▶ deep sleep
//!                     │                                       ▲
//!              [tips during settle]                  [quiet ≥ threshold]
//!                     ▼                                       │
//!  rain edge ──▶ RAIN_MONITORING ─────────────────────────────┘
//!                     │  ▲
//!                     └──┘ sample every RAIN_SAMPLE_INTERVAL,
//!                          full report at each countdown expiry
//! ```

use log::info;

use super::context::{FsmContext, ReportAction, SleepRequest};
use super::{StateDescriptor, StateId};
use crate::sensors::rain;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Reporting
        StateDescriptor {
            id: StateId::Reporting,
            name: "Reporting",
            on_enter: Some(reporting_enter),
            on_exit: None,
            on_update: reporting_update,
        },
        // Index 1 — RainMonitoring
        StateDescriptor {
            id: StateId::RainMonitoring,
            name: "RainMonitoring",
            on_enter: Some(monitoring_enter),
            on_exit: None,
            on_update: monitoring_update,
        },
        // Index 2 — PreparingSleep
        StateDescriptor {
            id: StateId::PreparingSleep,
            name: "PreparingSleep",
            on_enter: Some(preparing_sleep_enter),
            on_exit: None,
            on_update: preparing_sleep_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  REPORTING — the scheduled wake-up report
// ═══════════════════════════════════════════════════════════════════════════

fn reporting_enter(ctx: &mut FsmContext) {
    // One full telemetry report, then the rain rate accumulated since the
    // last report (normally zero — if it weren't, we'd have woken earlier
    // on the gauge edge).
    ctx.commands.push_report(ReportAction::Telemetry);

    let tips = ctx.take_session_tips();
    let rate = rain::rain_rate(
        tips,
        ctx.config.bucket_volume,
        ctx.config.rain_sample_interval_secs,
    );
    ctx.commands.push_report(ReportAction::RainRate(rate));

    info!("REPORTING: telemetry queued, {tips} dumps since last report");
}

fn reporting_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Linger for the settle delay so a rain onset right at the report
    // boundary is caught before committing to sleep.
    if ctx.ms_in_state() < u64::from(ctx.config.report_settle_ms) {
        return None;
    }

    if ctx.session_tips > 0 {
        info!(
            "REPORTING: {} dumps during settle, staying up to monitor",
            ctx.session_tips
        );
        return Some(StateId::RainMonitoring);
    }

    // Nothing fell.  The report just went out, so the next one is due a
    // full interval from now; re-zero the countdown stopwatch so the
    // settle delay does not erode the schedule.
    ctx.retained.seconds_until_next_report = ctx.config.report_interval_secs;
    let now = ctx.now_ms;
    ctx.timers.report.reset(now);
    Some(StateId::PreparingSleep)
}

// ═══════════════════════════════════════════════════════════════════════════
//  RAIN MONITORING — awake while rain is falling
// ═══════════════════════════════════════════════════════════════════════════

fn monitoring_enter(ctx: &mut FsmContext) {
    let now = ctx.now_ms;
    ctx.timers.rain_sample.reset(now);
    ctx.quiet_samples = 0;
    info!(
        "RAIN: monitoring started ({} dumps pending, next report in {}s)",
        ctx.session_tips, ctx.retained.seconds_until_next_report
    );
}

fn monitoring_update(ctx: &mut FsmContext) -> Option<StateId> {
    let now = ctx.now_ms;

    // Rain-rate sample boundary.  The rate is sent even when zero — a
    // quiet slice is what advances the stop-detection counter, and the
    // base station plots the trailing edge of the storm from it.
    let sample_ms = u64::from(ctx.config.rain_sample_interval_secs) * 1000;
    if ctx.timers.rain_sample.elapsed_ms(now) >= sample_ms {
        let tips = ctx.take_session_tips();
        let rate = rain::rain_rate(
            tips,
            ctx.config.bucket_volume,
            ctx.config.rain_sample_interval_secs,
        );
        ctx.commands.push_report(ReportAction::RainRate(rate));

        if tips == 0 {
            ctx.quiet_samples = ctx.quiet_samples.saturating_add(1);
            info!(
                "RAIN: quiet sample {}/{}",
                ctx.quiet_samples, ctx.config.quiet_samples_threshold
            );
        } else {
            ctx.quiet_samples = 0;
        }
        ctx.timers.rain_sample.reset(now);
    }

    // Full-report boundary: the countdown that would normally have been
    // served by a timer wake expires while we are already awake.
    if ctx.timers.report.elapsed_secs(now) >= u32::from(ctx.retained.seconds_until_next_report) {
        ctx.commands.push_report(ReportAction::Telemetry);
        ctx.retained.seconds_until_next_report = ctx.config.report_interval_secs;
        ctx.timers.report.reset(now);
        info!("RAIN: scheduled telemetry sent mid-storm, countdown restarted");
    }

    if ctx.quiet_samples >= ctx.config.quiet_samples_threshold {
        info!("RAIN: judged stopped");
        return Some(StateId::PreparingSleep);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PREPARING SLEEP — realign the schedule and hand over to the sleep path
// ═══════════════════════════════════════════════════════════════════════════

fn preparing_sleep_enter(ctx: &mut FsmContext) {
    // Time already burned against the report countdown while awake comes
    // out of the sleep duration, so the next report stays aligned to the
    // original schedule instead of restarting a full interval.
    let awake_secs = ctx
        .timers
        .report
        .elapsed_secs(ctx.now_ms)
        .min(u32::from(u16::MAX)) as u16;
    let remaining = ctx
        .retained
        .seconds_until_next_report
        .saturating_sub(awake_secs);
    ctx.retained.seconds_until_next_report = remaining;

    ctx.commands.sleep_request = Some(SleepRequest {
        duration_secs: u32::from(remaining),
        arm_edge_wake: true,
    });
    info!("SLEEP: requesting {remaining}s with edge wake armed");
}

fn preparing_sleep_update(_ctx: &mut FsmContext) -> Option<StateId> {
    // Terminal: the service acts on the queued sleep request; execution
    // never re-enters the state machine after that.
    None
}
