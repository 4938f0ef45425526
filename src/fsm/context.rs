//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the latest sensor snapshot, the sleep-surviving scheduler
//! state, the session stopwatches, and the outbound command queue the
//! service drains after each tick.  Think of it as the "blackboard" in a
//! blackboard architecture.

use log::warn;

use crate::config::SystemConfig;
use crate::retained::RetainedState;
use crate::timers::SessionTimers;
use crate::wake::WakeReason;

// ---------------------------------------------------------------------------
// Sensor snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// A point-in-time snapshot of every reportable sensor value, already in
/// the units the base station expects.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorSnapshot {
    /// Battery pack voltage (V).
    pub battery_volts: f32,
    /// Canal water depth (cm).
    pub water_level_cm: f32,
    /// Solar irradiance (% of full scale).
    pub solar_pct: f32,
    /// Air temperature (°F).
    pub temperature_f: f32,
    /// Barometric pressure (inHg).
    pub pressure_inhg: f32,
    /// Relative humidity (%).
    pub humidity_pct: f32,
}

// ---------------------------------------------------------------------------
// Outbound commands (written by state handlers; drained by the service)
// ---------------------------------------------------------------------------

/// One transmission the state machine has decided to make.  Queued rather
/// than sent inline so handlers stay pure and emissions keep the order in
/// which their triggering condition became due.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportAction {
    /// Full telemetry report (battery, water level, solar, temperature,
    /// pressure, humidity) from the current snapshot.
    Telemetry,
    /// Rain rate for one sampling slice.  Zero is sent too — a quiet slice
    /// is itself information.
    RainRate(f32),
}

/// The terminal request a session ends with: how long to sleep and whether
/// to arm the rain-gauge edge as a second wake source (always, in practice
/// — the device must never be deaf to rain).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepRequest {
    pub duration_secs: u32,
    pub arm_edge_wake: bool,
}

/// Handler outputs for one tick.
#[derive(Debug, Default)]
pub struct SchedulerCommands {
    pub reports: heapless::Vec<ReportAction, 8>,
    pub sleep_request: Option<SleepRequest>,
}

impl SchedulerCommands {
    /// Queue a report.  The queue is sized for the worst tick (a sample
    /// boundary and a report boundary coinciding); overflow is logged and
    /// dropped rather than panicking.
    pub fn push_report(&mut self, action: ReportAction) {
        if self.reports.push(action).is_err() {
            warn!("command queue full, dropping {action:?}");
        }
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Monotonic uptime at the current tick (ms).  Written by the service
    /// before each `Fsm::tick`.
    pub now_ms: u64,
    /// Uptime at which the current state was entered (ms).  Maintained by
    /// the engine on transitions.
    pub state_entered_ms: u64,
    /// The two session stopwatches (rain sampling, report countdown).
    pub timers: SessionTimers,

    // -- Wake context --
    /// Why this session started.  Immutable for the session.
    pub wake_reason: WakeReason,

    // -- Sensor data --
    /// Latest sensor readings.  Updated before each FSM tick.
    pub sensors: SensorSnapshot,
    /// Bucket dumps drained from the gauge counter but not yet reported.
    pub session_tips: u16,
    /// Consecutive rain samples with zero dumps.
    pub quiet_samples: u8,

    // -- Scheduler state --
    /// Working copy of the sleep-surviving state.  Persisted by the
    /// composition root when the session ends.
    pub retained: RetainedState,

    // -- Outputs --
    /// Commands to be applied by the service after the FSM tick.
    pub commands: SchedulerCommands,

    // -- Configuration --
    pub config: SystemConfig,
}

impl FsmContext {
    /// Create a fresh session context.  Both stopwatches start zeroed at
    /// `now_ms`; whatever they read before the last sleep is gone, which is
    /// exactly right — elapsed sleep time is already folded into
    /// `retained.seconds_until_next_report` by wake classification.
    pub fn new(
        config: SystemConfig,
        retained: RetainedState,
        wake_reason: WakeReason,
        now_ms: u64,
    ) -> Self {
        Self {
            now_ms,
            state_entered_ms: now_ms,
            timers: SessionTimers::start(now_ms),
            wake_reason,
            sensors: SensorSnapshot::default(),
            session_tips: 0,
            quiet_samples: 0,
            retained,
            commands: SchedulerCommands::default(),
            config,
        }
    }

    /// Milliseconds spent in the current state.
    pub fn ms_in_state(&self) -> u64 {
        self.now_ms.saturating_sub(self.state_entered_ms)
    }

    /// Consume the session tip accumulator (one rain-rate sample, or the
    /// since-last-report count at a full report).
    pub fn take_session_tips(&mut self) -> u16 {
        core::mem::take(&mut self.session_tips)
    }
}
