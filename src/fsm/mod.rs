//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StateTable                                                 │
//! │  ┌────────────────┬───────────┬──────────┬───────────────┐  │
//! │  │ StateId        │ on_enter  │ on_exit  │ on_update     │  │
//! │  ├────────────────┼───────────┼──────────┼───────────────┤  │
//! │  │ Reporting      │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Opt  │  │
//! │  │ RainMonitoring │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Opt  │  │
//! │  │ PreparingSleep │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Opt  │  │
//! │  └────────────────┴───────────┴──────────┴───────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.  If it
//! returns `Some(next_id)`, the engine runs `on_exit` for the current
//! state, then `on_enter` for the next, and updates the current pointer.
//! All functions receive `&mut FsmContext`, which holds sensor readings,
//! timers, retained state, and the outbound command queue.
//!
//! Every decision is recomputed from current counters each tick, so a
//! missed or double-counted edge self-corrects at the next sampling
//! boundary — there is no retry machinery anywhere in the machine.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all scheduler states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// Transient: emit the wake-up reports, then decide where to go after
    /// the settle delay.
    Reporting = 0,
    /// Rain is (or may be) falling: sample the gauge on a fixed cadence
    /// until it has been quiet long enough.
    RainMonitoring = 1,
    /// Transient: realign the report countdown and request deep sleep.
    PreparingSleep = 2,
}

impl StateId {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 3;

    /// Convert a `u8` index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `PreparingSleep` in release (the safe
    /// fallback — a confused scheduler should sleep, not burn battery).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Reporting,
            1 => Self::RainMonitoring,
            2 => Self::PreparingSleep,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::PreparingSleep
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]) and walks it against
/// a mutable [`FsmContext`] threaded through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in
    /// `initial`.  The initial state is chosen by wake reason: a timer
    /// deadline starts in `Reporting`, a rain edge goes straight to
    /// `RainMonitoring` with no report.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        ctx.state_entered_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.  `ctx.now_ms` must already be set to
    /// the current uptime by the caller.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and state-entry timestamp
        self.current = next_idx;
        ctx.state_entered_ms = ctx.now_ms;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::context::FsmContext;
    use super::*;
    use crate::config::SystemConfig;
    use crate::retained::RetainedState;
    use crate::wake::WakeReason;

    fn make_ctx(wake: WakeReason) -> FsmContext {
        let config = SystemConfig::default();
        let retained = RetainedState::cold_boot(config.report_interval_secs);
        FsmContext::new(config, retained, wake, 0)
    }

    fn make_fsm(initial: StateId) -> Fsm {
        Fsm::new(states::build_state_table(), initial)
    }

    #[test]
    fn starts_in_requested_state() {
        assert_eq!(
            make_fsm(StateId::Reporting).current_state(),
            StateId::Reporting
        );
        assert_eq!(
            make_fsm(StateId::RainMonitoring).current_state(),
            StateId::RainMonitoring
        );
    }

    #[test]
    fn start_runs_on_enter() {
        let mut fsm = make_fsm(StateId::Reporting);
        let mut ctx = make_ctx(WakeReason::TimerDeadline);
        fsm.start(&mut ctx);
        // Reporting's on_enter queues the wake-up reports.
        assert!(!ctx.commands.reports.is_empty());
    }

    #[test]
    fn tick_tracks_time_in_state() {
        let mut fsm = make_fsm(StateId::RainMonitoring);
        let mut ctx = make_ctx(WakeReason::SensorEdge);
        fsm.start(&mut ctx);

        ctx.now_ms = 1_500;
        fsm.tick(&mut ctx);
        assert_eq!(ctx.ms_in_state(), 1_500);
    }

    #[test]
    fn transition_resets_time_in_state() {
        let mut fsm = make_fsm(StateId::Reporting);
        let mut ctx = make_ctx(WakeReason::TimerDeadline);
        fsm.start(&mut ctx);

        // Ride through the settle delay with no rain: Reporting exits to
        // PreparingSleep, and the entry timestamp moves with it.
        ctx.now_ms = u64::from(ctx.config.report_settle_ms) + 250;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), StateId::PreparingSleep);
        assert_eq!(ctx.ms_in_state(), 0);
    }

    #[test]
    fn state_id_from_index_roundtrip() {
        for i in 0..StateId::COUNT {
            let id = StateId::from_index(i);
            assert_eq!(id as usize, i);
        }
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn state_id_from_invalid_index_falls_back_to_sleep() {
        assert_eq!(StateId::from_index(99), StateId::PreparingSleep);
    }
}
