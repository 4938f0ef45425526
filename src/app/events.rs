//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — today they go to the serial log.

use crate::fsm::StateId;
use crate::fsm::context::SensorSnapshot;
use crate::wake::WakeReason;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The session started (carries the classified wake reason and the
    /// state the FSM began in).
    Started { reason: WakeReason, state: StateId },

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A full telemetry report went out (values as transmitted).
    Telemetry(SensorSnapshot),

    /// A rain-rate report went out.
    RainRate(f32),

    /// The session is about to end in deep sleep.
    EnteringSleep {
        duration_secs: u32,
        arm_edge_wake: bool,
    },
}
