//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART serial console in production).  There is no other
//! diagnostics channel on this node — the LoRa link carries data frames
//! only.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { reason, state } => {
                info!("START | wake={:?} initial_state={:?}", reason, state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::Telemetry(s) => {
                info!(
                    "TELEM | bat={:.2}V | water={:.1}cm | sun={:.0}% | \
                     T={:.1}\u{00b0}F | P={:.2}inHg | RH={:.0}%",
                    s.battery_volts,
                    s.water_level_cm,
                    s.solar_pct,
                    s.temperature_f,
                    s.pressure_inhg,
                    s.humidity_pct,
                );
            }
            AppEvent::RainRate(rate) => {
                info!("RAIN  | rate={:.2}", rate);
            }
            AppEvent::EnteringSleep {
                duration_secs,
                arm_edge_wake,
            } => {
                info!(
                    "SLEEP | {}s, edge wake {}",
                    duration_secs,
                    if *arm_edge_wake { "armed" } else { "off" }
                );
            }
        }
    }
}
