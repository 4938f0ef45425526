//! Mock hardware adapters for integration tests.
//!
//! Record every radio call so tests can assert on the full transmission
//! history without touching real UART/ADC registers, and feed the
//! scheduler a scriptable rain gauge and sensor snapshot.

use wxnode::app::events::AppEvent;
use wxnode::app::ports::{EventSink, ReportField, SensorPort, TelemetryPort};
use wxnode::fsm::context::SensorSnapshot;

// ── Radio call record ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RadioCall {
    Report { field: ReportField, value: f32 },
    RainRate(f32),
}

// ── MockHardware ──────────────────────────────────────────────

/// Sensor-side mock: a fixed snapshot plus a tip count the test tops up
/// between ticks (standing in for the gauge ISR).
pub struct MockHardware {
    pub snapshot: SensorSnapshot,
    pub pending_tips: u16,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            snapshot: SensorSnapshot {
                battery_volts: 13.2,
                water_level_cm: 42.0,
                solar_pct: 55.0,
                temperature_f: 71.3,
                pressure_inhg: 29.92,
                humidity_pct: 40.0,
            },
            pending_tips: 0,
        }
    }

    /// Simulate the gauge ISR firing `n` times.
    pub fn tip(&mut self, n: u16) {
        self.pending_tips = self.pending_tips.saturating_add(n);
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_all(&mut self) -> SensorSnapshot {
        self.snapshot
    }

    fn take_rain_tips(&mut self) -> u16 {
        core::mem::take(&mut self.pending_tips)
    }
}

// ── MockRadio ─────────────────────────────────────────────────

pub struct MockRadio {
    pub calls: Vec<RadioCall>,
}

#[allow(dead_code)]
impl MockRadio {
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    pub fn rain_rates(&self) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RadioCall::RainRate(v) => Some(*v),
                RadioCall::Report { .. } => None,
            })
            .collect()
    }

    /// Number of complete telemetry reports (each is one frame per field).
    pub fn telemetry_count(&self) -> usize {
        let fields = self
            .calls
            .iter()
            .filter(|c| matches!(c, RadioCall::Report { .. }))
            .count();
        fields / ReportField::ALL.len()
    }
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryPort for MockRadio {
    fn send_report(&mut self, field: ReportField, value: f32) {
        self.calls.push(RadioCall::Report { field, value });
    }

    fn send_rain_rate(&mut self, rate: f32) {
        self.calls.push(RadioCall::RainRate(rate));
    }
}

// ── Recording event sink ──────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<String>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(format!("{:?}", event));
    }
}
