//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, the LoRa radio, event sinks) implement these
//! traits.  The [`AppService`](super::service::AppService) consumes them via
//! generics, so the scheduling core never touches hardware directly — and
//! the integration tests drive whole wake-to-sleep sessions against
//! recording mocks.

use crate::fsm::context::SensorSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Read every reportable sensor and return a unified snapshot.
    /// Infallible from the scheduler's viewpoint — a flaky sensor is the
    /// adapter's problem and degrades to a stale or zero field.
    fn read_all(&mut self) -> SensorSnapshot;

    /// Atomically read and reset the rain-gauge dump counter.  The ISR is
    /// the only other party touching it, and it only increments.
    fn take_rain_tips(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Telemetry port (driven adapter: domain → radio link)
// ───────────────────────────────────────────────────────────────

/// Fields of the full telemetry report, in transmission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportField {
    BatteryVoltage,
    WaterLevel,
    SolarIrradiance,
    Temperature,
    Pressure,
    Humidity,
}

impl ReportField {
    /// Payload key understood by the base station.
    pub fn key(self) -> &'static str {
        match self {
            Self::BatteryVoltage => "battery_v",
            Self::WaterLevel => "water_level",
            Self::SolarIrradiance => "solar",
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
            Self::Humidity => "humidity",
        }
    }

    /// All fields in the order they are transmitted.
    pub const ALL: [Self; 6] = [
        Self::BatteryVoltage,
        Self::WaterLevel,
        Self::SolarIrradiance,
        Self::Temperature,
        Self::Pressure,
        Self::Humidity,
    ];
}

/// Write-side port: the domain hands finished readings to the radio link.
/// Fire-and-forget — no acknowledgement is awaited, and a lost frame
/// self-heals at the next scheduled report.
pub trait TelemetryPort {
    fn send_report(&mut self, field: ReportField, value: f32);
    fn send_rain_rate(&mut self, rate: f32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log today; a
/// diagnostics uplink would implement the same trait).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
