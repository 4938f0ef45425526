//! System configuration parameters
//!
//! All tunable parameters for the transmitter node.  These are compile-time
//! operating constants carried in a struct so the defaults are testable and
//! a future provisioning path has a seam; there is no runtime configuration
//! surface.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity ---
    /// Short transmitter name prefixed to every telemetry payload.
    pub transmitter_name: heapless::String<12>,

    // --- Reporting schedule ---
    /// Interval between full telemetry reports, and the normal sleep
    /// duration between wakes (seconds).
    pub report_interval_secs: u16,
    /// Rain-rate sampling interval while monitoring an active rain
    /// event (seconds).
    pub rain_sample_interval_secs: u16,
    /// Consecutive zero-dump samples before rain is judged to have stopped.
    pub quiet_samples_threshold: u8,
    /// Volume represented by one dump of the tipping bucket.
    pub bucket_volume: f32,
    /// How long to linger after the wake-up report before deciding whether
    /// rain has started (milliseconds).
    pub report_settle_ms: u32,
    /// Awake-session polling cadence (milliseconds).
    pub tick_interval_ms: u32,

    // --- Battery voltage divider ---
    /// Upper divider resistor (ohms), actual measured value.
    pub divider_r1_ohms: f32,
    /// Lower divider resistor (ohms), ditto.
    pub divider_r2_ohms: f32,
    /// Per-device correction factor, calibrated against a known input
    /// voltage at normal battery voltage.
    pub voltage_calibration: f32,

    // --- LoRa radio ---
    /// Network id shared by every unit that talks to the base station.
    pub lora_network_id: u8,
    /// This transmitter's node address.
    pub lora_node_address: u32,
    /// Base station (receiver) address for all transmissions.
    pub lora_base_station_address: u32,
    /// Write network id + node address to the radio module's EEPROM at
    /// boot.  Enable for one run when installing on a new board, then
    /// disable so the EEPROM is not rewritten every wake.
    pub lora_setup_required: bool,
    /// Put the radio into its low-current sleep mode before deep sleep.
    pub radio_power_down: bool,

    // --- Rain gauge wake source ---
    /// Pin level that wakes the device from deep sleep (the reed switch
    /// pulls the pin to this level on a dump).  Board-revision dependent.
    pub rain_wake_high: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            transmitter_name: heapless::String::new(),

            // Schedule
            report_interval_secs: 900, // 15 minutes
            rain_sample_interval_secs: 60,
            quiet_samples_threshold: 3,
            bucket_volume: 100.0,
            report_settle_ms: 2000,
            tick_interval_ms: 250,

            // Divider, measured 2/2023
            divider_r1_ohms: 100_500.0,
            divider_r2_ohms: 22_040.0,
            voltage_calibration: 0.98,

            // Radio
            lora_network_id: 14,
            lora_node_address: 2206,
            lora_base_station_address: 2200,
            lora_setup_required: false,
            radio_power_down: true,

            rain_wake_high: true,
        }
        .with_name("Wx")
    }
}

impl SystemConfig {
    /// Builder-style name setter (the name is truncated to the fixed
    /// capacity rather than rejected).
    pub fn with_name(mut self, name: &str) -> Self {
        self.transmitter_name.clear();
        for ch in name.chars() {
            if self.transmitter_name.push(ch).is_err() {
                break;
            }
        }
        self
    }
}
