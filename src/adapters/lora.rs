//! REYAX RYLR896 LoRa module driver (AT commands over UART2).
//!
//! Implements [`TelemetryPort`].  The module does all the LoRa heavy
//! lifting internally; this adapter just frames `AT+SEND` commands at it
//! and never waits for acknowledgements — a dropped frame costs one
//! reading and self-heals at the next report.
//!
//! Network id and node address live in the module's own EEPROM.  They only
//! need writing when installing the firmware on a new board: enable
//! `lora_setup_required` in the configuration for one run, then disable it
//! so the EEPROM is not rewritten on every wake.

use log::{info, warn};

use crate::app::ports::{ReportField, TelemetryPort};
use crate::config::SystemConfig;
use crate::error::RadioError;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Maximum payload the module accepts in one AT+SEND frame.
const MAX_PAYLOAD: usize = 240;

pub struct ReyaxLora {
    name: heapless::String<12>,
    network_id: u8,
    node_address: u32,
    base_station: u32,
}

impl ReyaxLora {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            name: config.transmitter_name.clone(),
            network_id: config.lora_network_id,
            node_address: config.lora_node_address,
            base_station: config.lora_base_station_address,
        }
    }

    /// Bring up the UART and probe the module.
    pub fn initialize(&mut self) -> crate::error::Result<()> {
        self.uart_init()?;
        // Module boots in ~100 ms; the probe flushes its +READY banner.
        delay_ms(150);
        self.send_command("AT")?;
        info!("lora: module up (node {}, net {})", self.node_address, self.network_id);
        Ok(())
    }

    /// Write network id and node address to the module's EEPROM.
    /// Run-once when provisioning a new board.
    pub fn one_time_setup(&mut self) -> crate::error::Result<()> {
        info!(
            "lora: one-time setup (NETWORKID={}, ADDRESS={})",
            self.network_id, self.node_address
        );
        self.send_command(&format!("AT+NETWORKID={}", self.network_id))?;
        delay_ms(100);
        self.send_command(&format!("AT+ADDRESS={}", self.node_address))?;
        delay_ms(100);
        Ok(())
    }

    /// Drop the module into its low-current sleep mode.  Called before
    /// deep sleep to save battery; the module wakes on UART traffic at the
    /// next boot.
    pub fn power_off(&mut self) {
        if let Err(e) = self.send_command("AT+MODE=1") {
            warn!("lora: sleep-mode command failed ({e})");
        }
    }

    /// `<name>:<key>=<value>` — the payload grammar the base station parses.
    fn format_payload(&self, key: &str, value: f32) -> String {
        format!("{}:{}={:.2}", self.name, key, value)
    }

    fn send_payload(&mut self, payload: &str) {
        if payload.len() > MAX_PAYLOAD {
            warn!("lora: payload too long, dropped ({} bytes)", payload.len());
            return;
        }
        let frame = format!(
            "AT+SEND={},{},{}",
            self.base_station,
            payload.len(),
            payload
        );
        if let Err(e) = self.send_command(&frame) {
            warn!("lora: send failed ({e}), frame dropped");
        }
    }

    // ── UART plumbing ─────────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn uart_init(&mut self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;

        let port = pins::LORA_UART_NUM as i32;
        let cfg = uart_config_t {
            baud_rate: pins::LORA_UART_BAUD as i32,
            data_bits: uart_word_length_t_UART_DATA_8_BITS,
            parity: uart_parity_t_UART_PARITY_DISABLE,
            stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
            flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
            ..Default::default()
        };

        // SAFETY: single-threaded bring-up path; the config struct outlives
        // the calls that read it.
        unsafe {
            if uart_param_config(port, &cfg) != ESP_OK {
                return Err(RadioError::UartInitFailed);
            }
            if uart_set_pin(
                port,
                pins::LORA_UART_TX_GPIO,
                pins::LORA_UART_RX_GPIO,
                -1,
                -1,
            ) != ESP_OK
            {
                return Err(RadioError::UartInitFailed);
            }
            if uart_driver_install(port, 256, 0, 0, core::ptr::null_mut(), 0) != ESP_OK {
                return Err(RadioError::UartInitFailed);
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn uart_init(&mut self) -> Result<(), RadioError> {
        info!("lora(sim): UART init skipped");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn send_command(&mut self, cmd: &str) -> Result<(), RadioError> {
        use esp_idf_svc::sys::uart_write_bytes;

        let line = format!("{cmd}\r\n");
        // SAFETY: uart_write_bytes copies from the buffer before returning.
        let written = unsafe {
            uart_write_bytes(
                pins::LORA_UART_NUM as i32,
                line.as_ptr().cast(),
                line.len(),
            )
        };
        if written < 0 || written as usize != line.len() {
            return Err(RadioError::UartWriteFailed);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn send_command(&mut self, cmd: &str) -> Result<(), RadioError> {
        info!("lora(sim): {cmd}");
        Ok(())
    }
}

// ── TelemetryPort implementation ──────────────────────────────

impl TelemetryPort for ReyaxLora {
    fn send_report(&mut self, field: ReportField, value: f32) {
        let payload = self.format_payload(field.key(), value);
        self.send_payload(&payload);
    }

    fn send_rain_rate(&mut self, rate: f32) {
        let payload = self.format_payload("rain_rate", rate);
        self.send_payload(&payload);
    }
}

#[cfg(target_os = "espidf")]
fn delay_ms(ms: u32) {
    esp_idf_hal::delay::FreeRtos::delay_ms(ms);
}

#[cfg(not(target_os = "espidf"))]
fn delay_ms(_ms: u32) {}
