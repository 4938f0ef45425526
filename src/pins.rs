//! GPIO / peripheral pin assignments for the transmitter board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Rain gauge (tipping bucket, hall-effect reed switch)
// ---------------------------------------------------------------------------

/// Digital input: one pulse per bucket dump.  Interrupt-driven while awake,
/// EXT0 wake source while in deep sleep (GPIO32 is an RTC IO on the ESP32).
pub const RAIN_GAUGE_GPIO: i32 = 32;

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1)
// ---------------------------------------------------------------------------

/// Battery voltage via resistive divider.  ADC1 channel 5 (GPIO 33).
pub const BATTERY_ADC_GPIO: i32 = 33;
/// Solar irradiance sensor.  ADC1 channel 6 (GPIO 34, input-only).
pub const SOLAR_ADC_GPIO: i32 = 34;
/// Canal water-level sensor.  ADC1 channel 7 (GPIO 35, input-only).
pub const WATER_LEVEL_ADC_GPIO: i32 = 35;

/// ADC1 channel numbers matching the GPIOs above.
pub const ADC1_CH_BATTERY: u32 = 5;
pub const ADC1_CH_SOLAR: u32 = 6;
pub const ADC1_CH_WATER_LEVEL: u32 = 7;

// ---------------------------------------------------------------------------
// I²C bus (BME280 environment sensor)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;

// ---------------------------------------------------------------------------
// LoRa radio (REYAX RYLR896 on UART2)
// ---------------------------------------------------------------------------

pub const LORA_UART_TX_GPIO: i32 = 17;
pub const LORA_UART_RX_GPIO: i32 = 16;
pub const LORA_UART_NUM: u32 = 2;
pub const LORA_UART_BAUD: u32 = 115_200;
