//! Unified error types for the transmitter firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level boot path's error handling uniform.  All variants are `Copy` so
//! they can be cheaply passed around without allocation.  Nothing in the
//! scheduling core itself is fatal — these surface only from peripheral
//! bring-up and the radio/sensor adapters, where a failure degrades to a
//! logged warning and a missed report that self-heals at the next cycle.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// The LoRa radio link failed.
    Radio(RadioError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// An I2C transaction with the environment sensor failed.
    I2cFailed,
    /// The device on the bus did not identify as the expected sensor.
    WrongChipId,
    /// Reading is outside the physically plausible range.
    OutOfRange,
    /// The sensor was read before `init()` completed.
    NotInitialised,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::I2cFailed => write!(f, "I2C transaction failed"),
            Self::WrongChipId => write!(f, "unexpected chip id"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::NotInitialised => write!(f, "sensor not initialised"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// UART driver installation failed.
    UartInitFailed,
    /// Writing an AT command to the module failed.
    UartWriteFailed,
    /// A payload exceeded the module's frame limit and was dropped.
    PayloadTooLong,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UartInitFailed => write!(f, "UART init failed"),
            Self::UartWriteFailed => write!(f, "UART write failed"),
            Self::PayloadTooLong => write!(f, "payload too long"),
        }
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
