//! BME280 environment sensor (temperature / pressure / humidity over I2C).
//!
//! Generic over [`embedded_hal::i2c::I2c`], so the same driver runs against
//! the ESP-IDF I2C peripheral on hardware and against [`SimBme280Bus`] in
//! host tests and simulation.  The sensor is configured for normal mode
//! with ×1 oversampling and a 1 s standby — the node is awake for seconds
//! at a time, so free-running measurements are always fresh by the time a
//! report goes out.
//!
//! Compensation follows the vendor datasheet's floating-point formulas.
//! Reported units match the base station's expectations: °F, inches of
//! mercury, and %RH.

use embedded_hal::i2c::I2c;
use log::info;

use crate::error::SensorError;

/// Default I2C address (SDO tied low).
pub const BME280_I2C_ADDR: u8 = 0x76;

const CHIP_ID: u8 = 0x60;

const REG_CHIP_ID: u8 = 0xD0;
const REG_CALIB_00: u8 = 0x88;
const REG_CALIB_26: u8 = 0xE1;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_CONFIG: u8 = 0xF5;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_DATA: u8 = 0xF7;

/// osrs_h = ×1
const CTRL_HUM_OS1: u8 = 0x01;
/// t_sb = 1000 ms, filter off
const CONFIG_SB1000: u8 = 0b1010_0000;
/// osrs_t = ×1, osrs_p = ×1, mode = normal
const CTRL_MEAS_NORMAL: u8 = 0b0010_0111;

// ---------------------------------------------------------------------------
// Calibration coefficients (factory-programmed, read once at init)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Calibration {
    t1: u16,
    t2: i16,
    t3: i16,
    p1: u16,
    p2: i16,
    p3: i16,
    p4: i16,
    p5: i16,
    p6: i16,
    p7: i16,
    p8: i16,
    p9: i16,
    h1: u8,
    h2: i16,
    h3: u8,
    h4: i16,
    h5: i16,
    h6: i8,
}

fn u16_le(buf: &[u8], i: usize) -> u16 {
    u16::from(buf[i]) | (u16::from(buf[i + 1]) << 8)
}

fn i16_le(buf: &[u8], i: usize) -> i16 {
    u16_le(buf, i) as i16
}

impl Calibration {
    /// `block_a` = registers 0x88..=0xA1, `block_b` = 0xE1..=0xE7.
    fn parse(block_a: &[u8; 26], block_b: &[u8; 7]) -> Self {
        Self {
            t1: u16_le(block_a, 0),
            t2: i16_le(block_a, 2),
            t3: i16_le(block_a, 4),
            p1: u16_le(block_a, 6),
            p2: i16_le(block_a, 8),
            p3: i16_le(block_a, 10),
            p4: i16_le(block_a, 12),
            p5: i16_le(block_a, 14),
            p6: i16_le(block_a, 16),
            p7: i16_le(block_a, 18),
            p8: i16_le(block_a, 20),
            p9: i16_le(block_a, 22),
            h1: block_a[25],
            h2: i16_le(block_b, 0),
            h3: block_b[2],
            // H4/H5 share register 0xE5: E4[11:4]+E5[3:0] and E6[11:4]+E5[7:4].
            h4: (i16::from(block_b[3]) << 4) | i16::from(block_b[4] & 0x0F),
            h5: (i16::from(block_b[5]) << 4) | i16::from(block_b[4] >> 4),
            h6: block_b[6] as i8,
        }
    }
}

// ---------------------------------------------------------------------------
// Readings and unit conversions
// ---------------------------------------------------------------------------

/// One compensated measurement, already in reporting units.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvReading {
    pub temperature_f: f32,
    pub pressure_inhg: f32,
    pub humidity_pct: f32,
}

pub fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 1.8 + 32.0
}

pub fn pascals_to_inhg(pa: f32) -> f32 {
    pa * 0.000_295_3
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct Bme280<I2C> {
    i2c: I2C,
    addr: u8,
    calib: Option<Calibration>,
}

impl<I2C: I2c> Bme280<I2C> {
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self {
            i2c,
            addr,
            calib: None,
        }
    }

    /// Probe the chip, load calibration, and start normal-mode sampling.
    pub fn init(&mut self) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        self.i2c
            .write_read(self.addr, &[REG_CHIP_ID], &mut id)
            .map_err(|_| SensorError::I2cFailed)?;
        if id[0] != CHIP_ID {
            return Err(SensorError::WrongChipId);
        }

        let mut block_a = [0u8; 26];
        let mut block_b = [0u8; 7];
        self.i2c
            .write_read(self.addr, &[REG_CALIB_00], &mut block_a)
            .map_err(|_| SensorError::I2cFailed)?;
        self.i2c
            .write_read(self.addr, &[REG_CALIB_26], &mut block_b)
            .map_err(|_| SensorError::I2cFailed)?;
        self.calib = Some(Calibration::parse(&block_a, &block_b));

        // ctrl_hum must be written before ctrl_meas to take effect.
        for (reg, val) in [
            (REG_CTRL_HUM, CTRL_HUM_OS1),
            (REG_CONFIG, CONFIG_SB1000),
            (REG_CTRL_MEAS, CTRL_MEAS_NORMAL),
        ] {
            self.i2c
                .write(self.addr, &[reg, val])
                .map_err(|_| SensorError::I2cFailed)?;
        }

        info!("bme280: initialised at 0x{:02X}", self.addr);
        Ok(())
    }

    /// Burst-read the measurement registers and compensate.
    pub fn read(&mut self) -> Result<EnvReading, SensorError> {
        let calib = self.calib.ok_or(SensorError::NotInitialised)?;

        let mut buf = [0u8; 8];
        self.i2c
            .write_read(self.addr, &[REG_DATA], &mut buf)
            .map_err(|_| SensorError::I2cFailed)?;

        let adc_p = (u32::from(buf[0]) << 12) | (u32::from(buf[1]) << 4) | (u32::from(buf[2]) >> 4);
        let adc_t = (u32::from(buf[3]) << 12) | (u32::from(buf[4]) << 4) | (u32::from(buf[5]) >> 4);
        let adc_h = (u32::from(buf[6]) << 8) | u32::from(buf[7]);

        let (celsius, t_fine) = compensate_temperature(adc_t, &calib);
        let pascals = compensate_pressure(adc_p, t_fine, &calib);
        let humidity = compensate_humidity(adc_h, t_fine, &calib);

        Ok(EnvReading {
            temperature_f: celsius_to_fahrenheit(celsius as f32),
            pressure_inhg: pascals_to_inhg(pascals as f32),
            humidity_pct: humidity as f32,
        })
    }
}

// ---------------------------------------------------------------------------
// Datasheet compensation (floating-point variant)
// ---------------------------------------------------------------------------

/// Returns (°C, t_fine).  `t_fine` carries temperature into the pressure
/// and humidity formulas.
fn compensate_temperature(adc_t: u32, c: &Calibration) -> (f64, f64) {
    let adc_t = f64::from(adc_t);
    let t1 = f64::from(c.t1);
    let var1 = (adc_t / 16384.0 - t1 / 1024.0) * f64::from(c.t2);
    let var2 =
        (adc_t / 131072.0 - t1 / 8192.0) * (adc_t / 131072.0 - t1 / 8192.0) * f64::from(c.t3);
    let t_fine = var1 + var2;
    (t_fine / 5120.0, t_fine)
}

/// Pressure in pascals.
fn compensate_pressure(adc_p: u32, t_fine: f64, c: &Calibration) -> f64 {
    let mut var1 = t_fine / 2.0 - 64000.0;
    let mut var2 = var1 * var1 * f64::from(c.p6) / 32768.0;
    var2 += var1 * f64::from(c.p5) * 2.0;
    var2 = var2 / 4.0 + f64::from(c.p4) * 65536.0;
    var1 = (f64::from(c.p3) * var1 * var1 / 524288.0 + f64::from(c.p2) * var1) / 524288.0;
    var1 = (1.0 + var1 / 32768.0) * f64::from(c.p1);
    if var1 == 0.0 {
        return 0.0; // avoid division by zero on a blank part
    }
    let mut p = 1048576.0 - f64::from(adc_p);
    p = (p - var2 / 4096.0) * 6250.0 / var1;
    var1 = f64::from(c.p9) * p * p / 2147483648.0;
    var2 = p * f64::from(c.p8) / 32768.0;
    p + (var1 + var2 + f64::from(c.p7)) / 16.0
}

/// Relative humidity in percent, clamped to 0..=100.
fn compensate_humidity(adc_h: u32, t_fine: f64, c: &Calibration) -> f64 {
    let var_h = t_fine - 76800.0;
    let var_h = (f64::from(adc_h) - (f64::from(c.h4) * 64.0 + f64::from(c.h5) / 16384.0 * var_h))
        * (f64::from(c.h2) / 65536.0
            * (1.0 + f64::from(c.h6) / 67108864.0
                * var_h
                * (1.0 + f64::from(c.h3) / 67108864.0 * var_h)));
    let var_h = var_h * (1.0 - f64::from(c.h1) * var_h / 524288.0);
    var_h.clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Host simulation bus
// ---------------------------------------------------------------------------

/// In-memory BME280 for host builds: answers the register map of a real
/// part loaded with the datasheet's worked-example calibration and a fixed
/// raw sample (≈25 °C / ≈1006.5 hPa / ≈47 %RH).
#[cfg(not(target_os = "espidf"))]
pub struct SimBme280Bus {
    reg_ptr: u8,
    chip_id: u8,
}

#[cfg(not(target_os = "espidf"))]
impl SimBme280Bus {
    pub fn new() -> Self {
        Self {
            reg_ptr: 0,
            chip_id: CHIP_ID,
        }
    }

    /// A bus whose device answers with the wrong chip id (wiring-fault sim).
    pub fn with_chip_id(chip_id: u8) -> Self {
        Self { reg_ptr: 0, chip_id }
    }

    fn reg(&self, addr: u8) -> u8 {
        match addr {
            REG_CHIP_ID => self.chip_id,
            // Calibration block A (datasheet worked example, little-endian)
            0x88 => 0x70, // T1 = 27504
            0x89 => 0x6B,
            0x8A => 0x43, // T2 = 26435
            0x8B => 0x67,
            0x8C => 0x18, // T3 = -1000
            0x8D => 0xFC,
            0x8E => 0x7D, // P1 = 36477
            0x8F => 0x8E,
            0x90 => 0x42, // P2 = -10685
            0x91 => 0xD6,
            0x92 => 0xD0, // P3 = 3024
            0x93 => 0x0B,
            0x94 => 0x27, // P4 = 2855
            0x95 => 0x0B,
            0x96 => 0x8C, // P5 = 140
            0x97 => 0x00,
            0x98 => 0xF9, // P6 = -7
            0x99 => 0xFF,
            0x9A => 0x8C, // P7 = 15500
            0x9B => 0x3C,
            0x9C => 0xF8, // P8 = -14600
            0x9D => 0xC6,
            0x9E => 0x70, // P9 = 6000
            0x9F => 0x17,
            0xA1 => 0x4B, // H1 = 75
            // Calibration block B
            0xE1 => 0x63, // H2 = 355
            0xE2 => 0x01,
            0xE3 => 0x00, // H3 = 0
            0xE4 => 0x14, // H4 = 333, H5 = 50 (nibble-packed)
            0xE5 => 0x2D,
            0xE6 => 0x03,
            0xE7 => 0x1E, // H6 = 30
            // Raw sample: adc_P = 415148, adc_T = 519888, adc_H = 30000
            0xF7 => 0x65,
            0xF8 => 0x5A,
            0xF9 => 0xC0,
            0xFA => 0x7E,
            0xFB => 0xED,
            0xFC => 0x00,
            0xFD => 0x75,
            0xFE => 0x30,
            _ => 0x00,
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for SimBme280Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
pub struct SimBusError;

#[cfg(not(target_os = "espidf"))]
impl embedded_hal::i2c::Error for SimBusError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        embedded_hal::i2c::ErrorKind::Other
    }
}

#[cfg(not(target_os = "espidf"))]
impl embedded_hal::i2c::ErrorType for SimBme280Bus {
    type Error = SimBusError;
}

#[cfg(not(target_os = "espidf"))]
impl I2c for SimBme280Bus {
    fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [embedded_hal::i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                embedded_hal::i2c::Operation::Write(bytes) => {
                    // First byte selects the register; config writes are
                    // accepted and ignored.
                    if let Some(&reg) = bytes.first() {
                        self.reg_ptr = reg;
                    }
                }
                embedded_hal::i2c::Operation::Read(buf) => {
                    for (i, slot) in buf.iter_mut().enumerate() {
                        *slot = self.reg(self.reg_ptr.wrapping_add(i as u8));
                    }
                }
            }
        }
        Ok(())
    }
}
