//! Weather-station transmitter — main entry point.
//!
//! Every run of this program is exactly one pass through the duty cycle:
//!
//! ```text
//! boot ──▶ classify wake ──▶ AppService session loop ──▶ deep sleep
//!   ▲      (timer? rain edge?)  (report / monitor rain)       │
//!   └──────────────────────────────────────────────────────────┘
//!              wake source fires (RTC timer or gauge edge)
//! ```
//!
//! Deep sleep never returns: execution resumes here, at the top, with only
//! the RTC-resident retained state carried over.  The scheduling core is
//! pure logic behind port traits; this file is the composition root that
//! wires it to the ESP32 peripherals (or their host simulations).

#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use wxnode::adapters::hardware::HardwareAdapter;
use wxnode::adapters::log_sink::LogEventSink;
use wxnode::adapters::lora::ReyaxLora;
use wxnode::adapters::rtc_store::RtcStateStore;
use wxnode::adapters::time::Esp32TimeAdapter;
use wxnode::app::events::AppEvent;
use wxnode::app::ports::EventSink;
use wxnode::app::service::AppService;
use wxnode::config::SystemConfig;
use wxnode::drivers::hw_init;
use wxnode::pins;
use wxnode::power::PowerManager;
use wxnode::sensors::SensorHub;
use wxnode::sensors::battery::BatterySensor;
use wxnode::sensors::environment::{BME280_I2C_ADDR, Bme280};
use wxnode::sensors::solar::SolarSensor;
use wxnode::sensors::water_level::WaterLevelSensor;
use wxnode::wake;

fn main() -> Result<()> {
    // ── 1. Platform bootstrap ─────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    info!("wxnode v{} booting", env!("CARGO_PKG_VERSION"));

    let config = SystemConfig::default();

    // ── 2. Peripheral bring-up ────────────────────────────────
    hw_init::init_peripherals()?;
    hw_init::init_isr_service(config.rain_wake_high)?;

    // ── 3. Wake classification ────────────────────────────────
    let time = Esp32TimeAdapter::new();
    let store = RtcStateStore::new(config.report_interval_secs);
    let power = PowerManager::new(pins::RAIN_GAUGE_GPIO, config.rain_wake_high);

    let mut retained = store.load();
    let reason = wake::classify(
        power.wake_sources(),
        &mut retained,
        time.wallclock_secs(),
        &config,
    );

    // ── 4. Radio ──────────────────────────────────────────────
    let mut radio = ReyaxLora::new(&config);
    if let Err(e) = radio.initialize() {
        // Keep going: the session still samples and sleeps on schedule,
        // and a radio that recovers on the next boot loses one report.
        warn!("radio init failed ({e}), transmissions will be dropped");
    }
    if config.lora_setup_required {
        if let Err(e) = radio.one_time_setup() {
            warn!("radio one-time setup failed ({e})");
        }
    }

    // ── 5. Sensors ────────────────────────────────────────────
    #[cfg(target_os = "espidf")]
    let i2c = {
        use esp_idf_hal::i2c::{I2cDriver, config::Config};
        use esp_idf_hal::peripherals::Peripherals;
        use esp_idf_hal::units::Hertz;

        let peripherals = Peripherals::take()?;
        I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio21,
            peripherals.pins.gpio22,
            &Config::new().baudrate(Hertz(100_000)),
        )?
    };
    #[cfg(not(target_os = "espidf"))]
    let i2c = wxnode::sensors::environment::SimBme280Bus::new();

    let hub = SensorHub::new(
        BatterySensor::new(
            pins::BATTERY_ADC_GPIO,
            config.divider_r1_ohms,
            config.divider_r2_ohms,
            config.voltage_calibration,
        ),
        WaterLevelSensor::new(pins::WATER_LEVEL_ADC_GPIO),
        SolarSensor::new(pins::SOLAR_ADC_GPIO),
        Bme280::new(i2c, BME280_I2C_ADDR),
    );
    let mut hw = HardwareAdapter::new(hub);
    hw.init();

    let mut sink = LogEventSink::new();

    // ── 6. One awake session ──────────────────────────────────
    let mut app = AppService::new(config.clone(), retained, reason, time.uptime_ms());
    app.start(&mut hw, &mut radio, &mut sink);

    let tick_ms = app.tick_interval_ms();
    loop {
        sleep_tick(tick_ms);
        app.tick(time.uptime_ms(), &mut hw, &mut radio, &mut sink);

        if let Some(req) = app.sleep_request() {
            // Persist first, then quiesce the radio, then commit.  The
            // sleep call does not return; the next wake re-enters main().
            store.store(&app.sleep_snapshot(time.wallclock_secs()));
            if config.radio_power_down {
                radio.power_off();
            }
            sink.emit(&AppEvent::EnteringSleep {
                duration_secs: req.duration_secs,
                arm_edge_wake: req.arm_edge_wake,
            });
            power.enter_deep_sleep(req.duration_secs, req.arm_edge_wake);
        }
    }
}

fn sleep_tick(ms: u32) {
    #[cfg(target_os = "espidf")]
    esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    #[cfg(not(target_os = "espidf"))]
    std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
}
