//! TCS34725 color sensor demo for Raspberry Pi Pico 2 (RP2350)
//!
//! Reads the sensor over I2C0 (SDA=GPIO4, SCL=GPIO5) and streams raw channel
//! counts, HSV, the named color, and the line detector state over defmt.

#![no_std]
#![no_main]

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{self, I2c};
use embassy_time::{Delay, Timer};
use tcs34725::{Gain, Tcs34725};
use {defmt_rtt as _, panic_probe as _};

// Program metadata for `picotool info`
#[unsafe(link_section = ".bi_entries")]
#[used]
pub static PICOTOOL_ENTRIES: [embassy_rp::binary_info::EntryAddr; 4] = [
    embassy_rp::binary_info::rp_program_name!(c"tcs34725-demo"),
    embassy_rp::binary_info::rp_program_description!(c"TCS34725 RGB color sensor demo"),
    embassy_rp::binary_info::rp_cargo_version!(),
    embassy_rp::binary_info::rp_program_build_attribute!(),
];

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("TCS34725 demo starting...");

    let p = embassy_rp::init(Default::default());

    // Onboard LED as heartbeat (active-high on the Pico 2)
    let mut led = Output::new(p.PIN_25, Level::Low);

    // I2C0 on the default pins: SDA=GPIO4, SCL=GPIO5
    let bus = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, sensor_i2c_config());

    let mut sensor = Tcs34725::new(bus, Delay);

    // Measurements would initialize lazily; doing it here surfaces wiring
    // problems at boot instead of on the first sample
    while let Err(e) = sensor.init() {
        warn!("sensor init failed: {}", e);
        Timer::after_millis(500).await;
    }
    info!("sensor initialized");
    led.set_high();

    if let Err(e) = sensor.set_gain(Gain::X4) {
        warn!("set_gain failed: {}", e);
    }

    // Capture line detection references against the surfaces in front of
    // the sensor at boot
    info!("calibrating: hold the sensor over the bright surface");
    Timer::after_secs(3).await;
    match sensor.calibrate_white() {
        Ok(value) => info!("white reference: {}", value),
        Err(e) => warn!("white calibration failed: {}", e),
    }

    info!("calibrating: hold the sensor over the line");
    Timer::after_secs(3).await;
    match sensor.calibrate_black() {
        Ok(value) => info!("black reference: {}", value),
        Err(e) => warn!("black calibration failed: {}", e),
    }

    info!("starting measurement loop...");

    loop {
        match sensor.read_sample_burst() {
            Ok(sample) => {
                let hsv = sample.to_hsv();
                info!(
                    "C={} R={} G={} B={} | h={} s={} v={} | {}",
                    sample.clear,
                    sample.red,
                    sample.green,
                    sample.blue,
                    hsv.h,
                    hsv.s,
                    hsv.v,
                    sample.color_name(),
                );
            }
            Err(e) => warn!("sample read failed: {}", e),
        }

        match sensor.read_rgb() {
            Ok([r, g, b]) => info!("gain-compensated rgb: [{}, {}, {}]", r, g, b),
            Err(e) => warn!("rgb read failed: {}", e),
        }

        match sensor.detect_line() {
            Ok(on_line) => info!("line detected: {}", on_line),
            Err(e) => warn!("line detection failed: {}", e),
        }

        led.toggle();
        Timer::after_millis(500).await;
    }
}

/// Bus configuration for the sensor (fast mode, 400 kHz).
fn sensor_i2c_config() -> i2c::Config {
    let mut config = i2c::Config::default();
    config.frequency = 400_000;
    config
}
