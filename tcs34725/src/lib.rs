//! Platform-agnostic blocking driver for the TCS34725 RGB color sensor.
//!
//! The TCS34725 is a register-addressed I2C device at the fixed address
//! `0x29`, with four 16-bit ADC channels: red, green, blue, and an
//! unfiltered clear channel. This crate speaks the command-bit register
//! protocol over any [`embedded_hal::i2c::I2c`] bus and layers a small
//! color engine on top of the raw counts: HSV and CIELAB conversion,
//! coarse color naming, CIE76 delta-E, and a calibratable dark-line
//! detector.
//!
//! # Usage
//!
//! ```ignore
//! use tcs34725::{ColorName, Gain, Tcs34725};
//!
//! let mut sensor = Tcs34725::new(i2c, delay);
//! sensor.init()?; // optional, measurements initialize lazily
//! sensor.set_gain(Gain::X4)?;
//!
//! let [r, g, b] = sensor.read_rgb()?;
//! let name = sensor.color_name()?; // e.g. ColorName::Orange
//!
//! sensor.calibrate_white()?; // over the bright surface
//! sensor.calibrate_black()?; // over the line
//! let on_line = sensor.detect_line()?;
//! ```
//!
//! # Limitations
//!
//! - Multi-channel reads other than [`Tcs34725::read_sample_burst`] issue
//!   sequential transactions; the device keeps integrating between them, so
//!   one composite sample can straddle integration cycles.
//! - One driver instance per physical sensor. The device handles a single
//!   in-flight transaction, so shared bus access must be serialized
//!   externally.
//! - The integration time is fixed at the shortest cycle (2.4 ms).
//!
//! # Testing
//!
//! The crate is `no_std` on embedded targets, but tests build with `std`
//! and run on the host against an I2C mock:
//!
//! ```bash
//! cargo test -p tcs34725
//! ```

#![cfg_attr(not(test), no_std)]

pub mod color;
pub mod driver;
pub mod regs;

// Re-export main types at crate root
pub use color::{ColorName, Hsv, Lab, RawSample, delta_e};
pub use driver::{Error, Gain, Tcs34725};
