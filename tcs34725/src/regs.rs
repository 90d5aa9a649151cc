//! TCS34725 register map and command protocol constants.
//!
//! Every register access sends a command byte first: the command bit (bit 7)
//! ORed with the register address in the low bits. The 16-bit channel data
//! registers are little-endian byte pairs at consecutive addresses.

/// Fixed 7-bit I2C address. The TCS34725 has no address pins.
pub const I2C_ADDR: u8 = 0x29;

/// Command bit, ORed into every register address on the wire.
pub const COMMAND_BIT: u8 = 0x80;

/// Command TYPE field selecting auto-increment addressing for burst reads.
pub const COMMAND_AUTO_INCREMENT: u8 = 0x20;

// Register addresses
/// Enable register (oscillator and ADC control)
pub const ENABLE: u8 = 0x00;
/// RGBC integration time
pub const ATIME: u8 = 0x01;
/// Analog gain control
pub const CONTROL: u8 = 0x0F;
/// Device ID
pub const ID: u8 = 0x12;
/// Clear channel data, low byte (16-bit little-endian pair)
pub const CDATA: u8 = 0x14;
/// Red channel data, low byte
pub const RDATA: u8 = 0x16;
/// Green channel data, low byte
pub const GDATA: u8 = 0x18;
/// Blue channel data, low byte
pub const BDATA: u8 = 0x1A;

// ENABLE register bits
/// Power on: starts the internal oscillator
pub const ENABLE_PON: u8 = 0x01;
/// ADC enable: starts the RGBC measurement cycle (oscillator must already run)
pub const ENABLE_AEN: u8 = 0x02;

/// ID register value reported by a TCS34725, as a 16-bit read.
pub const DEVICE_ID: u16 = 0x0044;

/// ATIME code for the shortest integration cycle (2.4 ms).
pub const ATIME_2_4MS: u8 = 0xFF;

// The burst read walks CDATA..=BDATA+1 in one transaction and relies on the
// channel pairs being adjacent.
const _: () = assert!(RDATA == CDATA + 2);
const _: () = assert!(GDATA == RDATA + 2);
const _: () = assert!(BDATA == GDATA + 2);
