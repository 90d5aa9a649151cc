//! Blocking driver for the TCS34725 over any [`embedded_hal::i2c::I2c`] bus.
//!
//! The driver owns the bus handle and a delay provider, and brings the device
//! up lazily: the first operation (or an explicit [`Tcs34725::init`]) runs the
//! enable sequence, and every later call goes through an idempotent guard that
//! re-attempts it exactly once per call until it succeeds.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::color::{ColorName, Hsv, Lab, RawSample};
use crate::regs;

/// Settling delay after the enable sequence, before the first valid sample (ms).
const INIT_SETTLE_MS: u32 = 3;

// =============================================================================
// Errors
// =============================================================================

/// Errors returned by sensor operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The underlying I2C transaction failed.
    Bus(E),
    /// The ID register did not report a TCS34725: the sensor is absent,
    /// miswired, or a different part. Carries the value that was read.
    UnexpectedId(u16),
}

// =============================================================================
// Gain
// =============================================================================

/// Analog gain applied by the RGBC ADC.
///
/// Each variant knows its CONTROL register code and the divisor that scales
/// raw counts back to the 1x range, so a configured gain can never divide
/// by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// 1x gain
    X1,
    /// 4x gain
    X4,
    /// 16x gain
    X16,
    /// 60x gain
    X60,
}

impl Gain {
    /// CONTROL register code for this gain.
    pub const fn bits(self) -> u8 {
        match self {
            Self::X1 => 0x00,
            Self::X4 => 0x01,
            Self::X16 => 0x02,
            Self::X60 => 0x03,
        }
    }

    /// Divisor that scales raw counts back to the 1x range. Never zero.
    pub const fn divisor(self) -> u16 {
        match self {
            Self::X1 => 1,
            Self::X4 => 4,
            Self::X16 => 16,
            Self::X60 => 60,
        }
    }
}

// =============================================================================
// Driver
// =============================================================================

/// Whether the one-time enable sequence has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitState {
    /// Not brought up yet; the next operation attempts the sequence
    Pending,
    /// ID verified, oscillator and ADC running
    Ready,
}

/// Blocking TCS34725 driver.
///
/// Owns the I2C bus handle, a delay provider for the post-enable settling
/// time, and all per-device state (initialization progress, gain, line
/// calibration references). One instance per physical sensor; the device
/// supports a single in-flight transaction, so shared access has to be
/// serialized outside the driver.
pub struct Tcs34725<I2C, D> {
    i2c: I2C,
    delay: D,
    state: InitState,
    gain: Gain,
    atime: u8,
    white_ref: u16,
    black_ref: u16,
}

impl<I2C, D, E> Tcs34725<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    /// Create a driver for the sensor at the fixed `0x29` address.
    ///
    /// No bus traffic happens here. The enable sequence runs on the first
    /// operation, or eagerly via [`init`](Self::init). Until a white and a
    /// black calibration are captured, the line detection references span
    /// the full 16-bit scale.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            state: InitState::Pending,
            gain: Gain::X1,
            atime: regs::ATIME_2_4MS,
            white_ref: u16::MAX,
            black_ref: 0,
        }
    }

    /// Release the bus and delay provider, dropping all device state.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Whether the enable sequence has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.state == InitState::Ready
    }

    /// Currently configured analog gain.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Run the power-up sequence if it has not completed yet.
    ///
    /// Reads the ID register first and refuses to touch the device further
    /// when it does not report a TCS34725. On a match: oscillator on, then
    /// the RGBC ADC in a second write (the oscillator must be stable before
    /// the ADC starts, so the two bits cannot be combined), then the
    /// integration time and gain, then a blocking settling delay before the
    /// first sample is considered valid.
    ///
    /// Idempotent: once the sequence has succeeded this returns immediately.
    /// On failure no state changes, so the next operation retries from
    /// scratch.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        if self.state == InitState::Ready {
            return Ok(());
        }

        let id = self.read_register16(regs::ID)?;
        if id != regs::DEVICE_ID {
            return Err(Error::UnexpectedId(id));
        }

        self.write_register(regs::ENABLE, regs::ENABLE_PON)?;
        self.write_register(regs::ENABLE, regs::ENABLE_PON | regs::ENABLE_AEN)?;
        self.write_register(regs::ATIME, self.atime)?;
        self.write_register(regs::CONTROL, self.gain.bits())?;
        self.state = InitState::Ready;

        // First integration cycle completes in this window
        self.delay.delay_ms(INIT_SETTLE_MS);

        Ok(())
    }

    /// Set the analog gain, writing the CONTROL register.
    ///
    /// The recorded divisor feeds [`read_rgb`](Self::read_rgb); raw channel
    /// reads stay unscaled.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<E>> {
        self.init()?;
        self.write_register(regs::CONTROL, gain.bits())?;
        self.gain = gain;
        Ok(())
    }

    /// Raw clear (unfiltered) channel count.
    pub fn read_clear(&mut self) -> Result<u16, Error<E>> {
        self.init()?;
        self.read_register16(regs::CDATA)
    }

    /// Raw red channel count.
    pub fn read_red(&mut self) -> Result<u16, Error<E>> {
        self.init()?;
        self.read_register16(regs::RDATA)
    }

    /// Raw green channel count.
    pub fn read_green(&mut self) -> Result<u16, Error<E>> {
        self.init()?;
        self.read_register16(regs::GDATA)
    }

    /// Raw blue channel count.
    pub fn read_blue(&mut self) -> Result<u16, Error<E>> {
        self.init()?;
        self.read_register16(regs::BDATA)
    }

    /// Gain-compensated `[red, green, blue]` triple.
    ///
    /// Three sequential channel reads, each divided by the configured gain's
    /// divisor so readings stay comparable across gain changes.
    pub fn read_rgb(&mut self) -> Result<[u16; 3], Error<E>> {
        self.init()?;
        let div = self.gain.divisor();
        Ok([
            self.read_register16(regs::RDATA)? / div,
            self.read_register16(regs::GDATA)? / div,
            self.read_register16(regs::BDATA)? / div,
        ])
    }

    /// Read all four channels as one composite sample.
    ///
    /// Issues four sequential register reads in clear, red, green, blue
    /// order. The device keeps integrating between them, so under changing
    /// light the channels can straddle integration cycles;
    /// [`read_sample_burst`](Self::read_sample_burst) narrows that window to
    /// a single transaction.
    pub fn read_sample(&mut self) -> Result<RawSample, Error<E>> {
        self.init()?;
        Ok(RawSample {
            clear: self.read_register16(regs::CDATA)?,
            red: self.read_register16(regs::RDATA)?,
            green: self.read_register16(regs::GDATA)?,
            blue: self.read_register16(regs::BDATA)?,
        })
    }

    /// Read all four channels in one auto-incrementing transaction.
    ///
    /// A single pointer select with the auto-increment command type, then
    /// eight data bytes covering clear, red, green, blue as little-endian
    /// pairs. The closest the part gets to an atomic snapshot.
    pub fn read_sample_burst(&mut self) -> Result<RawSample, Error<E>> {
        self.init()?;
        let command = regs::COMMAND_BIT | regs::COMMAND_AUTO_INCREMENT | regs::CDATA;
        let mut buf = [0u8; 8];
        self.i2c
            .write_read(regs::I2C_ADDR, &[command], &mut buf)
            .map_err(Error::Bus)?;
        Ok(RawSample {
            clear: u16::from_le_bytes([buf[0], buf[1]]),
            red: u16::from_le_bytes([buf[2], buf[3]]),
            green: u16::from_le_bytes([buf[4], buf[5]]),
            blue: u16::from_le_bytes([buf[6], buf[7]]),
        })
    }

    /// Read a sample and convert it to HSV.
    pub fn to_hsv(&mut self) -> Result<Hsv, Error<E>> {
        Ok(self.read_sample()?.to_hsv())
    }

    /// Read a sample and convert it to CIELAB.
    pub fn to_lab(&mut self) -> Result<Lab, Error<E>> {
        Ok(self.read_sample()?.to_lab())
    }

    /// Read a sample and name its color.
    pub fn color_name(&mut self) -> Result<ColorName, Error<E>> {
        Ok(self.read_sample()?.color_name())
    }

    /// Capture the current clear reading as the white (bright surface)
    /// reference for line detection, and return it.
    pub fn calibrate_white(&mut self) -> Result<u16, Error<E>> {
        let clear = self.read_clear()?;
        self.white_ref = clear;
        Ok(clear)
    }

    /// Capture the current clear reading as the black (dark surface)
    /// reference for line detection, and return it.
    pub fn calibrate_black(&mut self) -> Result<u16, Error<E>> {
        let clear = self.read_clear()?;
        self.black_ref = clear;
        Ok(clear)
    }

    /// Compare the current clear reading against the midpoint of the
    /// calibrated references.
    ///
    /// The midpoint is the integer mean of the two references, so an odd
    /// reference sum truncates downward. `true` means the reading is
    /// strictly below the midpoint, i.e. a dark surface under the sensor by
    /// the convention set at calibration time. A reading equal to the
    /// midpoint is not a line. Works before calibration too, with the
    /// threshold sitting mid-scale.
    pub fn detect_line(&mut self) -> Result<bool, Error<E>> {
        let clear = self.read_clear()?;
        // u32 math: the reference sum can exceed u16::MAX
        let midpoint = (u32::from(self.white_ref) + u32::from(self.black_ref)) / 2;
        Ok(u32::from(clear) < midpoint)
    }

    /// Write one byte to a register. On the wire this is the command byte
    /// (command bit | register) followed by the value, i.e. the 16-bit word
    /// `(command << 8) | value` big-endian. No register validation happens
    /// at this layer.
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(regs::I2C_ADDR, &[regs::COMMAND_BIT | reg, value])
            .map_err(Error::Bus)
    }

    /// Read a 16-bit register pair: pointer select with the command byte,
    /// then two data bytes assembled little-endian (low byte first).
    fn read_register16(&mut self, reg: u8) -> Result<u16, Error<E>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(regs::I2C_ADDR, &[regs::COMMAND_BIT | reg], &mut buf)
            .map_err(Error::Bus)?;
        Ok(u16::from_le_bytes(buf))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::{CheckedDelay, NoopDelay, Transaction as DelayTransaction};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use super::*;
    use crate::regs;

    const ADDR: u8 = regs::I2C_ADDR;

    /// Bus traffic of one successful power-up with the given gain code.
    fn init_transactions(gain_bits: u8) -> Vec<I2cTransaction> {
        vec![
            // ID register answers 0x0044 (little-endian on the wire)
            I2cTransaction::write_read(ADDR, vec![0x92], vec![0x44, 0x00]),
            I2cTransaction::write(ADDR, vec![0x80, 0x01]),
            I2cTransaction::write(ADDR, vec![0x80, 0x03]),
            I2cTransaction::write(ADDR, vec![0x81, 0xFF]),
            I2cTransaction::write(ADDR, vec![0x8F, gain_bits]),
        ]
    }

    /// Pointer select plus little-endian response for one channel register.
    fn channel_read(reg: u8, value: u16) -> I2cTransaction {
        let bytes = value.to_le_bytes();
        I2cTransaction::write_read(ADDR, vec![regs::COMMAND_BIT | reg], vec![bytes[0], bytes[1]])
    }

    #[test]
    fn test_enable_word_matches_command_formula() {
        // Enabling PON|AEN transmits (0x80 << 8) | 0x03 big-endian
        let word = (u16::from(regs::COMMAND_BIT | regs::ENABLE) << 8) | 0x0003;
        assert_eq!(word, 0x8003);
        assert_eq!(word.to_be_bytes(), [0x80, 0x03]);
    }

    #[test]
    fn test_gain_codes_and_divisors() {
        assert_eq!(Gain::X1.bits(), 0x00);
        assert_eq!(Gain::X4.bits(), 0x01);
        assert_eq!(Gain::X16.bits(), 0x02);
        assert_eq!(Gain::X60.bits(), 0x03);
        assert_eq!(Gain::X1.divisor(), 1);
        assert_eq!(Gain::X4.divisor(), 4);
        assert_eq!(Gain::X16.divisor(), 16);
        assert_eq!(Gain::X60.divisor(), 60);
    }

    #[test]
    fn test_init_runs_enable_sequence_once() {
        let mut expectations = init_transactions(0x00);
        expectations.push(channel_read(regs::RDATA, 123));
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        assert!(!sensor.is_initialized());

        sensor.init().unwrap();
        assert!(sensor.is_initialized());

        // Second init and a read must not repeat the sequence
        sensor.init().unwrap();
        assert_eq!(sensor.read_red().unwrap(), 123);

        i2c.done();
    }

    #[test]
    fn test_init_blocks_for_the_settle_delay() {
        let expectations = init_transactions(0x00);
        let mut i2c = I2cMock::new(&expectations);
        let delay = CheckedDelay::new(&[DelayTransaction::blocking_delay_ms(3)]);

        let mut sensor = Tcs34725::new(i2c.clone(), delay);
        sensor.init().unwrap();

        // Repeated init is a no-op and must not delay again
        sensor.init().unwrap();

        let (_bus, mut delay) = sensor.release();
        delay.done();
        i2c.done();
    }

    #[test]
    fn test_first_measurement_initializes_lazily() {
        let mut expectations = init_transactions(0x00);
        expectations.push(channel_read(regs::CDATA, 512));
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        assert_eq!(sensor.read_clear().unwrap(), 512);
        assert!(sensor.is_initialized());

        i2c.done();
    }

    #[test]
    fn test_wrong_id_fails_without_enabling_and_retries_next_call() {
        // Two calls, one ID read each, and never any enable write
        let expectations = [
            I2cTransaction::write_read(ADDR, vec![0x92], vec![0x4D, 0x00]),
            I2cTransaction::write_read(ADDR, vec![0x92], vec![0x4D, 0x00]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        assert_eq!(sensor.read_red(), Err(Error::UnexpectedId(0x004D)));
        assert!(!sensor.is_initialized());
        assert_eq!(sensor.read_red(), Err(Error::UnexpectedId(0x004D)));
        assert!(!sensor.is_initialized());

        i2c.done();
    }

    #[test]
    fn test_bus_error_surfaces_and_leaves_state_pending() {
        let expectations = [
            I2cTransaction::write_read(ADDR, vec![0x92], vec![0x00, 0x00])
                .with_error(ErrorKind::Other),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        assert_eq!(sensor.read_clear(), Err(Error::Bus(ErrorKind::Other)));
        assert!(!sensor.is_initialized());

        i2c.done();
    }

    #[test]
    fn test_channel_reads_assemble_little_endian() {
        let mut expectations = init_transactions(0x00);
        expectations.push(I2cTransaction::write_read(
            ADDR,
            vec![0x96],
            vec![0x34, 0x12],
        ));
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        assert_eq!(sensor.read_red().unwrap(), 0x1234);

        i2c.done();
    }

    #[test]
    fn test_read_rgb_divides_by_gain_but_raw_reads_stay_unscaled() {
        let mut expectations = init_transactions(0x00);
        expectations.push(I2cTransaction::write(ADDR, vec![0x8F, 0x01]));
        expectations.push(channel_read(regs::RDATA, 4000));
        expectations.push(channel_read(regs::GDATA, 8000));
        expectations.push(channel_read(regs::BDATA, 400));
        expectations.push(channel_read(regs::RDATA, 4000));
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        sensor.set_gain(Gain::X4).unwrap();
        assert_eq!(sensor.gain(), Gain::X4);

        assert_eq!(sensor.read_rgb().unwrap(), [1000, 2000, 100]);
        assert_eq!(sensor.read_red().unwrap(), 4000);

        i2c.done();
    }

    #[test]
    fn test_read_sample_walks_channels_in_device_order() {
        let mut expectations = init_transactions(0x00);
        expectations.push(channel_read(regs::CDATA, 9000));
        expectations.push(channel_read(regs::RDATA, 1000));
        expectations.push(channel_read(regs::GDATA, 2000));
        expectations.push(channel_read(regs::BDATA, 3000));
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        assert_eq!(
            sensor.read_sample().unwrap(),
            RawSample {
                clear: 9000,
                red: 1000,
                green: 2000,
                blue: 3000,
            }
        );

        i2c.done();
    }

    #[test]
    fn test_burst_read_uses_auto_increment_framing() {
        let mut expectations = init_transactions(0x00);
        // 0xB4 = command bit | auto-increment | CDATA
        expectations.push(I2cTransaction::write_read(
            ADDR,
            vec![0xB4],
            vec![0xE8, 0x03, 0xD0, 0x07, 0xB8, 0x0B, 0xA0, 0x0F],
        ));
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        assert_eq!(
            sensor.read_sample_burst().unwrap(),
            RawSample {
                clear: 1000,
                red: 2000,
                green: 3000,
                blue: 4000,
            }
        );

        i2c.done();
    }

    #[test]
    fn test_conversions_read_one_sample_each() {
        let mut expectations = init_transactions(0x00);
        for _ in 0..3 {
            expectations.push(channel_read(regs::CDATA, 60000));
            expectations.push(channel_read(regs::RDATA, 65535));
            expectations.push(channel_read(regs::GDATA, 0));
            expectations.push(channel_read(regs::BDATA, 0));
        }
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());

        let hsv = sensor.to_hsv().unwrap();
        assert_eq!(hsv.h, 0.0);
        assert!((hsv.s - 100.0).abs() < 1e-3);

        let lab = sensor.to_lab().unwrap();
        assert!(
            (52.0..55.0).contains(&lab.l),
            "full red should land near L=53, got {}",
            lab.l
        );

        assert_eq!(sensor.color_name().unwrap(), ColorName::Red);

        i2c.done();
    }

    #[test]
    fn test_line_detection_uses_calibrated_midpoint() {
        let mut expectations = init_transactions(0x00);
        expectations.push(channel_read(regs::CDATA, 60000)); // calibrate white
        expectations.push(channel_read(regs::CDATA, 2000)); // calibrate black
        expectations.push(channel_read(regs::CDATA, 10000)); // below midpoint
        expectations.push(channel_read(regs::CDATA, 50000)); // above midpoint
        expectations.push(channel_read(regs::CDATA, 31000)); // exactly midpoint
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        assert_eq!(sensor.calibrate_white().unwrap(), 60000);
        assert_eq!(sensor.calibrate_black().unwrap(), 2000);

        // Midpoint is (60000 + 2000) / 2 = 31000
        assert!(sensor.detect_line().unwrap());
        assert!(!sensor.detect_line().unwrap());
        assert!(
            !sensor.detect_line().unwrap(),
            "reading equal to the midpoint is not a line"
        );

        i2c.done();
    }

    #[test]
    fn test_line_detection_midpoint_truncates_on_odd_reference_sum() {
        let mut expectations = init_transactions(0x00);
        expectations.push(channel_read(regs::CDATA, 60001)); // calibrate white
        expectations.push(channel_read(regs::CDATA, 2000)); // calibrate black
        expectations.push(channel_read(regs::CDATA, 31000)); // equals truncated midpoint
        expectations.push(channel_read(regs::CDATA, 30999)); // just below it
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        sensor.calibrate_white().unwrap();
        sensor.calibrate_black().unwrap();

        // (60001 + 2000) / 2 truncates to 31000
        assert!(
            !sensor.detect_line().unwrap(),
            "reading equal to the truncated midpoint is not a line"
        );
        assert!(sensor.detect_line().unwrap());

        i2c.done();
    }

    #[test]
    fn test_line_detection_before_calibration_uses_midscale() {
        let mut expectations = init_transactions(0x00);
        expectations.push(channel_read(regs::CDATA, 10000));
        expectations.push(channel_read(regs::CDATA, 40000));
        let mut i2c = I2cMock::new(&expectations);

        // Default references are 65535 and 0, threshold 32767
        let mut sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        assert!(sensor.detect_line().unwrap());
        assert!(!sensor.detect_line().unwrap());

        i2c.done();
    }

    #[test]
    fn test_release_returns_bus_and_delay() {
        let mut i2c = I2cMock::new(&[]);
        let sensor = Tcs34725::new(i2c.clone(), NoopDelay::new());
        let (bus, _delay) = sensor.release();
        drop(bus);
        i2c.done();
    }
}
