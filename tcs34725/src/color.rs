//! Pure color math over raw channel counts.
//!
//! Everything here is a stateless computation on a [`RawSample`]; nothing
//! touches the bus. Samples are normalized against the full 16-bit channel
//! range, then converted to HSV for naming and to CIELAB (D65 reference
//! white) for perceptual distance.

use libm::{cbrtf, sqrtf};

/// Full-scale value of one 16-bit channel, as a float divisor.
const CHANNEL_MAX: f32 = 65535.0;

// =============================================================================
// Naming Thresholds
// =============================================================================

/// Value (brightness) below which a sample is named Black, in percent.
pub const VALUE_BLACK_MAX: f32 = 10.0;

/// Saturation below which a bright sample is named White, in percent.
pub const SAT_WHITE_MAX: f32 = 20.0;

/// Upper hue bound (exclusive) of the low Red bucket, in degrees.
pub const HUE_RED_MAX: f32 = 15.0;
/// Upper hue bound (exclusive) of Orange, in degrees.
pub const HUE_ORANGE_MAX: f32 = 45.0;
/// Upper hue bound (exclusive) of Yellow, in degrees.
pub const HUE_YELLOW_MAX: f32 = 90.0;
/// Upper hue bound (exclusive) of Green, in degrees.
pub const HUE_GREEN_MAX: f32 = 150.0;
/// Upper hue bound (exclusive) of Cyan, in degrees.
pub const HUE_CYAN_MAX: f32 = 210.0;
/// Upper hue bound (exclusive) of Blue, in degrees.
pub const HUE_BLUE_MAX: f32 = 270.0;
/// Upper hue bound (exclusive) of Magenta; hues at or above wrap back to Red.
pub const HUE_MAGENTA_MAX: f32 = 330.0;

// Compile-time validation: hue buckets must ascend, or classification breaks
const _: () = assert!(HUE_RED_MAX < HUE_ORANGE_MAX);
const _: () = assert!(HUE_ORANGE_MAX < HUE_YELLOW_MAX);
const _: () = assert!(HUE_YELLOW_MAX < HUE_GREEN_MAX);
const _: () = assert!(HUE_GREEN_MAX < HUE_CYAN_MAX);
const _: () = assert!(HUE_CYAN_MAX < HUE_BLUE_MAX);
const _: () = assert!(HUE_BLUE_MAX < HUE_MAGENTA_MAX);
const _: () = assert!(HUE_MAGENTA_MAX < 360.0);

// =============================================================================
// Raw Samples
// =============================================================================

/// One set of raw 16-bit channel counts as read from the device.
///
/// Produced fresh on every read; the driver never caches samples. Unless the
/// burst read was used, the four counts come from sequential transactions and
/// may straddle integration cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// Unfiltered (clear) channel count
    pub clear: u16,
    /// Red channel count
    pub red: u16,
    /// Green channel count
    pub green: u16,
    /// Blue channel count
    pub blue: u16,
}

impl RawSample {
    /// Convert the RGB channels to HSV over the full 16-bit range.
    ///
    /// Hue is in degrees `[0, 360)`, saturation and value in percent
    /// `[0, 100]`. Achromatic samples (r = g = b, including all-zero) report
    /// hue 0 and saturation 0.
    pub fn to_hsv(self) -> Hsv {
        let r = f32::from(self.red) / CHANNEL_MAX;
        let g = f32::from(self.green) / CHANNEL_MAX;
        let b = f32::from(self.blue) / CHANNEL_MAX;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let v = max * 100.0;
        if delta == 0.0 {
            // Hue is undefined for grays; report 0 rather than NaN
            return Hsv { h: 0.0, s: 0.0, v };
        }
        let s = delta / max * 100.0;

        // Sextant by dominant channel. The red sextant can go negative
        // (truncated remainder), wrapped into range below.
        let sextant = if max == r {
            ((g - b) / delta) % 6.0
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        let mut h = sextant * 60.0;
        if h < 0.0 {
            h += 360.0;
        }

        Hsv { h, s, v }
    }

    /// Convert the RGB channels to CIELAB against the D65 reference white.
    ///
    /// The channels are treated as linear reflectance; no gamma decoding is
    /// applied before the sRGB-to-XYZ matrix.
    pub fn to_lab(self) -> Lab {
        let r = f32::from(self.red) / CHANNEL_MAX;
        let g = f32::from(self.green) / CHANNEL_MAX;
        let b = f32::from(self.blue) / CHANNEL_MAX;

        // sRGB (D65) -> XYZ
        let x = 0.4124 * r + 0.3576 * g + 0.1805 * b;
        let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        let z = 0.0193 * r + 0.1192 * g + 0.9505 * b;

        let fx = lab_f(x / D65_XN);
        let fy = lab_f(y / D65_YN);
        let fz = lab_f(z / D65_ZN);

        Lab {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// Name the sample's color from its HSV representation.
    pub fn color_name(self) -> ColorName {
        ColorName::from_hsv(self.to_hsv())
    }
}

/// CIE76 color difference between two raw samples.
///
/// Both samples are converted to Lab and compared by Euclidean distance.
/// Identical samples yield exactly 0.
pub fn delta_e(a: RawSample, b: RawSample) -> f32 {
    a.to_lab().delta_e(b.to_lab())
}

// =============================================================================
// HSV
// =============================================================================

/// HSV representation of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hsv {
    /// Hue in degrees, `[0, 360)`
    pub h: f32,
    /// Saturation in percent, `[0, 100]`
    pub s: f32,
    /// Value (brightness) in percent, `[0, 100]`
    pub v: f32,
}

// =============================================================================
// CIELAB
// =============================================================================

/// D65 reference white in XYZ.
const D65_XN: f32 = 0.95047;
const D65_YN: f32 = 1.0;
const D65_ZN: f32 = 1.08883;

/// Boundary between the cube-root and linear regions of the Lab companding.
const LAB_EPSILON: f32 = 0.008856;

/// Lab companding function, applied per XYZ component.
fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        cbrtf(t)
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

/// CIELAB representation of a sample (D65 reference white).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Lab {
    /// Lightness, 0 (black) to 100 (reference white)
    pub l: f32,
    /// Green-red axis
    pub a: f32,
    /// Blue-yellow axis
    pub b: f32,
}

impl Lab {
    /// CIE76 color difference: Euclidean distance in Lab space.
    pub fn delta_e(self, other: Lab) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        sqrtf(dl * dl + da * da + db * db)
    }
}

// =============================================================================
// Color Naming
// =============================================================================

/// Coarse classification of a sample into a named color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorName {
    Black,
    White,
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Magenta,
}

impl ColorName {
    /// Classify an HSV sample.
    ///
    /// Brightness and saturation gates run before hue is consulted: dark
    /// samples are Black regardless of hue, desaturated bright samples are
    /// White. Hue buckets are exclusive at their upper bound and evaluated
    /// in ascending order; hues past the Magenta bound wrap back to Red.
    pub fn from_hsv(hsv: Hsv) -> Self {
        if hsv.v < VALUE_BLACK_MAX {
            return Self::Black;
        }
        if hsv.s < SAT_WHITE_MAX {
            return Self::White;
        }

        if hsv.h < HUE_RED_MAX {
            Self::Red
        } else if hsv.h < HUE_ORANGE_MAX {
            Self::Orange
        } else if hsv.h < HUE_YELLOW_MAX {
            Self::Yellow
        } else if hsv.h < HUE_GREEN_MAX {
            Self::Green
        } else if hsv.h < HUE_CYAN_MAX {
            Self::Cyan
        } else if hsv.h < HUE_BLUE_MAX {
            Self::Blue
        } else if hsv.h < HUE_MAGENTA_MAX {
            Self::Magenta
        } else {
            Self::Red
        }
    }

    /// Display string for the color.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Black => "Black",
            Self::White => "White",
            Self::Red => "Red",
            Self::Orange => "Orange",
            Self::Yellow => "Yellow",
            Self::Green => "Green",
            Self::Cyan => "Cyan",
            Self::Blue => "Blue",
            Self::Magenta => "Magenta",
        }
    }
}

impl core::fmt::Display for ColorName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
