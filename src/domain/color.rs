//! Colour model and normalization.
//!
//! Backends report span colours in whatever shape their colour space
//! produced: a gray level, an RGB or CMYK tuple, or a bare number that is
//! not a device colour at all (an index into a palette, a packed integer).
//! [`normalize_color`] is the single place where those shapes become an
//! [`Rgb`].

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{PatchError, PatchResult};

/// An RGB colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLUE: Rgb = Rgb::new(0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> PatchResult<Self> {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^#?([0-9a-fA-F]{6})$").expect("Valid regex"));

        let invalid = || PatchError::Configuration {
            parameter: "color".to_string(),
            reason: format!("'{}' is not a #rrggbb colour", hex),
        };
        let caps = PATTERN.captures(hex.trim()).ok_or_else(invalid)?;
        let packed = u32::from_str_radix(&caps[1], 16).map_err(|_| invalid())?;

        let channel = |shift: u32| ((packed >> shift) & 0xff) as f32 / 255.0;
        Ok(Self::new(channel(16), channel(8), channel(0)))
    }

    fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }

    pub fn components(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b)
        )
    }
}

/// A colour value as reported by a backend, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorValue {
    /// A bare number that is not a device colour tuple.
    Scalar(f32),
    /// Components in the order of the colour space that produced them.
    Components(Vec<f32>),
}

/// Coerces a backend colour into RGB.
///
/// - 1 component: device gray
/// - 3 components: device RGB
/// - 4 components: device CMYK, converted naively
/// - a bare [`ColorValue::Scalar`] or any other tuple length: black
///
/// Components are clamped to `[0, 1]`.
pub fn normalize_color(value: &ColorValue) -> Rgb {
    match value {
        ColorValue::Scalar(_) => Rgb::BLACK,
        ColorValue::Components(c) => match c.as_slice() {
            [gray] => Rgb::new(*gray, *gray, *gray).clamped(),
            [r, g, b] => Rgb::new(*r, *g, *b).clamped(),
            [c, m, y, k] => {
                let k = k.clamp(0.0, 1.0);
                Rgb::new(
                    (1.0 - c.clamp(0.0, 1.0)) * (1.0 - k),
                    (1.0 - m.clamp(0.0, 1.0)) * (1.0 - k),
                    (1.0 - y.clamp(0.0, 1.0)) * (1.0 - k),
                )
            }
            _ => Rgb::BLACK,
        },
    }
}
