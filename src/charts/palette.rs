//! Color ramp shared by the map layer, the static render and the legend.

use crate::hex::ValueRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaletteError {
    #[error("Color scheme must contain at least one color")]
    Empty,
    #[error("Color must have 3 or 4 channels, got {0}")]
    ChannelCount(usize),
}

/// One RGBA color. Serialized as `[r, g, b, a]`; `[r, g, b]` is accepted
/// on input and gets full opacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }

    pub fn a(&self) -> u8 {
        self.0[3]
    }

    /// CSS `rgba(...)` with the alpha channel as a fraction.
    pub fn to_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            self.r(),
            self.g(),
            self.b(),
            self.a() as f64 / 255.0
        )
    }
}

impl TryFrom<Vec<u8>> for Rgba {
    type Error = PaletteError;

    fn try_from(channels: Vec<u8>) -> Result<Self, Self::Error> {
        match channels.as_slice() {
            &[r, g, b] => Ok(Self::rgb(r, g, b)),
            &[r, g, b, a] => Ok(Self::rgba(r, g, b, a)),
            other => Err(PaletteError::ChannelCount(other.len())),
        }
    }
}

impl From<Rgba> for Vec<u8> {
    fn from(color: Rgba) -> Self {
        color.0.to_vec()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r(), self.g(), self.b())
    }
}

/// Inferno-style ramp from near-black to pale yellow.
const DEFAULT_SCHEME: [Rgba; 12] = [
    Rgba::rgba(0, 0, 4, 223),
    Rgba::rgba(20, 11, 53, 239),
    Rgba::rgb(58, 9, 99),
    Rgba::rgb(96, 19, 110),
    Rgba::rgb(133, 33, 107),
    Rgba::rgb(169, 46, 94),
    Rgba::rgb(203, 65, 73),
    Rgba::rgb(230, 93, 47),
    Rgba::rgb(247, 131, 17),
    Rgba::rgb(252, 173, 18),
    Rgba::rgb(245, 219, 75),
    Rgba::rgb(252, 255, 164),
];

/// Ordered, non-empty list of colors, low values first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Rgba>", into = "Vec<Rgba>")]
pub struct ColorScheme {
    colors: Vec<Rgba>,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            colors: DEFAULT_SCHEME.to_vec(),
        }
    }
}

impl ColorScheme {
    pub fn new(colors: Vec<Rgba>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        Ok(Self { colors })
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Never true for a scheme built through [`ColorScheme::new`].
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn first(&self) -> Rgba {
        self.colors[0]
    }

    pub fn last(&self) -> Rgba {
        self.colors[self.colors.len() - 1]
    }

    /// Color of the equal-width class of `range` that contains `value`.
    ///
    /// A zero-width range maps everything to the first color.
    pub fn color_for(&self, value: f64, range: ValueRange) -> Rgba {
        self.colors[self.class_index(value, range)]
    }

    /// Index of the class containing `value`, clamped to the scheme.
    pub fn class_index(&self, value: f64, range: ValueRange) -> usize {
        if range.is_degenerate() || !value.is_finite() {
            return 0;
        }
        let n = self.colors.len();
        let t = ((value - range.min) / range.width()).clamp(0.0, 1.0);
        ((t * n as f64) as usize).min(n - 1)
    }
}

impl TryFrom<Vec<Rgba>> for ColorScheme {
    type Error = PaletteError;

    fn try_from(colors: Vec<Rgba>) -> Result<Self, Self::Error> {
        Self::new(colors)
    }
}

impl From<ColorScheme> for Vec<Rgba> {
    fn from(scheme: ColorScheme) -> Self {
        scheme.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: f64, max: f64) -> ValueRange {
        ValueRange { min, max }
    }

    #[test]
    fn default_scheme_has_twelve_colors() {
        let scheme = ColorScheme::default();
        assert_eq!(scheme.len(), 12);
        assert_eq!(scheme.first(), Rgba::rgba(0, 0, 4, 223));
        assert_eq!(scheme.last(), Rgba::rgb(252, 255, 164));
        assert_eq!(scheme.colors()[2].a(), 255);
    }

    #[test]
    fn empty_scheme_is_rejected() {
        assert_eq!(ColorScheme::new(Vec::new()), Err(PaletteError::Empty));
    }

    #[test]
    fn colors_parse_from_three_or_four_channels() {
        let scheme: ColorScheme = serde_json::from_str("[[1, 2, 3], [4, 5, 6, 7]]").unwrap();
        assert_eq!(scheme.colors(), &[Rgba::rgb(1, 2, 3), Rgba::rgba(4, 5, 6, 7)]);

        assert!(serde_json::from_str::<ColorScheme>("[[1, 2]]").is_err());
        assert!(serde_json::from_str::<ColorScheme>("[]").is_err());
    }

    #[test]
    fn color_for_spans_the_ramp() {
        let scheme = ColorScheme::default();
        let r = range(10.0, 130.0);
        assert_eq!(scheme.color_for(10.0, r), scheme.first());
        assert_eq!(scheme.color_for(130.0, r), scheme.last());
        assert_eq!(scheme.class_index(25.0, r), 1);
        assert_eq!(scheme.class_index(-5.0, r), 0);
    }

    #[test]
    fn degenerate_range_uses_first_color() {
        let scheme = ColorScheme::default();
        assert_eq!(scheme.color_for(3.0, range(3.0, 3.0)), scheme.first());
    }

    #[test]
    fn css_and_hex_formatting() {
        let c = Rgba::rgba(255, 0, 16, 255);
        assert_eq!(c.to_css(), "rgba(255, 0, 16, 1.000)");
        assert_eq!(c.to_string(), "#ff0010");
    }
}
