//! Color gradients sampled along the length of the ribbon.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, RibbonError};

/// An RGB color with components in `[0.0, 1.0]`.
///
/// Serialized as a `#rrggbb` string so presets stay hand-editable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(RibbonError::InvalidColor(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| RibbonError::InvalidColor(hex.to_string()))
        };

        Ok(Self::from_rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_rgb8(&self) -> [u8; 3] {
        [
            (self.r * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.g * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.b * 255.0).round().clamp(0.0, 255.0) as u8,
        ]
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Component-wise linear interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.to_rgb8();
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl TryFrom<String> for Color {
    type Error = RibbonError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f32,
    pub color: Color,
}

impl GradientStop {
    pub fn new(position: f32, color: Color) -> Self {
        Self { position, color }
    }
}

/// A non-empty list of stops sorted ascending by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<GradientStop>,
}

impl Gradient {
    /// Builds a gradient, sorting the stops by position.
    ///
    /// The sort is stable, so stops sharing a position keep their relative
    /// order and the first of them wins lookups at that position.
    pub fn new(mut stops: Vec<GradientStop>) -> Result<Self> {
        if stops.is_empty() {
            return Err(RibbonError::InvalidGradient(
                "gradient requires at least one stop".to_string(),
            ));
        }
        if let Some(stop) = stops.iter().find(|stop| !stop.position.is_finite()) {
            return Err(RibbonError::InvalidGradient(format!(
                "stop position {} is not finite",
                stop.position
            )));
        }

        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Ok(Self { stops })
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Color at normalized position `t`.
    ///
    /// The first consecutive pair of stops whose positions enclose `t` is
    /// interpolated. Outside the covered range the nearest end pair is used
    /// with the local factor clamped, which yields the end stop's color.
    pub fn color_at(&self, t: f32) -> Color {
        let stops = &self.stops;
        if stops.len() == 1 {
            return stops[0].color;
        }

        let (start, end) = stops
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .find(|(start, end)| start.position <= t && t <= end.position)
            .unwrap_or_else(|| {
                if t < stops[0].position {
                    (stops[0], stops[1])
                } else {
                    (stops[stops.len() - 2], stops[stops.len() - 1])
                }
            });

        let span = end.position - start.position;
        let local = if span > 0.0 {
            (t - start.position) / span
        } else if t > end.position {
            1.0
        } else {
            0.0
        };

        start.color.lerp(&end.color, local)
    }
}
