//! Colors and brushes.
//!
//! A brush is sampled in its own normalized frame: `(u, v)` in `[0, 1]`
//! across the rectangle it paints (or the whole canvas for layers that do
//! not contain their brush). Colors serialize as `"#RRGGBB"` or
//! `"#RRGGBBAA"` strings so profile files stay hand-editable.
//!
//! # Example JSON
//!
//! ```json
//! { "type": "linear_gradient", "vertical": false, "stops": [
//!     { "offset": 0.0, "color": "#1e90ff" },
//!     { "offset": 1.0, "color": "purple" }
//! ] }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Color ────────────────────────────────────────────────────────────

/// RGBA color, straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create from HSV (h: 0-360, s: 0-1, v: 0-1).
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let h = h.rem_euclid(360.0);
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match (h / 60.0) as i32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Self::rgb(
            ((r + m) * 255.0) as u8,
            ((g + m) * 255.0) as u8,
            ((b + m) * 255.0) as u8,
        )
    }

    /// Multiply alpha by a factor in [0, 1].
    pub fn with_opacity(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            a: (self.a as f32 * f).round() as u8,
            ..self
        }
    }

    /// Linearly interpolate between two colors, alpha included.
    pub fn lerp(a: Color, b: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
        Color {
            r: mix(a.r, b.r),
            g: mix(a.g, b.g),
            b: mix(a.b, b.b),
            a: mix(a.a, b.a),
        }
    }

    /// Parse a color string: "#RRGGBB", "#RRGGBBAA", "red", "green", etc.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(hex) = s.strip_prefix('#') {
            if !hex.is_ascii() {
                return None;
            }
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            return match hex.len() {
                6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
                8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
                _ => None,
            };
        }
        match s.to_ascii_lowercase().as_str() {
            "black" => Some(Self::BLACK),
            "red" => Some(Self::rgb(255, 0, 0)),
            "green" => Some(Self::rgb(0, 255, 0)),
            "blue" => Some(Self::rgb(0, 0, 255)),
            "yellow" => Some(Self::rgb(255, 255, 0)),
            "cyan" => Some(Self::rgb(0, 255, 255)),
            "magenta" | "pink" => Some(Self::rgb(255, 0, 255)),
            "white" => Some(Self::WHITE),
            "orange" => Some(Self::rgb(255, 165, 0)),
            "purple" => Some(Self::rgb(128, 0, 255)),
            "transparent" => Some(Self::TRANSPARENT),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02x}{:02x}{:02x}{:02x}",
                self.r, self.g, self.b, self.a
            )
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::parse(&s).ok_or_else(|| format!("invalid color {s:?}"))
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl From<Color> for image::Rgba<u8> {
    fn from(c: Color) -> Self {
        image::Rgba([c.r, c.g, c.b, c.a])
    }
}

impl From<image::Rgba<u8>> for Color {
    fn from(p: image::Rgba<u8>) -> Self {
        Color::rgba(p[0], p[1], p[2], p[3])
    }
}

// ── Brush ────────────────────────────────────────────────────────────

/// One color stop of a gradient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// How a layer is painted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrushSpec {
    Solid {
        color: Color,
    },
    LinearGradient {
        stops: Vec<GradientStop>,
        /// Top to bottom instead of left to right
        #[serde(default)]
        vertical: bool,
    },
    RadialGradient {
        stops: Vec<GradientStop>,
    },
}

impl Default for BrushSpec {
    fn default() -> Self {
        BrushSpec::Solid {
            color: Color::WHITE,
        }
    }
}

impl BrushSpec {
    pub fn solid(color: Color) -> Self {
        BrushSpec::Solid { color }
    }

    pub fn horizontal(stops: Vec<GradientStop>) -> Self {
        BrushSpec::LinearGradient {
            stops,
            vertical: false,
        }
    }

    /// Check the brush can be sampled
    pub fn validate(&self) -> Result<(), String> {
        let stops = match self {
            BrushSpec::Solid { .. } => return Ok(()),
            BrushSpec::LinearGradient { stops, .. } | BrushSpec::RadialGradient { stops } => stops,
        };
        if stops.is_empty() {
            return Err("gradient has no stops".into());
        }
        if stops.iter().any(|s| !s.offset.is_finite()) {
            return Err("gradient stop offset is not finite".into());
        }
        if stops.windows(2).any(|w| w[1].offset < w[0].offset) {
            return Err("gradient stops are not ascending".into());
        }
        Ok(())
    }

    /// Color at `(u, v)` in the brush frame. Coordinates outside [0, 1]
    /// extend the edge colors.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        match self {
            BrushSpec::Solid { color } => *color,
            BrushSpec::LinearGradient { stops, vertical } => {
                sample_stops(stops, if *vertical { v } else { u })
            }
            BrushSpec::RadialGradient { stops } => {
                let (du, dv) = (u - 0.5, v - 0.5);
                let t = (du * du + dv * dv).sqrt() / 0.5;
                sample_stops(stops, t)
            }
        }
    }

    /// Representative color for listings and thumbnails
    pub fn primary_color(&self) -> Color {
        match self {
            BrushSpec::Solid { color } => *color,
            BrushSpec::LinearGradient { stops, .. } | BrushSpec::RadialGradient { stops } => {
                stops.first().map(|s| s.color).unwrap_or(Color::TRANSPARENT)
            }
        }
    }
}

/// Interpolate ascending gradient stops at `t`.
fn sample_stops(stops: &[GradientStop], t: f32) -> Color {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Color::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    if t >= last.offset {
        return last.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t < b.offset {
            let span = b.offset - a.offset;
            if span <= 0.0 {
                return b.color;
            }
            return Color::lerp(a.color, b.color, (t - a.offset) / span);
        }
    }
    last.color
}
