// animation/mod.rs - Frame animation, tweening and page transitions for the landing scene

pub mod tween;
pub mod animator;
pub mod transition;

pub use tween::*;
pub use animator::*;
pub use transition::*;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// PLAYBACK STATE
// ============================================================================

/// Tween playback control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Finished,
}

// ============================================================================
// COLOR TYPE
// ============================================================================

/// RGBA color; parsed from CSS-style strings in config files
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// 8-bit RGBA for raster output
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    fn from_hex(hex: &str) -> Option<Color> {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;

        let channel = |hi: u8, lo: u8| f32::from(hi * 16 + lo) / 255.0;
        match digits.as_slice() {
            [r, g, b] => Some(Color::rgb(
                channel(*r, *r),
                channel(*g, *g),
                channel(*b, *b),
            )),
            [r1, r0, g1, g0, b1, b0] => Some(Color::rgb(
                channel(*r1, *r0),
                channel(*g1, *g0),
                channel(*b1, *b0),
            )),
            [r1, r0, g1, g0, b1, b0, a1, a0] => Some(Color::new(
                channel(*r1, *r0),
                channel(*g1, *g0),
                channel(*b1, *b0),
                channel(*a1, *a0),
            )),
            _ => None,
        }
    }

    fn to_hex(self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl FromStr for Color {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        let named = match name.as_str() {
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "red" => Some(Color::RED),
            "green" => Some(Color::rgb(0.0, 128.0 / 255.0, 0.0)),
            "blue" => Some(Color::rgb(0.0, 0.0, 1.0)),
            "gray" | "grey" => Some(Color::rgb(128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0)),
            "transparent" => Some(Color::new(0.0, 0.0, 0.0, 0.0)),
            _ => None,
        };

        named
            .or_else(|| name.strip_prefix('#').and_then(Color::from_hex))
            .ok_or_else(|| AnimationError::InvalidParameters(format!("unrecognised color '{s}'")))
    }
}

impl TryFrom<String> for Color {
    type Error = AnimationError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> String {
        c.to_hex()
    }
}

// ============================================================================
// UTILITY FUNCTIONS
// ============================================================================

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Animation and navigation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnimationError {
    #[error("Transition to {active} already in flight")]
    TransitionInFlight { active: String },

    #[error("Center cube of matrix {matrix} has no page bound")]
    PageUnbound { matrix: usize },

    #[error("Unknown page: {0}")]
    UnknownPage(String),

    #[error("Invalid animation parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, AnimationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing() {
        assert_eq!("red".parse::<Color>().unwrap(), Color::RED);
        assert_eq!(" White ".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("#000".parse::<Color>().unwrap(), Color::BLACK);

        let c: Color = "#ff8000".parse().unwrap();
        assert_eq!(c.to_rgba8(), [255, 128, 0, 255]);

        assert!("#ggg".parse::<Color>().is_err());
        assert!("mauve-ish".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_serde_roundtrip_uses_hex() {
        let json = serde_json::to_string(&Color::RED).unwrap();
        assert_eq!(json, "\"#ff0000\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::RED);
    }
}
