//! Deterministic group colors.
//!
//! A group id is read as a base-16 integer and reduced modulo 360 to a hue,
//! so the same group gets the same color in every chart and table without
//! any shared registry.

use std::fmt;

use iced::Color;

/// Saturation and lightness shared by all group colors.
const SATURATION: f32 = 0.5;
const LIGHTNESS: f32 = 0.5;

/// An HSL color with fixed 50% saturation and lightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupColor {
    hue: u16,
}

impl GroupColor {
    /// Hue in degrees, `0..360`.
    pub fn hue(&self) -> u16 {
        self.hue
    }

    /// Convert to an RGB color for drawing.
    pub fn to_color(self) -> Color {
        let (r, g, b) = hsl_to_rgb(self.hue as f32, SATURATION, LIGHTNESS);
        Color::from_rgb(r, g, b)
    }
}

impl fmt::Display for GroupColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, 50%, 50%)", self.hue)
    }
}

impl From<GroupColor> for Color {
    fn from(color: GroupColor) -> Self {
        color.to_color()
    }
}

/// Color for a group id.
///
/// Parsing is lenient: leading whitespace, a sign and a `0x` prefix are
/// accepted and parsing stops at the first non-hex character. Ids with no
/// leading hex digit get hue 0.
pub fn color_for(group_id: &str) -> GroupColor {
    GroupColor {
        hue: hue_for(group_id),
    }
}

fn hue_for(group_id: &str) -> u16 {
    let mut digits = group_id.trim_start();

    let negative = match digits.as_bytes().first() {
        Some(b'-') => {
            digits = &digits[1..];
            true
        }
        Some(b'+') => {
            digits = &digits[1..];
            false
        }
        _ => false,
    };

    if let Some(rest) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        digits = rest;
    }

    // Reduce digit by digit so ids of any length stay in range.
    let hue = digits
        .chars()
        .map_while(|c| c.to_digit(16))
        .fold(0u32, |acc, digit| (acc * 16 + digit) % 360);

    let hue = if negative { (360 - hue) % 360 } else { hue };
    hue as u16
}

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> (f32, f32, f32) {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());

    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let m = lightness - chroma / 2.0;
    (r + m, g + m, b + m)
}
