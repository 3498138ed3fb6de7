//! Player colors.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// RGB color, carried on the wire as a `"#RRGGBB"` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Derive a stable color from a player id.
    ///
    /// Hues are spread by the golden angle so consecutive ids land far
    /// apart on the color wheel; the same id always yields the same color.
    pub fn from_id(id: u32) -> Self {
        let hue = (id as f32 * 137.508) % 360.0;
        Self::from_hsv(hue, 0.62, 0.95)
    }

    /// Convert an HSV triple (h in degrees, s and v in [0, 1]) to RGB.
    fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match h {
            h if h < 60.0 => (c, x, 0.0),
            h if h < 120.0 => (x, c, 0.0),
            h if h < 180.0 => (0.0, c, x),
            h if h < 240.0 => (0.0, x, c),
            h if h < 300.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Self::new(
            ((r + m) * 255.0).round() as u8,
            ((g + m) * 255.0).round() as u8,
            ((b + m) * 255.0).round() as u8,
        )
    }

    /// Format as `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parse a `#RRGGBB` string.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::new(r, g, b))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = Color;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a #RRGGBB color string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Color, E> {
                Color::parse_hex(v).ok_or_else(|| E::custom(format!("invalid color: {v:?}")))
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_is_deterministic() {
        assert_eq!(Color::from_id(7), Color::from_id(7));
        assert_ne!(Color::from_id(1), Color::from_id(2));
    }

    #[test]
    fn test_hex_round_trip() {
        let c = Color::new(0x12, 0xAB, 0xFF);
        assert_eq!(Color::parse_hex(&c.to_hex()), Some(c));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Color::parse_hex("12ABFF"), None);
        assert_eq!(Color::parse_hex("#12AB"), None);
        assert_eq!(Color::parse_hex("#12ABZZ"), None);
    }
}
