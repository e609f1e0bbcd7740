//! Colours and the progression colour table
//!
//! `ColorBuckets` is an ordered set of half-open `[low, high)` intervals.
//! Coverage starts at 0 and is contiguous, which is checked when the table
//! is built rather than on every lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ComparisonError, Result};

/// An opaque RGB colour, written as `#RRGGBB` in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0]);
    pub const WHITE: Color = Color([255, 255, 255]);

    pub fn rgb(self) -> [u8; 3] {
        self.0
    }

    /// Perceptive luminance in `[0, 1]`
    pub fn luma(self) -> f64 {
        let [r, g, b] = self.0;
        (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0
    }

    /// Text and outline colours that stay readable on top of `self`.
    /// Bright backgrounds get black text with a white outline and vice versa.
    pub fn contrasting_text(self) -> (Color, Color) {
        if self.luma() > 0.5 {
            (Color::BLACK, Color::WHITE)
        } else {
            (Color::WHITE, Color::BLACK)
        }
    }
}

impl FromStr for Color {
    type Err = ComparisonError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ComparisonError::InvalidConfig(format!(
                "'{}' is not a #RRGGBB colour",
                s
            )));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| ComparisonError::InvalidConfig(format!("'{}': {}", s, e)))
        };
        Ok(Color([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl TryFrom<String> for Color {
    type Error = ComparisonError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for plotters::style::RGBColor {
    fn from(color: Color) -> Self {
        let [r, g, b] = color.0;
        plotters::style::RGBColor(r, g, b)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
    }
}

/// One `[low, high)` interval of the colour table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorBucket {
    pub low: f64,
    pub high: f64,
    pub color: Color,
}

impl ColorBucket {
    pub fn contains(&self, fraction: f64) -> bool {
        fraction >= self.low && fraction < self.high
    }
}

/// Validated, contiguous colour table over `[0, upper)`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColorBuckets {
    buckets: Vec<ColorBucket>,
}

impl ColorBuckets {
    pub fn new(buckets: Vec<ColorBucket>) -> Result<Self> {
        let first = buckets
            .first()
            .ok_or_else(|| ComparisonError::InvalidConfig("colour table is empty".to_string()))?;
        if first.low != 0.0 {
            return Err(ComparisonError::InvalidConfig(format!(
                "colour table must start at 0, found {}",
                first.low
            )));
        }

        for bucket in &buckets {
            if bucket.low.is_nan() || bucket.high.is_nan() || bucket.low >= bucket.high {
                return Err(ComparisonError::InvalidConfig(format!(
                    "colour interval [{}, {}) is empty",
                    bucket.low, bucket.high
                )));
            }
        }

        for pair in buckets.windows(2) {
            if pair[0].high != pair[1].low {
                return Err(ComparisonError::InvalidConfig(format!(
                    "colour intervals [{}, {}) and [{}, {}) are not contiguous",
                    pair[0].low, pair[0].high, pair[1].low, pair[1].high
                )));
            }
        }

        let upper = buckets[buckets.len() - 1].high;
        if upper <= 1.0 {
            return Err(ComparisonError::InvalidConfig(format!(
                "colour table must cover a full clear (1.0), upper bound is {}",
                upper
            )));
        }

        Ok(Self { buckets })
    }

    /// Upper bound of the last interval (exclusive)
    pub fn upper_bound(&self) -> f64 {
        self.buckets[self.buckets.len() - 1].high
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorBucket> {
        self.buckets.iter()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn color_for_fraction(&self, fraction: f64) -> Result<Color> {
        self.buckets
            .iter()
            .find(|b| b.contains(fraction))
            .map(|b| b.color)
            .ok_or(ComparisonError::OutOfRange {
                fraction,
                upper: self.upper_bound(),
            })
    }
}

impl Default for ColorBuckets {
    fn default() -> Self {
        let bucket = |low, high, color: [u8; 3]| ColorBucket {
            low,
            high,
            color: Color(color),
        };
        Self {
            buckets: vec![
                bucket(0.0, 0.5, [0x00, 0x00, 0x00]),
                bucket(0.5, 0.7, [0xCD, 0x7F, 0x32]),
                bucket(0.7, 0.9, [0xC0, 0xC0, 0xC0]),
                bucket(0.9, 1.01, [0xFF, 0xD7, 0x00]),
            ],
        }
    }
}

impl<'de> Deserialize<'de> for ColorBuckets {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let buckets = Vec::<ColorBucket>::deserialize(deserializer)?;
        ColorBuckets::new(buckets).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_open_boundaries() {
        let table = ColorBuckets::default();
        let low = table.color_for_fraction(0.0).unwrap();
        assert_eq!(table.color_for_fraction(0.49).unwrap(), low);
        assert_ne!(table.color_for_fraction(0.5).unwrap(), low);
        assert_eq!(table.color_for_fraction(0.5).unwrap(), Color([0xCD, 0x7F, 0x32]));
    }

    #[test]
    fn test_full_clear_resolves_and_overflow_fails() {
        let table = ColorBuckets::default();
        assert_eq!(table.color_for_fraction(1.0).unwrap(), Color([0xFF, 0xD7, 0x00]));
        assert!(matches!(
            table.color_for_fraction(1.5),
            Err(ComparisonError::OutOfRange { .. })
        ));
        assert!(matches!(
            table.color_for_fraction(-0.1),
            Err(ComparisonError::OutOfRange { .. })
        ));
        assert!(table.color_for_fraction(f64::NAN).is_err());
    }

    #[test]
    fn test_gapped_table_rejected() {
        let gap = vec![
            ColorBucket { low: 0.0, high: 0.5, color: Color::BLACK },
            ColorBucket { low: 0.6, high: 1.01, color: Color::WHITE },
        ];
        assert!(matches!(ColorBuckets::new(gap), Err(ComparisonError::InvalidConfig(_))));

        let short = vec![ColorBucket { low: 0.0, high: 1.0, color: Color::BLACK }];
        assert!(ColorBuckets::new(short).is_err());

        let offset = vec![ColorBucket { low: 0.1, high: 1.01, color: Color::BLACK }];
        assert!(ColorBuckets::new(offset).is_err());
    }

    #[test]
    fn test_hex_parsing() {
        let c: Color = "#C41E3A".parse().unwrap();
        assert_eq!(c.rgb(), [0xC4, 0x1E, 0x3A]);
        assert_eq!(c.to_string(), "#C41E3A");
        assert!("#12345".parse::<Color>().is_err());
        assert!("zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn test_contrasting_text() {
        assert_eq!(Color::WHITE.contrasting_text().0, Color::BLACK);
        let shaman: Color = "#0070DD".parse().unwrap();
        assert_eq!(shaman.contrasting_text().0, Color::WHITE);
    }
}
