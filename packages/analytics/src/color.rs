//! Heat-scale coloring.
//!
//! Normalized usage runs from blue (`0.0`, hue 240) to red (`1.0`, hue 0)
//! at full saturation and half lightness.

use std::collections::BTreeMap;
use std::fmt;

use mobility_map_analytics_models::ZoneUsage;
use mobility_map_survey_models::ZoneId;

use crate::aggregate::{normalize, usage_stats};

/// Hue of the coldest end of the scale, in degrees.
const COLD_HUE: f64 = 240.0;

const SATURATION: u8 = 100;
const LIGHTNESS: u8 = 50;

/// Normalized value every zone gets when all zones share one count.
const FLAT_RANGE_VALUE: f64 = 1.0;

/// An HSL color. Displays as `hsl(h,s%,l%)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatColor {
    /// Hue in degrees.
    pub hue: f64,
    /// Saturation percentage.
    pub saturation: u8,
    /// Lightness percentage.
    pub lightness: u8,
}

impl fmt::Display for HeatColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({},{}%,{}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// Color for a normalized value.
///
/// Values are not clamped: anything outside `[0, 1]` yields a hue outside
/// `0..=240`.
#[must_use]
pub fn heat_color(value: f64) -> HeatColor {
    HeatColor {
        hue: (1.0 - value) * COLD_HUE,
        saturation: SATURATION,
        lightness: LIGHTNESS,
    }
}

/// Color of every zone in a usage, scaled between its min and max.
///
/// An empty usage has no colors. When every zone has the same count there
/// is no range to scale over, so every zone gets the hot end of the scale.
#[must_use]
pub fn zone_colors(usage: &ZoneUsage) -> BTreeMap<ZoneId, HeatColor> {
    let Ok(stats) = usage_stats(usage) else {
        return BTreeMap::new();
    };

    usage
        .iter()
        .map(|(zone, count)| {
            let value = normalize(count, &stats).unwrap_or(FLAT_RANGE_VALUE);
            (zone, heat_color(value))
        })
        .collect()
}
