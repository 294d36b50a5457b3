//! Dashboard configuration.
//!
//! A default configuration is baked into the binary at compile time via
//! [`include_str!`]; hosts can load their own from a TOML file instead.

use std::path::Path;

use chrono::NaiveDateTime;
use mobility_map_analytics_models::{DateWindow, FilterConfig};
use mobility_map_geography::ProjectContext;
use mobility_map_survey::{DataSource, SurveySources};
use serde::{Deserialize, Serialize};

use crate::DashboardError;

/// Configuration embedded at compile time.
const DEFAULT_TOML: &str = include_str!("../config/default.toml");

const fn default_tick_ms() -> u64 {
    1000
}

/// Hour-by-hour playback settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PlaybackConfig {
    /// First hour played.
    pub start: NaiveDateTime,
    /// Playback wraps back to `start` on reaching this hour.
    pub end: NaiveDateTime,
    /// Interval of the host's playback timer, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Everything the dashboard needs to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardConfig {
    /// Survey files to load.
    pub data: SurveySources,
    /// Zone boundary `GeoJSON` in WGS84.
    #[serde(default)]
    pub zones: Option<DataSource>,
    /// Host project coordinate system. Zones are not rendered without one.
    #[serde(default)]
    pub project: Option<ProjectContext>,
    /// Fixed time window applied when the initial filter has none.
    #[serde(default)]
    pub demo_window: Option<DateWindow>,
    #[serde(default)]
    pub playback: Option<PlaybackConfig>,
    /// Filter selected when the dashboard opens.
    #[serde(default)]
    pub filter: FilterConfig,
}

impl DashboardConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// * If the TOML is malformed or missing required fields
    pub fn from_toml(text: &str) -> Result<Self, DashboardError> {
        Ok(toml::de::from_str(text)?)
    }

    /// The configuration shipped with the dashboard.
    ///
    /// # Errors
    ///
    /// * If the embedded TOML does not parse
    pub fn embedded_default() -> Result<Self, DashboardError> {
        Self::from_toml(DEFAULT_TOML)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If its contents are not a valid configuration
    pub fn from_file(path: &Path) -> Result<Self, DashboardError> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loaded dashboard config from {}", path.display());
        Self::from_toml(&text)
    }

    /// The filter the dashboard starts with.
    #[must_use]
    pub fn initial_filter(&self) -> FilterConfig {
        let mut filter = self.filter.clone();
        if filter.date_window.is_none() {
            filter.date_window = self.demo_window;
        }
        filter
    }
}
