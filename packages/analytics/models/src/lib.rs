#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter configuration and aggregate view types.
//!
//! A [`FilterConfig`] is the user's current selection in the dashboard.
//! Applying it to a survey dataset produces an [`AggregateView`]: the
//! per-zone visitor totals that drive the heat map plus the summary
//! tables shown next to it.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use mobility_map_survey_models::{Gender, IncomeStat, VisitorType, ZoneId};
use serde::{Deserialize, Serialize};

/// Default inclusive lower age bound.
pub const DEFAULT_AGE_FROM: i32 = 0;

/// Default inclusive upper age bound.
pub const DEFAULT_AGE_TO: i32 = 100;

/// Half-open time window, `start <= t < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateWindow {
    /// The one-hour window starting at `start`.
    #[must_use]
    pub fn hour_starting(start: NaiveDateTime) -> Self {
        Self {
            start,
            end: start + Duration::hours(1),
        }
    }

    /// Whether `timestamp` falls inside the window.
    #[must_use]
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp < self.end
    }
}

/// The user's current filter selection.
///
/// Compared and hashed by value so it can key a memoized derivation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    /// Inclusive lower age bound.
    pub age_from: i32,
    /// Inclusive upper age bound.
    pub age_to: i32,
    /// Only this gender, when set.
    pub gender: Option<Gender>,
    /// Only this visitor type, when set.
    pub visitor_type: Option<VisitorType>,
    /// Only records timestamped inside this window, when set.
    pub date_window: Option<DateWindow>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            age_from: DEFAULT_AGE_FROM,
            age_to: DEFAULT_AGE_TO,
            gender: None,
            visitor_type: None,
            date_window: None,
        }
    }
}

/// How visitor records are turned into per-zone totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Each record adds its visitor count to its single zone.
    #[default]
    Direct,
    /// Each record adds every headcount of its zone distribution.
    Distribution,
}

/// Accumulated visitor count per zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneUsage(BTreeMap<ZoneId, u64>);

impl ZoneUsage {
    /// Adds `count` visitors to `zone`. Totals saturate at `u64::MAX`.
    pub fn add(&mut self, zone: ZoneId, count: u64) {
        let total = self.0.entry(zone).or_insert(0);
        *total = total.saturating_add(count);
    }

    #[must_use]
    pub fn get(&self, zone: ZoneId) -> Option<u64> {
        self.0.get(&zone).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, u64)> + '_ {
        self.0.iter().map(|(zone, count)| (*zone, *count))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<ZoneId, u64>> for ZoneUsage {
    fn from(map: BTreeMap<ZoneId, u64>) -> Self {
        Self(map)
    }
}

impl FromIterator<(ZoneId, u64)> for ZoneUsage {
    fn from_iter<I: IntoIterator<Item = (ZoneId, u64)>>(iter: I) -> Self {
        let mut usage = Self::default();
        for (zone, count) in iter {
            usage.add(zone, count);
        }
        usage
    }
}

/// Range and total of a [`ZoneUsage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub min: u64,
    pub max: u64,
    pub sum: u64,
}

/// Everything the dashboard shows for one dataset and filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateView {
    pub usage: ZoneUsage,
    /// `None` when no zone received any visitors.
    pub stats: Option<UsageStats>,
    /// Heat-scale color per zone.
    pub colors: BTreeMap<ZoneId, String>,
    /// Income rows of the matching age brackets, in source order.
    pub income: Vec<IncomeStat>,
    /// Respondents per highest education level across matching brackets.
    pub education: BTreeMap<String, u64>,
    /// Visitor records that passed the filter.
    pub matched_records: usize,
    /// Matching records that contributed nothing because a count or zone
    /// was malformed.
    pub skipped_records: usize,
}
