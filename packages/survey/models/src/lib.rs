#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Visitor survey record types and demographic enumerations.
//!
//! These types describe one load of the mobility survey: per-row visitor
//! counts with their demographic breakdown, plus the auxiliary income and
//! education statistics shown in the dashboard's summary tables. Records
//! are immutable once parsed and are only ever filtered into derived views.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Zone identifier used by the distribution columns and the zone polygons.
pub type ZoneId = u32;

/// Lowest age covered by the open-ended top bucket.
pub const TOP_BUCKET_AGE: i32 = 65;

/// Age bracket of a survey respondent.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AgeRange {
    /// 18 to 24 years
    #[serde(rename = "18-24")]
    #[strum(serialize = "18-24")]
    From18To24,
    /// 25 to 34 years
    #[serde(rename = "25-34")]
    #[strum(serialize = "25-34")]
    From25To34,
    /// 35 to 44 years
    #[serde(rename = "35-44")]
    #[strum(serialize = "35-44")]
    From35To44,
    /// 45 to 54 years
    #[serde(rename = "45-54")]
    #[strum(serialize = "45-54")]
    From45To54,
    /// 55 to 64 years
    #[serde(rename = "55-64")]
    #[strum(serialize = "55-64")]
    From55To64,
    /// 65 and older. Some exports label this bucket plain `65`.
    #[serde(rename = "65+", alias = "65")]
    #[strum(to_string = "65+", serialize = "65")]
    Over65,
    /// Age not reported
    #[serde(rename = "N/A")]
    #[strum(serialize = "N/A")]
    Unknown,
}

impl AgeRange {
    /// Inclusive `(low, high)` ages of a closed bucket.
    ///
    /// Returns `None` for the open-ended top bucket and for the unknown
    /// sentinel.
    #[must_use]
    pub const fn bounds(self) -> Option<(i32, i32)> {
        match self {
            Self::From18To24 => Some((18, 24)),
            Self::From25To34 => Some((25, 34)),
            Self::From35To44 => Some((35, 44)),
            Self::From45To54 => Some((45, 54)),
            Self::From55To64 => Some((55, 64)),
            Self::Over65 | Self::Unknown => None,
        }
    }

    /// Whether this is the open-ended top bucket.
    #[must_use]
    pub const fn is_top(self) -> bool {
        matches!(self, Self::Over65)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::From18To24,
            Self::From25To34,
            Self::From35To44,
            Self::From45To54,
            Self::From55To64,
            Self::Over65,
            Self::Unknown,
        ]
    }
}

/// Gender of a survey respondent.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Gender {
    #[serde(rename = "M")]
    #[strum(serialize = "M")]
    Male,
    #[serde(rename = "F")]
    #[strum(serialize = "F")]
    Female,
    #[serde(rename = "N")]
    #[strum(serialize = "N")]
    NonBinary,
    /// Gender not given
    #[serde(rename = "none")]
    #[strum(serialize = "none")]
    Unspecified,
}

impl Gender {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Male, Self::Female, Self::NonBinary, Self::Unspecified]
    }
}

/// Why a respondent was in the surveyed area.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum VisitorType {
    #[serde(rename = "Commuter")]
    #[strum(serialize = "Commuter")]
    Commuter,
    #[serde(rename = "in-transit")]
    #[strum(serialize = "in-transit")]
    InTransit,
    #[serde(rename = "One day visitor")]
    #[strum(serialize = "One day visitor")]
    OneDayVisitor,
    #[serde(rename = "Overnight visitor")]
    #[strum(serialize = "Overnight visitor")]
    OvernightVisitor,
    #[serde(rename = "Potential event visitor")]
    #[strum(serialize = "Potential event visitor")]
    PotentialEventVisitor,
    #[serde(rename = "Resident")]
    #[strum(serialize = "Resident")]
    Resident,
    #[serde(rename = "Short term visitor")]
    #[strum(serialize = "Short term visitor")]
    ShortTermVisitor,
}

impl VisitorType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Commuter,
            Self::InTransit,
            Self::OneDayVisitor,
            Self::OvernightVisitor,
            Self::PotentialEventVisitor,
            Self::Resident,
            Self::ShortTermVisitor,
        ]
    }
}

/// One row of the visitor survey.
///
/// Numeric columns that could not be parsed are `None`; the offending
/// value is reported in [`SurveyDataset::malformed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
    /// Survey location label.
    pub location: String,
    /// Hour the count was taken.
    pub timestamp: Option<NaiveDateTime>,
    /// Whether the visitors are domestic.
    pub domestic: bool,
    /// Catchment area label.
    pub catchment: String,
    pub age_range: AgeRange,
    pub gender: Gender,
    /// `None` when the label is not one of the known visitor types.
    pub visitor_type: Option<VisitorType>,
    /// Number of visitors the row stands for.
    pub visitor_count: Option<u64>,
    /// Target zone (simple format only).
    pub zone_id: Option<ZoneId>,
    /// Headcount per zone (extended format only). Never holds a zero count.
    pub distribution: Option<BTreeMap<ZoneId, u64>>,
}

/// Average income of one age bracket at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStat {
    pub location: String,
    pub year: Option<i32>,
    pub age_range: AgeRange,
    /// Number of respondents in the bracket.
    pub count: Option<u64>,
    pub average_income: Option<f64>,
}

/// Respondent count for one highest-education level within an age bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationStat {
    pub location: String,
    pub year: Option<i32>,
    pub age_range: AgeRange,
    pub count: Option<u64>,
    /// Highest completed education level label.
    pub education_level: String,
}

/// A field that could not be parsed into its column's type.
///
/// Malformed fields never abort a parse; they are collected alongside the
/// records so callers can decide how loudly to report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("malformed {column} value {value:?} on line {line}")]
pub struct MalformedField {
    /// 1-based line number in the source text.
    pub line: u64,
    /// Column name (or `zone <index>` for distribution columns).
    pub column: String,
    /// The raw field text.
    pub value: String,
}

/// Everything produced by one data load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDataset {
    pub visitors: Vec<VisitorRecord>,
    pub income: Vec<IncomeStat>,
    pub education: Vec<EducationStat>,
    /// Fields that were replaced by `None` or a sentinel while parsing.
    pub malformed: Vec<MalformedField>,
}

impl SurveyDataset {
    /// Whether the load produced no records of any kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty() && self.income.is_empty() && self.education.is_empty()
    }
}
