#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Visitor survey parsing and data source loading.
//!
//! The survey export comes in two delimited layouts: a simple
//! comma-separated file with one target zone per row, and an extended
//! semicolon-separated file whose trailing columns spread each row's
//! visitors across zones as decimal-comma percentages. Income and
//! education summaries ship as separate semicolon files.

pub mod loader;
pub mod parser;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use loader::{DataSource, SurveySources, load_dataset};
pub use parser::{
    Parsed, parse_dataset, parse_education, parse_income, parse_survey, parse_visitors_extended,
    parse_visitors_simple,
};

/// Errors that can occur while loading or parsing survey data.
#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    /// The source produced no content at all.
    #[error("No data available from {source_name}")]
    DataUnavailable {
        /// File path or URL that came back empty.
        source_name: String,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The delimited text could not be tokenized.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Layout of the visitor survey file.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SurveyFormat {
    /// Comma-delimited, one zone id per row.
    #[default]
    Simple,
    /// Semicolon-delimited with per-zone percentage columns.
    Extended,
}

impl SurveyFormat {
    /// Field delimiter byte for this layout.
    #[must_use]
    pub const fn delimiter(self) -> u8 {
        match self {
            Self::Simple => b',',
            Self::Extended => b';',
        }
    }
}
