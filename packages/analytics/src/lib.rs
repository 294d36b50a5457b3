#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filtering, per-zone aggregation and heat-scale coloring of survey data.
//!
//! The whole pipeline is pure: [`derive::derive`] turns a dataset and a
//! [`FilterConfig`](mobility_map_analytics_models::FilterConfig) into an
//! [`AggregateView`](mobility_map_analytics_models::AggregateView), and
//! [`derive::ViewCache`] memoizes it so repeated renders with an unchanged
//! filter do no work.

pub mod aggregate;
pub mod color;
pub mod derive;
pub mod filter;
pub mod playback;

use thiserror::Error;

/// Errors that can occur during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// Min/max were requested over a usage with no zones.
    #[error("Cannot compute min/max of an empty aggregation")]
    EmptyAggregation,

    /// Normalization range has zero width (every zone has the same count).
    #[error("Cannot normalize into a degenerate range (min == max == {value})")]
    DegenerateRange {
        /// The shared min and max.
        value: u64,
    },
}
