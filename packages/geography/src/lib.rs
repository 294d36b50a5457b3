#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reprojection of zone polygons into host project coordinates.
//!
//! Zone boundaries are published as WGS84 `GeoJSON`. The host application
//! works in a planar projection local to each project, so every vertex is
//! projected with the project's PROJ string and then shifted by the
//! project's reference point before the polygons are handed to the
//! renderer.

pub mod projection;
pub mod reproject;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use projection::{Projector, WGS84};
pub use reproject::{parse_feature_collection, reproject_polygons};

/// Errors that can occur during geography operations.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// A feature's geometry is not a polygon.
    #[error("Unsupported geometry {geometry_type} on feature {index} (id {id:?}): only Polygon features are supported")]
    UnsupportedGeometry {
        /// Position of the feature in its collection.
        index: usize,
        /// The feature's id, if it has one.
        id: Option<String>,
        /// `GeoJSON` type name of the rejected geometry.
        geometry_type: String,
    },

    /// The projection definition is invalid or a point could not be
    /// transformed.
    #[error("Projection error: {message}")]
    Projection {
        /// Description of what went wrong.
        message: String,
    },

    /// `GeoJSON` parsing or conversion failed.
    #[error("GeoJSON error: {0}")]
    Geojson(#[from] geojson::Error),
}

/// The host project's coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProjectContext {
    /// PROJ definition of the project's planar coordinate system.
    pub projection: String,
    /// Project origin in projected coordinates.
    pub reference_point: [f64; 2],
}
