//! Polygon feature reprojection.

use std::collections::BTreeMap;

use geo::{Coord, MapCoords as _, Polygon};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};

use crate::{GeographyError, ProjectContext, Projector};

/// Color used when neither the color map nor the feature names one.
pub const DEFAULT_COLOR: &str = "#000000";

/// Parses a `GeoJSON` `FeatureCollection`.
///
/// # Errors
///
/// * If the text is not valid `GeoJSON` or not a feature collection
pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection, GeographyError> {
    let geojson: GeoJson = text.parse()?;
    Ok(FeatureCollection::try_from(geojson)?)
}

/// Projects every polygon vertex into project-local coordinates.
///
/// Each vertex is projected with the project's PROJ definition and then
/// shifted so the project's reference point becomes the origin. The input
/// is left untouched; bounding boxes are dropped from the output because
/// they would describe the old coordinates.
///
/// When `colors` is given, every feature gets `stroke` and `fill`
/// properties: the color mapped to its numeric id, else its own `stroke`
/// property, else [`DEFAULT_COLOR`].
///
/// # Errors
///
/// * [`GeographyError::UnsupportedGeometry`] for any feature whose geometry
///   is missing or not a `Polygon`
/// * [`GeographyError::Projection`] if the projection is invalid or a
///   vertex cannot be projected
pub fn reproject_polygons(
    collection: &FeatureCollection,
    project: &ProjectContext,
    colors: Option<&BTreeMap<u32, String>>,
) -> Result<FeatureCollection, GeographyError> {
    let projector = Projector::new(&project.projection)?;

    let features = collection
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            reproject_feature(index, feature, &projector, project.reference_point, colors)
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "Reprojected {} features into {}",
        features.len(),
        projector.definition()
    );

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: collection.foreign_members.clone(),
    })
}

fn reproject_feature(
    index: usize,
    feature: &Feature,
    projector: &Projector,
    [ref_x, ref_y]: [f64; 2],
    colors: Option<&BTreeMap<u32, String>>,
) -> Result<Feature, GeographyError> {
    let unsupported = |geometry_type: &str| GeographyError::UnsupportedGeometry {
        index,
        id: feature.id.as_ref().map(id_string),
        geometry_type: geometry_type.to_string(),
    };

    let geometry = feature.geometry.as_ref().ok_or_else(|| unsupported("none"))?;
    if !matches!(geometry.value, Value::Polygon(_)) {
        return Err(unsupported(type_name(&geometry.value)));
    }

    let polygon = Polygon::<f64>::try_from(geometry.value.clone())?;
    let local = polygon.try_map_coords(|coord: Coord<f64>| -> Result<Coord<f64>, GeographyError> {
        let (x, y) = projector.project(coord.x, coord.y)?;
        Ok(Coord {
            x: x - ref_x,
            y: y - ref_y,
        })
    })?;

    let mut projected = feature.clone();
    projected.bbox = None;
    projected.geometry = Some(Geometry {
        bbox: None,
        value: Value::from(&local),
        foreign_members: geometry.foreign_members.clone(),
    });

    if let Some(colors) = colors {
        let color = feature_color(feature, colors);
        let properties = projected.properties.get_or_insert_with(JsonObject::new);
        properties.insert("stroke".to_string(), color.clone().into());
        properties.insert("fill".to_string(), color.into());
    }

    Ok(projected)
}

/// Zone id of a feature: a whole numeric id (`1` or `1.0`), or a string id
/// holding one.
fn zone_id(feature: &Feature) -> Option<u32> {
    match feature.id.as_ref()? {
        Id::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().and_then(whole_number))
            .and_then(|n| u32::try_from(n).ok()),
        Id::String(text) => text.trim().parse().ok(),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn whole_number(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX))
        .then(|| value as u64)
}

fn feature_color(feature: &Feature, colors: &BTreeMap<u32, String>) -> String {
    zone_id(feature)
        .and_then(|zone| colors.get(&zone).cloned())
        .or_else(|| {
            feature
                .property("stroke")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_COLOR.to_string())
}

fn id_string(id: &Id) -> String {
    match id {
        Id::Number(number) => number.to_string(),
        Id::String(text) => text.clone(),
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
