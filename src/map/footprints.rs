//! GeoJSON building footprint parsing.

use bevy::log::warn;
use serde::Deserialize;
use thiserror::Error;

use crate::engine::{BuildingId, FeatureGeometry, GeoPoint, Ring};

#[derive(Debug, Error)]
pub enum FootprintError {
    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a FeatureCollection, found {0}")]
    NotFeatureCollection(String),
    #[error("no usable building footprints ({skipped} features skipped)")]
    Empty { skipped: usize },
}

/// One building as loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub id: BuildingId,
    pub geometry: FeatureGeometry,
}

#[derive(Debug, Default)]
pub struct ParsedFootprints {
    pub footprints: Vec<Footprint>,
    /// Features dropped for a missing id or unsupported geometry.
    pub skipped: usize,
}

#[derive(Deserialize)]
struct GeoJsonCollection {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    features: Vec<GeoJsonFeature>,
}

#[derive(Deserialize)]
struct GeoJsonFeature {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    properties: Option<serde_json::Value>,
    geometry: Option<GeoJsonGeometry>,
}

#[derive(Deserialize)]
struct GeoJsonGeometry {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

/// Parse a FeatureCollection of `Polygon` / `MultiPolygon` features.
///
/// The id is taken from the feature's top-level `id`, falling back to
/// `properties.id`. Features without either, or with other geometry types, are
/// skipped and counted.
pub fn parse_footprints(json: &str) -> Result<ParsedFootprints, FootprintError> {
    let collection: GeoJsonCollection = serde_json::from_str(json)?;
    if collection.ty != "FeatureCollection" {
        return Err(FootprintError::NotFeatureCollection(collection.ty));
    }

    let mut parsed = ParsedFootprints::default();
    for (index, feature) in collection.features.into_iter().enumerate() {
        match footprint_from_feature(feature) {
            Some(footprint) => parsed.footprints.push(footprint),
            None => {
                warn!("Skipping GeoJSON feature #{}: no usable id or polygon geometry", index);
                parsed.skipped += 1;
            }
        }
    }

    if parsed.footprints.is_empty() {
        return Err(FootprintError::Empty {
            skipped: parsed.skipped,
        });
    }
    Ok(parsed)
}

fn footprint_from_feature(feature: GeoJsonFeature) -> Option<Footprint> {
    let id = feature
        .id
        .as_ref()
        .and_then(id_from_value)
        .or_else(|| feature.properties.as_ref()?.get("id").and_then(id_from_value))?;

    let geometry = feature.geometry?;
    let geometry = match geometry.ty.as_str() {
        "Polygon" => FeatureGeometry::Polygon(parse_polygon(&geometry.coordinates)?),
        "MultiPolygon" => {
            let polygons = geometry
                .coordinates
                .as_array()?
                .iter()
                .map(parse_polygon)
                .collect::<Option<Vec<_>>>()?;
            FeatureGeometry::MultiPolygon(polygons)
        }
        _ => return None,
    };
    geometry.outer_ring().filter(|ring| !ring.is_empty())?;

    Some(Footprint { id, geometry })
}

fn id_from_value(value: &serde_json::Value) -> Option<BuildingId> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(BuildingId::Int),
        serde_json::Value::String(s) if !s.is_empty() => Some(BuildingId::Text(s.clone())),
        _ => None,
    }
}

fn parse_polygon(value: &serde_json::Value) -> Option<Vec<Ring>> {
    value.as_array()?.iter().map(parse_ring).collect()
}

/// GeoJSON positions are `[lng, lat, ...]`.
fn parse_ring(value: &serde_json::Value) -> Option<Ring> {
    value
        .as_array()?
        .iter()
        .map(|position| {
            let position = position.as_array()?;
            let lng = position.first()?.as_f64()?;
            let lat = position.get(1)?.as_f64()?;
            Some(GeoPoint::new(lat, lng))
        })
        .collect()
}
