//! Pick result → building id + anchor coordinate.

use super::error::EngineError;
use super::types::{GeoPoint, PickResult, ResolvedFeature};

/// Rings whose absolute area (in squared degrees) falls below this are treated
/// as degenerate. Roughly one square millimetre at the equator.
pub const MIN_RING_AREA: f64 = 1e-16;

/// Resolve a pick to its anchor using the area-weighted centroid of the outer ring.
///
/// Holes are ignored. Multi-polygons use the first ring of the first polygon.
pub fn resolve(pick: &PickResult) -> Result<ResolvedFeature, EngineError> {
    let Some(ring) = pick.geometry.outer_ring() else {
        return Err(EngineError::DegenerateGeometry {
            id: pick.id.clone(),
        });
    };

    if ring.iter().any(|p| !p.is_valid()) {
        return Err(EngineError::MalformedPick {
            id: pick.id.clone(),
        });
    }

    match ring_centroid(ring) {
        Some(anchor) => Ok(ResolvedFeature {
            id: pick.id.clone(),
            anchor,
        }),
        None => Err(EngineError::DegenerateGeometry {
            id: pick.id.clone(),
        }),
    }
}

/// Resolve a pick, falling back to the geometry's first coordinate when no
/// centroid exists. Returns `None` for malformed or empty geometry.
pub fn resolve_or_first_point(pick: &PickResult) -> Option<ResolvedFeature> {
    match resolve(pick) {
        Ok(resolved) => Some(resolved),
        Err(EngineError::DegenerateGeometry { .. }) => {
            let anchor = pick.geometry.first_point().filter(GeoPoint::is_valid)?;
            Some(ResolvedFeature {
                id: pick.id.clone(),
                anchor,
            })
        }
        Err(_) => None,
    }
}

/// Signed-area centroid of a closed ring, `x = lng`, `y = lat`.
///
/// Coordinates are shifted to the first vertex before summing so that small
/// building footprints far from the origin keep their precision.
pub fn ring_centroid(ring: &[GeoPoint]) -> Option<GeoPoint> {
    let points = open_ring(ring);
    if points.len() < 3 {
        return None;
    }

    let origin = points[0];
    let n = points.len();
    let mut twice_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;

    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let (x0, y0) = (a.lng - origin.lng, a.lat - origin.lat);
        let (x1, y1) = (b.lng - origin.lng, b.lat - origin.lat);

        let cross = x0 * y1 - x1 * y0;
        twice_area += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }

    let area = 0.5 * twice_area;
    if !area.is_finite() || area.abs() < MIN_RING_AREA {
        return None;
    }

    let factor = 1.0 / (6.0 * area);
    Some(GeoPoint {
        lat: origin.lat + cy * factor,
        lng: origin.lng + cx * factor,
    })
}

/// Drop the closing duplicate, if present.
fn open_ring(ring: &[GeoPoint]) -> &[GeoPoint] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{BuildingId, FeatureGeometry};

    fn pt(x: f64, y: f64) -> GeoPoint {
        GeoPoint::new(y, x)
    }

    fn pick(geometry: FeatureGeometry) -> PickResult {
        PickResult {
            id: BuildingId::Int(1),
            geometry,
        }
    }

    fn square() -> Vec<GeoPoint> {
        vec![pt(0.0, 0.0), pt(2.0, 0.0), pt(2.0, 2.0), pt(0.0, 2.0), pt(0.0, 0.0)]
    }

    #[test]
    fn test_square_centroid() {
        let resolved = resolve(&pick(FeatureGeometry::Polygon(vec![square()]))).unwrap();
        assert!((resolved.anchor.lat - 1.0).abs() < 1e-12);
        assert!((resolved.anchor.lng - 1.0).abs() < 1e-12);
        assert_eq!(resolved.id, BuildingId::Int(1));
    }

    #[test]
    fn test_open_ring_gives_same_centroid() {
        let mut ring = square();
        ring.pop();
        let c = ring_centroid(&ring).unwrap();
        assert!((c.lat - 1.0).abs() < 1e-12);
        assert!((c.lng - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clockwise_ring_gives_same_centroid() {
        let mut ring = square();
        ring.reverse();
        let c = ring_centroid(&ring).unwrap();
        assert!((c.lat - 1.0).abs() < 1e-12);
        assert!((c.lng - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_is_area_weighted_not_vertex_mean() {
        // L-shape: vertex mean differs from the true centroid
        let ring = vec![
            pt(0.0, 0.0),
            pt(4.0, 0.0),
            pt(4.0, 1.0),
            pt(1.0, 1.0),
            pt(1.0, 4.0),
            pt(0.0, 4.0),
        ];
        let c = ring_centroid(&ring).unwrap();
        // Two rectangles 4x1 (centroid 2,0.5) and 1x3 (centroid 0.5,2.5), areas 4 and 3
        let expected_x = (4.0 * 2.0 + 3.0 * 0.5) / 7.0;
        let expected_y = (4.0 * 0.5 + 3.0 * 2.5) / 7.0;
        assert!((c.lng - expected_x).abs() < 1e-9);
        assert!((c.lat - expected_y).abs() < 1e-9);
    }

    #[test]
    fn test_small_footprint_far_from_origin() {
        let (lng, lat) = (44.79, 41.71);
        let d = 0.0001;
        let ring = vec![
            pt(lng, lat),
            pt(lng + d, lat),
            pt(lng + d, lat + d),
            pt(lng, lat + d),
            pt(lng, lat),
        ];
        let c = ring_centroid(&ring).unwrap();
        assert!((c.lng - (lng + d / 2.0)).abs() < 1e-12);
        assert!((c.lat - (lat + d / 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_holes_are_ignored() {
        let hole = vec![pt(0.5, 0.5), pt(0.5, 1.0), pt(1.0, 1.0), pt(1.0, 0.5), pt(0.5, 0.5)];
        let resolved = resolve(&pick(FeatureGeometry::Polygon(vec![square(), hole]))).unwrap();
        assert!((resolved.anchor.lat - 1.0).abs() < 1e-12);
        assert!((resolved.anchor.lng - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_multipolygon_uses_first_ring_of_first_polygon() {
        let far = vec![pt(10.0, 10.0), pt(12.0, 10.0), pt(12.0, 12.0), pt(10.0, 12.0)];
        let geometry = FeatureGeometry::MultiPolygon(vec![vec![square()], vec![far]]);
        let resolved = resolve(&pick(geometry)).unwrap();
        assert!((resolved.anchor.lat - 1.0).abs() < 1e-12);
        assert!((resolved.anchor.lng - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_points_is_degenerate() {
        let geometry = FeatureGeometry::Polygon(vec![vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(0.0, 0.0)]]);
        let err = resolve(&pick(geometry)).unwrap_err();
        assert!(matches!(err, EngineError::DegenerateGeometry { .. }));
    }

    #[test]
    fn test_collinear_ring_is_degenerate() {
        let geometry =
            FeatureGeometry::Polygon(vec![vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(2.0, 2.0)]]);
        let err = resolve(&pick(geometry)).unwrap_err();
        assert!(matches!(err, EngineError::DegenerateGeometry { .. }));
    }

    #[test]
    fn test_empty_geometry_is_degenerate() {
        let err = resolve(&pick(FeatureGeometry::MultiPolygon(vec![]))).unwrap_err();
        assert!(matches!(err, EngineError::DegenerateGeometry { .. }));
        assert!(resolve_or_first_point(&pick(FeatureGeometry::Polygon(vec![]))).is_none());
    }

    #[test]
    fn test_out_of_range_point_is_malformed() {
        let geometry =
            FeatureGeometry::Polygon(vec![vec![pt(0.0, 0.0), pt(200.0, 0.0), pt(0.0, 1.0)]]);
        let err = resolve(&pick(geometry.clone())).unwrap_err();
        assert!(matches!(err, EngineError::MalformedPick { .. }));
        assert!(resolve_or_first_point(&pick(geometry)).is_none());
    }

    #[test]
    fn test_fallback_uses_first_point() {
        let geometry = FeatureGeometry::Polygon(vec![vec![pt(3.0, 4.0), pt(5.0, 6.0)]]);
        let resolved = resolve_or_first_point(&pick(geometry)).unwrap();
        assert_eq!(resolved.anchor, GeoPoint::new(4.0, 3.0));
    }
}
