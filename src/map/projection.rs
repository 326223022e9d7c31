//! Spherical Web Mercator between WGS84 and world space.
//!
//! World units are metres relative to a local origin (the centre of the loaded
//! footprints) so that `f32` keeps sub-metre precision at city scale.

use std::f64::consts::FRAC_PI_4;

use bevy::prelude::*;

use crate::engine::GeoPoint;

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the Mercator square.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorFrame {
    origin_x: f64,
    origin_y: f64,
}

impl Default for MercatorFrame {
    fn default() -> Self {
        Self::centered_on(GeoPoint::new(0.0, 0.0))
    }
}

impl MercatorFrame {
    pub fn centered_on(origin: GeoPoint) -> Self {
        let (origin_x, origin_y) = mercator(origin);
        Self { origin_x, origin_y }
    }

    /// Frame centred on the bounding box of `points`, or on (0, 0) when empty.
    pub fn fitting<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Self {
        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min = (min.0.min(p.lat), min.1.min(p.lng));
            max = (max.0.max(p.lat), max.1.max(p.lng));
        }
        if !min.0.is_finite() || !max.0.is_finite() {
            return Self::default();
        }
        Self::centered_on(GeoPoint::new((min.0 + max.0) / 2.0, (min.1 + max.1) / 2.0))
    }

    pub fn to_world(&self, point: GeoPoint) -> Vec2 {
        let (x, y) = mercator(point);
        Vec2::new((x - self.origin_x) as f32, (y - self.origin_y) as f32)
    }

    #[cfg(test)]
    pub fn to_geo(&self, world: Vec2) -> GeoPoint {
        let x = world.x as f64 + self.origin_x;
        let y = world.y as f64 + self.origin_y;
        let lng = (x / EARTH_RADIUS_M).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
        GeoPoint::new(lat, lng)
    }
}

fn mercator(point: GeoPoint) -> (f64, f64) {
    let lat = point.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = EARTH_RADIUS_M * point.lng.to_radians();
    let y = EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln();
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_zero() {
        let origin = GeoPoint::new(41.71, 44.79);
        let frame = MercatorFrame::centered_on(origin);
        assert!(frame.to_world(origin).length() < 1e-3);
    }

    #[test]
    fn test_round_trip_near_origin() {
        let frame = MercatorFrame::centered_on(GeoPoint::new(41.71, 44.79));
        let point = GeoPoint::new(41.7153, 44.7831);
        let back = frame.to_geo(frame.to_world(point));
        assert!((back.lat - point.lat).abs() < 1e-6);
        assert!((back.lng - point.lng).abs() < 1e-6);
    }

    #[test]
    fn test_north_and_east_are_positive() {
        let frame = MercatorFrame::centered_on(GeoPoint::new(0.0, 0.0));
        let world = frame.to_world(GeoPoint::new(0.001, 0.001));
        assert!(world.x > 0.0);
        assert!(world.y > 0.0);
        // One millidegree of longitude at the equator is ~111 m
        assert!((world.x - 111.32).abs() < 0.1);
    }

    #[test]
    fn test_fitting_uses_bounding_box_centre() {
        let points = [GeoPoint::new(10.0, 20.0), GeoPoint::new(12.0, 24.0)];
        let frame = MercatorFrame::fitting(points.iter());
        assert_eq!(frame, MercatorFrame::centered_on(GeoPoint::new(11.0, 22.0)));
        assert_eq!(MercatorFrame::fitting(std::iter::empty::<&GeoPoint>()), MercatorFrame::default());
    }
}
