//! Footprint hit testing and the [`MapProvider`] implementation for the map view.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use crate::engine::{
    BuildingId, FeatureGeometry, GeoPoint, MapProvider, PickResult, ScreenPoint, VisualState,
};

use super::footprints::Footprint;
use super::projection::MercatorFrame;

/// Camera snapshot used to turn window coordinates into world coordinates.
///
/// Matches an orthographic `Camera2d` with the default window-size scaling:
/// one world unit per logical pixel at scale 1, y pointing up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMapping {
    pub camera_position: Vec2,
    pub scale: f32,
    pub window_size: Vec2,
}

impl Default for ViewportMapping {
    fn default() -> Self {
        Self {
            camera_position: Vec2::ZERO,
            scale: 1.0,
            window_size: Vec2::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT),
        }
    }
}

impl ViewportMapping {
    pub fn screen_to_world(&self, screen: ScreenPoint) -> Vec2 {
        let offset = Vec2::new(
            screen.x - self.window_size.x / 2.0,
            self.window_size.y / 2.0 - screen.y,
        );
        self.camera_position + offset * self.scale
    }

    pub fn world_to_screen(&self, world: Vec2) -> ScreenPoint {
        let offset = (world - self.camera_position) / self.scale;
        ScreenPoint::new(
            offset.x + self.window_size.x / 2.0,
            self.window_size.y / 2.0 - offset.y,
        )
    }
}

/// A footprint with its rings projected into world space.
#[derive(Debug, Clone)]
pub struct ProjectedFootprint {
    pub footprint: Footprint,
    /// Polygons, each a list of rings with the outer ring first.
    pub polygons: Vec<Vec<Vec<Vec2>>>,
    pub min: Vec2,
    pub max: Vec2,
}

impl ProjectedFootprint {
    fn new(footprint: Footprint, frame: &MercatorFrame) -> Self {
        let project = |ring: &Vec<GeoPoint>| -> Vec<Vec2> {
            ring.iter().map(|p| frame.to_world(*p)).collect()
        };
        let polygons: Vec<Vec<Vec<Vec2>>> = match &footprint.geometry {
            FeatureGeometry::Polygon(rings) => vec![rings.iter().map(project).collect()],
            FeatureGeometry::MultiPolygon(polygons) => polygons
                .iter()
                .map(|rings| rings.iter().map(project).collect())
                .collect(),
        };

        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for point in polygons.iter().filter_map(|rings| rings.first()).flatten() {
            min = min.min(*point);
            max = max.max(*point);
        }

        Self {
            footprint,
            polygons,
            min,
            max,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, point: Vec2) -> bool {
        if point.x < self.min.x || point.x > self.max.x || point.y < self.min.y || point.y > self.max.y
        {
            return false;
        }
        self.polygons.iter().any(|rings| {
            let Some((outer, holes)) = rings.split_first() else {
                return false;
            };
            point_in_ring(point, outer) && !holes.iter().any(|hole| point_in_ring(point, hole))
        })
    }
}

/// Ray casting, even-odd rule. Works with or without the closing duplicate.
pub fn point_in_ring(point: Vec2, ring: &[Vec2]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Building footprints loaded into the map view, plus the feature state the
/// engine has written for them.
#[derive(Debug, Default)]
pub struct FootprintProvider {
    frame: MercatorFrame,
    footprints: Vec<ProjectedFootprint>,
    viewport: ViewportMapping,
    states: HashMap<BuildingId, VisualState>,
}

impl FootprintProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loaded footprints. Feature state is dropped along with them.
    pub fn load(&mut self, footprints: Vec<Footprint>) {
        self.frame = MercatorFrame::fitting(
            footprints
                .iter()
                .filter_map(|f| f.geometry.outer_ring())
                .flatten(),
        );
        let frame = self.frame;
        self.footprints = footprints
            .into_iter()
            .map(|f| ProjectedFootprint::new(f, &frame))
            .collect();
        self.states.clear();
    }

    pub fn set_viewport(&mut self, viewport: ViewportMapping) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> &ViewportMapping {
        &self.viewport
    }

    pub fn frame(&self) -> &MercatorFrame {
        &self.frame
    }

    pub fn footprints(&self) -> &[ProjectedFootprint] {
        &self.footprints
    }

    pub fn visual_state(&self, id: &BuildingId) -> VisualState {
        self.states.get(id).copied().unwrap_or_default()
    }

    /// Topmost footprint containing `world`. Later footprints draw over earlier ones.
    pub fn pick_world(&self, world: Vec2) -> Option<&ProjectedFootprint> {
        self.footprints.iter().rev().find(|f| f.contains(world))
    }

    pub fn find(&self, id: &BuildingId) -> Option<&ProjectedFootprint> {
        self.footprints.iter().find(|f| &f.footprint.id == id)
    }
}

impl MapProvider for FootprintProvider {
    fn pick_feature_at(&self, screen: ScreenPoint) -> Option<PickResult> {
        let world = self.viewport.screen_to_world(screen);
        self.pick_world(world).map(|f| PickResult {
            id: f.footprint.id.clone(),
            geometry: f.footprint.geometry.clone(),
        })
    }

    fn set_feature_visual_state(&mut self, id: &BuildingId, state: VisualState) {
        if state == VisualState::default() {
            self.states.remove(id);
        } else {
            self.states.insert(id.clone(), state);
        }
    }
}
