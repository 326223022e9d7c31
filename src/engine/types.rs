//! Value types shared by the engine components.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider-assigned identifier of a building footprint.
///
/// Stable within one provider session only. Map libraries hand out either numeric
/// or string feature ids, so both are accepted and serialized untagged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildingId {
    Int(u64),
    Text(String),
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildingId::Int(n) => write!(f, "{}", n),
            BuildingId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for BuildingId {
    fn from(value: u64) -> Self {
        BuildingId::Int(value)
    }
}

impl From<&str> for BuildingId {
    fn from(value: &str) -> Self {
        BuildingId::Text(value.to_string())
    }
}

impl From<String> for BuildingId {
    fn from(value: String) -> Self {
        BuildingId::Text(value)
    }
}

/// WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A closed ordered ring of points. The closing duplicate is optional.
pub type Ring = Vec<GeoPoint>;

/// Geometry reported by the provider for a pick result.
///
/// A polygon is a list of rings with the outer ring first; holes follow.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl FeatureGeometry {
    /// The ring used for anchoring: the outer ring, or the first ring of the
    /// first polygon for multi-polygons.
    pub fn outer_ring(&self) -> Option<&Ring> {
        match self {
            FeatureGeometry::Polygon(rings) => rings.first(),
            FeatureGeometry::MultiPolygon(polygons) => polygons.first()?.first(),
        }
    }

    /// First coordinate of the geometry (fallback anchor for degenerate shapes).
    pub fn first_point(&self) -> Option<GeoPoint> {
        self.outer_ring()?.first().copied()
    }
}

/// Pixel coordinate in the provider's viewport, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: ScreenPoint) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Result of a provider hit-test.
#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    pub id: BuildingId,
    pub geometry: FeatureGeometry,
}

/// A pick result translated to a stable id and an anchor coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFeature {
    pub id: BuildingId,
    pub anchor: GeoPoint,
}

/// User-authored metadata attached to one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: BuildingId,
    pub anchor: GeoPoint,
    pub title: String,
    pub description: String,
    /// Media URLs (images, documents). May be empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,
}

/// Not-yet-persisted create flow: where the user clicked and for which building.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCreate {
    pub id: BuildingId,
    pub anchor: GeoPoint,
}

/// The single active interaction state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Hovering(BuildingId),
    Selected(BuildingId),
    Pending(PendingCreate),
}

impl InteractionState {
    /// The building this state refers to for visual purposes, if any.
    ///
    /// `Pending` carries no visual flag, so it reports none.
    pub fn visual_id(&self) -> Option<&BuildingId> {
        match self {
            InteractionState::Hovering(id) | InteractionState::Selected(id) => Some(id),
            InteractionState::Idle | InteractionState::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, InteractionState::Pending(_))
    }
}

/// Per-building rendering flags mirrored into the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisualState {
    pub highlighted: bool,
    pub selected: bool,
}

/// Flags that changed for one building. `None` means "leave as is".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisualPatch {
    pub highlighted: Option<bool>,
    pub selected: Option<bool>,
}

impl VisualPatch {
    pub fn is_empty(&self) -> bool {
        self.highlighted.is_none() && self.selected.is_none()
    }

    /// Apply the changed flags on top of `base`.
    pub fn apply_to(&self, base: VisualState) -> VisualState {
        VisualState {
            highlighted: self.highlighted.unwrap_or(base.highlighted),
            selected: self.selected.unwrap_or(base.selected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureStatePatch {
    pub id: BuildingId,
    pub patch: VisualPatch,
}

/// Keyboard modifiers held during a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
}

impl Modifiers {
    pub const PLAIN: Modifiers = Modifiers { ctrl: false };
    pub const CTRL: Modifiers = Modifiers { ctrl: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Move,
    Down,
    Up,
    Click(Modifiers),
    /// Pointer left the map surface.
    Leave,
}

/// One provider event. `feature` is filled when the provider already resolved the
/// pick; otherwise the driver asks the provider itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub screen: ScreenPoint,
    pub feature: Option<PickResult>,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, screen: ScreenPoint) -> Self {
        Self {
            kind,
            screen,
            feature: None,
        }
    }

    pub fn with_feature(mut self, feature: PickResult) -> Self {
        self.feature = Some(feature);
        self
    }
}

/// Requests the engine makes of the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum UiIntent {
    ShowPopup {
        id: BuildingId,
        record: AnnotationRecord,
        screen: ScreenPoint,
    },
    OpenCreateForm {
        id: BuildingId,
        anchor: GeoPoint,
        screen: ScreenPoint,
    },
    Navigate {
        route: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_id_serializes_untagged() {
        assert_eq!(serde_json::to_string(&BuildingId::Int(42)).unwrap(), "42");
        assert_eq!(
            serde_json::to_string(&BuildingId::from("way/17")).unwrap(),
            "\"way/17\""
        );
        let parsed: BuildingId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, BuildingId::Int(7));
    }

    #[test]
    fn test_geo_point_validity() {
        assert!(GeoPoint::new(41.71, 44.79).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.1).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_record_media_defaults_to_empty() {
        let json = r#"{"id": 3, "anchor": {"lat": 1.0, "lng": 2.0}, "title": "A", "description": ""}"#;
        let record: AnnotationRecord = serde_json::from_str(json).unwrap();
        assert!(record.media.is_empty());
        assert_eq!(record.id, BuildingId::Int(3));
    }

    #[test]
    fn test_multipolygon_outer_ring_is_first_ring_of_first_polygon() {
        let a = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)];
        let b = vec![GeoPoint::new(5.0, 5.0)];
        let geometry = FeatureGeometry::MultiPolygon(vec![vec![a.clone()], vec![b]]);
        assert_eq!(geometry.outer_ring(), Some(&a));
        assert_eq!(geometry.first_point(), Some(GeoPoint::new(0.0, 0.0)));
    }

    #[test]
    fn test_patch_apply_keeps_untouched_flags() {
        let base = VisualState {
            highlighted: true,
            selected: false,
        };
        let patch = VisualPatch {
            highlighted: None,
            selected: Some(true),
        };
        let next = patch.apply_to(base);
        assert!(next.highlighted);
        assert!(next.selected);
    }
}
