//! Capability interface every map provider adapter implements.

use super::types::{BuildingId, PickResult, ScreenPoint, VisualState};

/// The small surface the engine needs from a map library.
///
/// Adapters translate their native hit-testing and per-feature styling into these
/// two calls; nothing else about the provider leaks into the engine.
pub trait MapProvider {
    /// Topmost building under `screen`, if any.
    fn pick_feature_at(&self, screen: ScreenPoint) -> Option<PickResult>;

    /// Write the full flag set for one building.
    fn set_feature_visual_state(&mut self, id: &BuildingId, state: VisualState);
}

/// Provider that records every write. Used by the engine tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingProvider {
    pub features: Vec<(PickResult, ScreenPoint)>,
    pub writes: Vec<(BuildingId, VisualState)>,
    pub states: std::collections::HashMap<BuildingId, VisualState>,
}

#[cfg(test)]
impl RecordingProvider {
    pub fn state_of(&self, id: &BuildingId) -> VisualState {
        self.states.get(id).copied().unwrap_or_default()
    }

    pub fn highlighted_count(&self) -> usize {
        self.states.values().filter(|s| s.highlighted).count()
    }
}

#[cfg(test)]
impl MapProvider for RecordingProvider {
    fn pick_feature_at(&self, screen: ScreenPoint) -> Option<PickResult> {
        self.features
            .iter()
            .find(|(_, at)| at.distance(screen) < 1.0)
            .map(|(pick, _)| pick.clone())
    }

    fn set_feature_visual_state(&mut self, id: &BuildingId, state: VisualState) {
        self.writes.push((id.clone(), state));
        self.states.insert(id.clone(), state);
    }
}
