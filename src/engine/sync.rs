//! Minimal feature-state patches from interaction state + store membership.

use std::collections::HashMap;

use super::store::AnnotationStore;
use super::types::{BuildingId, FeatureStatePatch, InteractionState, VisualPatch, VisualState};

/// Desired flags for one building.
pub fn desired_state(
    id: &BuildingId,
    state: &InteractionState,
    store: &AnnotationStore,
) -> VisualState {
    VisualState {
        highlighted: matches!(state, InteractionState::Hovering(h) if h == id),
        selected: store.has(id) || matches!(state, InteractionState::Selected(s) if s == id),
    }
}

/// Remembers what was last written to the provider so only deltas go out.
#[derive(Debug, Default)]
pub struct VisualStateSynchronizer {
    applied: HashMap<BuildingId, VisualState>,
}

impl VisualStateSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last state written for `id` (default flags if never written).
    pub fn applied(&self, id: &BuildingId) -> VisualState {
        self.applied.get(id).copied().unwrap_or_default()
    }

    /// Ids whose applied flags are not all false.
    #[cfg(test)]
    pub fn tracked_ids(&self) -> impl Iterator<Item = &BuildingId> + '_ {
        self.applied.keys()
    }

    /// Patches for a transition. Only the ids referenced by `previous` and `next`
    /// are examined, and the previous id is patched first.
    pub fn diff(
        &mut self,
        previous: &InteractionState,
        next: &InteractionState,
        store: &AnnotationStore,
    ) -> Vec<FeatureStatePatch> {
        let mut touched: Vec<&BuildingId> = Vec::with_capacity(2);
        if let Some(id) = previous.visual_id() {
            touched.push(id);
        }
        if let Some(id) = next.visual_id()
            && !touched.contains(&id)
        {
            touched.push(id);
        }
        self.reconcile(touched, next, store)
    }

    /// Patches for explicitly touched ids (store changes).
    pub fn reconcile<'a>(
        &mut self,
        ids: impl IntoIterator<Item = &'a BuildingId>,
        state: &InteractionState,
        store: &AnnotationStore,
    ) -> Vec<FeatureStatePatch> {
        let mut patches = Vec::new();
        for id in ids {
            if let Some(patch) = self.update(id, desired_state(id, state, store)) {
                patches.push(patch);
            }
        }
        patches
    }

    /// One-time pass marking every annotated building.
    pub fn initial_pass(
        &mut self,
        state: &InteractionState,
        store: &AnnotationStore,
    ) -> Vec<FeatureStatePatch> {
        let mut patches = self.reconcile(store.all_ids(), state, store);
        if let Some(id) = state.visual_id()
            && !store.has(id)
            && let Some(patch) = self.update(id, desired_state(id, state, store))
        {
            patches.push(patch);
        }
        patches
    }

    /// Forget everything written so far (the provider dropped its state).
    pub fn reset(&mut self) {
        self.applied.clear();
    }

    fn update(&mut self, id: &BuildingId, desired: VisualState) -> Option<FeatureStatePatch> {
        let current = self.applied(id);
        let patch = VisualPatch {
            highlighted: (current.highlighted != desired.highlighted).then_some(desired.highlighted),
            selected: (current.selected != desired.selected).then_some(desired.selected),
        };
        if patch.is_empty() {
            return None;
        }

        if desired == VisualState::default() {
            self.applied.remove(id);
        } else {
            self.applied.insert(id.clone(), desired);
        }
        Some(FeatureStatePatch {
            id: id.clone(),
            patch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{AnnotationRecord, GeoPoint};

    fn id(n: u64) -> BuildingId {
        BuildingId::Int(n)
    }

    fn store_with(ids: &[u64]) -> AnnotationStore {
        let mut store = AnnotationStore::new();
        for &n in ids {
            store
                .upsert(AnnotationRecord {
                    id: id(n),
                    anchor: GeoPoint::new(0.0, 0.0),
                    title: String::new(),
                    description: String::new(),
                    media: vec![],
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_desired_state() {
        let store = store_with(&[1]);
        let hovering = InteractionState::Hovering(id(2));
        assert_eq!(
            desired_state(&id(2), &hovering, &store),
            VisualState {
                highlighted: true,
                selected: false
            }
        );
        assert_eq!(
            desired_state(&id(1), &hovering, &store),
            VisualState {
                highlighted: false,
                selected: true
            }
        );
    }

    #[test]
    fn test_hover_change_clears_before_setting() {
        let store = store_with(&[]);
        let mut sync = VisualStateSynchronizer::new();
        sync.diff(&InteractionState::Idle, &InteractionState::Hovering(id(1)), &store);
        let patches = sync.diff(
            &InteractionState::Hovering(id(1)),
            &InteractionState::Hovering(id(2)),
            &store,
        );
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].id, id(1));
        assert_eq!(patches[0].patch.highlighted, Some(false));
        assert_eq!(patches[1].id, id(2));
        assert_eq!(patches[1].patch.highlighted, Some(true));
    }

    #[test]
    fn test_repeated_diff_emits_nothing() {
        let store = store_with(&[]);
        let mut sync = VisualStateSynchronizer::new();
        let hovering = InteractionState::Hovering(id(1));
        assert_eq!(sync.diff(&InteractionState::Idle, &hovering, &store).len(), 1);
        assert!(sync.diff(&hovering, &hovering, &store).is_empty());
    }

    #[test]
    fn test_only_changed_flags_are_set() {
        let store = store_with(&[1]);
        let mut sync = VisualStateSynchronizer::new();
        sync.initial_pass(&InteractionState::Idle, &store);
        let patches = sync.diff(&InteractionState::Idle, &InteractionState::Hovering(id(1)), &store);
        assert_eq!(
            patches,
            vec![FeatureStatePatch {
                id: id(1),
                patch: VisualPatch {
                    highlighted: Some(true),
                    selected: None
                }
            }]
        );
    }

    #[test]
    fn test_initial_pass_marks_every_annotation_once() {
        let store = store_with(&[1, 2, 3]);
        let mut sync = VisualStateSynchronizer::new();
        let patches = sync.initial_pass(&InteractionState::Idle, &store);
        assert_eq!(patches.len(), 3);
        assert!(patches.iter().all(|p| p.patch.selected == Some(true)));
        assert!(sync.initial_pass(&InteractionState::Idle, &store).is_empty());
    }

    #[test]
    fn test_default_states_are_evicted() {
        let store = store_with(&[]);
        let mut sync = VisualStateSynchronizer::new();
        sync.diff(&InteractionState::Idle, &InteractionState::Hovering(id(1)), &store);
        assert_eq!(sync.tracked_ids().count(), 1);
        sync.diff(&InteractionState::Hovering(id(1)), &InteractionState::Idle, &store);
        assert_eq!(sync.tracked_ids().count(), 0);
        assert_eq!(sync.applied(&id(1)), VisualState::default());
    }

    #[test]
    fn test_reset_forgets_applied_state() {
        let store = store_with(&[1]);
        let mut sync = VisualStateSynchronizer::new();
        sync.initial_pass(&InteractionState::Idle, &store);
        sync.reset();
        assert_eq!(sync.initial_pass(&InteractionState::Idle, &store).len(), 1);
    }
}
