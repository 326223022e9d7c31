//! Reconciliation driver: provider events in, feature-state writes and UI intents out.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use super::error::EngineError;
use super::interaction::{InteractionMachine, Transition, DEFAULT_ROUTE_TEMPLATE};
use super::provider::MapProvider;
use super::resolver::resolve_or_first_point;
use super::store::AnnotationStore;
use super::sync::VisualStateSynchronizer;
use super::types::{
    AnnotationRecord, BuildingId, FeatureStatePatch, InteractionState, PickResult, PointerEvent,
    PointerEventKind, ScreenPoint, UiIntent,
};

/// Default distance the pointer may travel while pressed before the gesture
/// counts as a map drag rather than a click.
pub const DEFAULT_DRAG_THRESHOLD_PX: f32 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub drag_threshold_px: f32,
    /// Route for [`UiIntent::Navigate`]; `{id}` is replaced by the building id.
    pub route_template: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            route_template: DEFAULT_ROUTE_TEMPLATE.to_string(),
        }
    }
}

/// Outcome of [`ReconciliationDriver::import_records`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub rejected: usize,
}

#[derive(Debug, Default)]
struct DragTracker {
    down_at: Option<ScreenPoint>,
    dragging: bool,
    swallow_click: bool,
}

/// Owns the store, the state machine, the synchronizer and the provider.
///
/// Every method processes its input to completion before returning; there is no
/// interleaving between events.
pub struct ReconciliationDriver<P: MapProvider> {
    provider: P,
    store: AnnotationStore,
    machine: InteractionMachine,
    sync: VisualStateSynchronizer,
    intents: VecDeque<UiIntent>,
    drag: DragTracker,
    drag_threshold_px: f32,
}

impl<P: MapProvider> ReconciliationDriver<P> {
    pub fn new(provider: P, store: AnnotationStore, config: EngineConfig) -> Self {
        Self {
            provider,
            store,
            machine: InteractionMachine::new(config.route_template),
            sync: VisualStateSynchronizer::new(),
            intents: VecDeque::new(),
            drag: DragTracker::default(),
            drag_threshold_px: config.drag_threshold_px.max(0.0),
        }
    }

    /// Mark every annotated building on the provider. Call once after construction.
    pub fn initialize(&mut self) -> Vec<FeatureStatePatch> {
        let patches = self.sync.initial_pass(self.machine.state(), &self.store);
        info!("Marked {} annotated buildings", patches.len());
        self.apply(&patches);
        patches
    }

    /// Process one provider event. Returns the patches written to the provider.
    pub fn handle(&mut self, event: PointerEvent) -> Vec<FeatureStatePatch> {
        match event.kind {
            PointerEventKind::Down => {
                self.drag = DragTracker {
                    down_at: Some(event.screen),
                    dragging: false,
                    swallow_click: false,
                };
                Vec::new()
            }
            PointerEventKind::Up => {
                if self.drag.dragging {
                    self.drag.swallow_click = true;
                }
                self.drag.down_at = None;
                self.drag.dragging = false;
                Vec::new()
            }
            PointerEventKind::Move => {
                if let Some(origin) = self.drag.down_at
                    && origin.distance(event.screen) > self.drag_threshold_px
                {
                    self.drag.dragging = true;
                }
                if self.drag.dragging {
                    return Vec::new();
                }
                let pick = self.pick(&event);
                let over = pick.map(|p| p.id);
                let transition = self
                    .machine
                    .pointer_move(over.as_ref(), event.screen, &self.store);
                self.finish(transition)
            }
            PointerEventKind::Click(modifiers) => {
                if std::mem::take(&mut self.drag.swallow_click) {
                    debug!("click after drag ignored");
                    return Vec::new();
                }
                let target = match self.pick(&event) {
                    Some(pick) => match resolve_or_first_point(&pick) {
                        Some(resolved) => Some(resolved),
                        None => {
                            warn!("Ignoring click on building {} with malformed geometry", pick.id);
                            return Vec::new();
                        }
                    },
                    None => None,
                };
                let transition = self
                    .machine
                    .click(target.as_ref(), modifiers, event.screen, &self.store);
                self.finish(transition)
            }
            PointerEventKind::Leave => {
                // A drag stays a drag until its release, even off the map
                self.drag.down_at = None;
                let transition = self.machine.pointer_leave();
                self.finish(transition)
            }
        }
    }

    /// Commit the create form. On error the create flow stays pending.
    pub fn submit_create_form(&mut self, record: AnnotationRecord) -> Result<(), EngineError> {
        let id = record.id.clone();
        let transition = self.machine.submit(record, &mut self.store)?;
        info!("Annotation saved for building {}", id);
        let mut patches = self
            .sync
            .diff(&transition.previous, &transition.next, &self.store);
        patches.extend(self.sync.reconcile([&id], &transition.next, &self.store));
        self.apply(&patches);
        Ok(())
    }

    pub fn cancel_create_form(&mut self) {
        let transition = self.machine.cancel();
        self.finish(transition);
    }

    /// Add records loaded from the backend. Invalid records are skipped.
    pub fn import_records(
        &mut self,
        records: impl IntoIterator<Item = AnnotationRecord>,
    ) -> ImportSummary {
        let mut summary = ImportSummary::default();
        let mut touched: Vec<BuildingId> = Vec::new();
        for record in records {
            let id = record.id.clone();
            match self.store.upsert(record) {
                Ok(()) => {
                    summary.imported += 1;
                    touched.push(id);
                }
                Err(e) => {
                    warn!("Rejected imported annotation: {}", e);
                    summary.rejected += 1;
                }
            }
        }
        let patches = self
            .sync
            .reconcile(touched.iter(), self.machine.state(), &self.store);
        self.apply(&patches);
        summary
    }

    /// The provider dropped its feature state (e.g. footprints reloaded).
    pub fn reset_provider_state(&mut self) -> Vec<FeatureStatePatch> {
        self.sync.reset();
        self.drag = DragTracker::default();
        self.machine.reset();
        self.initialize()
    }

    /// Pending UI intents, oldest first.
    pub fn drain_intents(&mut self) -> impl Iterator<Item = UiIntent> + '_ {
        self.intents.drain(..)
    }

    pub fn get_annotation(&self, id: &BuildingId) -> Option<&AnnotationRecord> {
        self.store.get(id)
    }

    pub fn list_annotation_ids(&self) -> impl Iterator<Item = &BuildingId> + '_ {
        self.store.all_ids()
    }

    pub fn state(&self) -> &InteractionState {
        self.machine.state()
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn route_for(&self, id: &BuildingId) -> String {
        self.machine.route_for(id)
    }

    fn pick(&self, event: &PointerEvent) -> Option<PickResult> {
        match &event.feature {
            Some(pick) => Some(pick.clone()),
            None => self.provider.pick_feature_at(event.screen),
        }
    }

    fn finish(&mut self, transition: Transition) -> Vec<FeatureStatePatch> {
        if transition.is_noop() {
            return Vec::new();
        }
        let patches = self
            .sync
            .diff(&transition.previous, &transition.next, &self.store);
        self.apply(&patches);
        self.intents.extend(transition.intents);
        patches
    }

    fn apply(&mut self, patches: &[FeatureStatePatch]) {
        for patch in patches {
            let state = self.sync.applied(&patch.id);
            self.provider.set_feature_visual_state(&patch.id, state);
        }
    }
}
