//! Hover / selection / create-flow state machine.
//!
//! The machine only decides transitions and the UI intents that go with them.
//! Visual flags are derived afterwards by the synchronizer from the
//! `previous`/`next` pair of each [`Transition`].

use tracing::debug;

use super::error::EngineError;
use super::store::AnnotationStore;
use super::types::{
    AnnotationRecord, BuildingId, InteractionState, Modifiers, PendingCreate, ResolvedFeature,
    ScreenPoint, UiIntent,
};

/// Default route used by [`UiIntent::Navigate`]; `{id}` is replaced by the building id.
pub const DEFAULT_ROUTE_TEMPLATE: &str = "/buildings/{id}";

/// Outcome of feeding one input to the machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub previous: InteractionState,
    pub next: InteractionState,
    pub intents: Vec<UiIntent>,
}

impl Transition {
    fn unchanged(state: &InteractionState) -> Self {
        Self {
            previous: state.clone(),
            next: state.clone(),
            intents: Vec::new(),
        }
    }

    /// True when neither the state changed nor any intent was produced.
    pub fn is_noop(&self) -> bool {
        self.previous == self.next && self.intents.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct InteractionMachine {
    state: InteractionState,
    route_template: String,
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new(DEFAULT_ROUTE_TEMPLATE)
    }
}

impl InteractionMachine {
    pub fn new(route_template: impl Into<String>) -> Self {
        Self {
            state: InteractionState::Idle,
            route_template: route_template.into(),
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Pointer moved; `over` is the building under the pointer, if any.
    pub fn pointer_move(
        &mut self,
        over: Option<&BuildingId>,
        screen: ScreenPoint,
        store: &AnnotationStore,
    ) -> Transition {
        let next = match (&self.state, over) {
            // Selection and the create form are sticky against hover
            (InteractionState::Selected(_) | InteractionState::Pending(_), _) => {
                return Transition::unchanged(&self.state);
            }
            (InteractionState::Hovering(current), Some(id)) if current == id => {
                return Transition::unchanged(&self.state);
            }
            (InteractionState::Idle, None) => return Transition::unchanged(&self.state),
            (_, Some(id)) => InteractionState::Hovering(id.clone()),
            (InteractionState::Hovering(_), None) => InteractionState::Idle,
        };

        let mut intents = Vec::new();
        if let InteractionState::Hovering(id) = &next
            && let Some(record) = store.get(id)
        {
            intents.push(UiIntent::ShowPopup {
                id: id.clone(),
                record: record.clone(),
                screen,
            });
        }

        self.transition_to(next, intents)
    }

    /// Click with the resolved feature under the pointer, if any.
    pub fn click(
        &mut self,
        target: Option<&ResolvedFeature>,
        modifiers: Modifiers,
        screen: ScreenPoint,
        store: &AnnotationStore,
    ) -> Transition {
        match &self.state {
            InteractionState::Pending(_) => Transition::unchanged(&self.state),
            InteractionState::Selected(current) => {
                let current = current.clone();
                self.click_while_selected(&current, target, modifiers, screen, store)
            }
            InteractionState::Idle | InteractionState::Hovering(_) => {
                let Some(feature) = target else {
                    return Transition::unchanged(&self.state);
                };
                let annotated = store.get(&feature.id);
                match (modifiers.ctrl, annotated) {
                    (false, Some(record)) => {
                        let intents = vec![UiIntent::ShowPopup {
                            id: feature.id.clone(),
                            record: record.clone(),
                            screen,
                        }];
                        self.transition_to(InteractionState::Selected(feature.id.clone()), intents)
                    }
                    (false, None) => Transition::unchanged(&self.state),
                    // Guard against annotating the same building twice
                    (true, Some(_)) => Transition::unchanged(&self.state),
                    (true, None) => {
                        let pending = PendingCreate {
                            id: feature.id.clone(),
                            anchor: feature.anchor,
                        };
                        let intents = vec![UiIntent::OpenCreateForm {
                            id: feature.id.clone(),
                            anchor: feature.anchor,
                            screen,
                        }];
                        self.transition_to(InteractionState::Pending(pending), intents)
                    }
                }
            }
        }
    }

    fn click_while_selected(
        &mut self,
        current: &BuildingId,
        target: Option<&ResolvedFeature>,
        modifiers: Modifiers,
        screen: ScreenPoint,
        store: &AnnotationStore,
    ) -> Transition {
        if modifiers.ctrl {
            return Transition::unchanged(&self.state);
        }
        match target {
            Some(feature) if &feature.id == current => {
                let route = self.route_for(current);
                let mut transition = Transition::unchanged(&self.state);
                transition.intents.push(UiIntent::Navigate { route });
                transition
            }
            Some(feature) => match store.get(&feature.id) {
                Some(record) => {
                    let intents = vec![UiIntent::ShowPopup {
                        id: feature.id.clone(),
                        record: record.clone(),
                        screen,
                    }];
                    self.transition_to(InteractionState::Selected(feature.id.clone()), intents)
                }
                None => self.transition_to(InteractionState::Idle, Vec::new()),
            },
            None => self.transition_to(InteractionState::Idle, Vec::new()),
        }
    }

    /// Pointer left the map surface. A pending create flow survives this.
    pub fn pointer_leave(&mut self) -> Transition {
        match self.state {
            InteractionState::Hovering(_) | InteractionState::Selected(_) => {
                self.transition_to(InteractionState::Idle, Vec::new())
            }
            InteractionState::Idle | InteractionState::Pending(_) => {
                Transition::unchanged(&self.state)
            }
        }
    }

    /// Commit the create form. On error the machine stays in `Pending`.
    pub fn submit(
        &mut self,
        record: AnnotationRecord,
        store: &mut AnnotationStore,
    ) -> Result<Transition, EngineError> {
        let InteractionState::Pending(pending) = &self.state else {
            return Err(EngineError::NoPendingCreate);
        };
        if pending.id != record.id {
            return Err(EngineError::InvalidRecord {
                id: record.id,
                reason: format!("form was opened for building {}", pending.id),
            });
        }
        store.upsert(record)?;
        Ok(self.transition_to(InteractionState::Idle, Vec::new()))
    }

    pub fn cancel(&mut self) -> Transition {
        if self.state.is_pending() {
            self.transition_to(InteractionState::Idle, Vec::new())
        } else {
            Transition::unchanged(&self.state)
        }
    }

    /// Drop hover/selection (used when the provider reloads its features).
    pub fn reset(&mut self) -> Transition {
        if self.state.is_pending() {
            Transition::unchanged(&self.state)
        } else {
            self.transition_to(InteractionState::Idle, Vec::new())
        }
    }

    pub fn route_for(&self, id: &BuildingId) -> String {
        self.route_template.replace("{id}", &id.to_string())
    }

    fn transition_to(&mut self, next: InteractionState, intents: Vec<UiIntent>) -> Transition {
        let previous = std::mem::replace(&mut self.state, next.clone());
        if previous != next {
            debug!("interaction {:?} -> {:?}", previous, next);
        }
        Transition {
            previous,
            next,
            intents,
        }
    }
}
