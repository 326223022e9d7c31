//! Provider-agnostic annotation reconciliation.
//!
//! Nothing in here depends on Bevy; the map adapter in `crate::map` implements
//! [`MapProvider`] and feeds pointer events into a [`ReconciliationDriver`].

mod driver;
mod error;
mod interaction;
mod provider;
mod resolver;
mod store;
mod sync;
mod types;

pub use driver::{EngineConfig, ImportSummary, ReconciliationDriver, DEFAULT_DRAG_THRESHOLD_PX};
pub use interaction::DEFAULT_ROUTE_TEMPLATE;
pub use provider::MapProvider;
pub use store::AnnotationStore;
pub use types::{
    AnnotationRecord, BuildingId, FeatureGeometry, GeoPoint, InteractionState, Modifiers,
    PickResult, PointerEvent, PointerEventKind, Ring, ScreenPoint, UiIntent, VisualState,
};

#[cfg(test)]
pub(crate) use provider::RecordingProvider;

#[cfg(test)]
mod tests;
