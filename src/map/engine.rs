//! The annotation engine as a Bevy resource.

use bevy::prelude::*;

use crate::config::AppConfig;
use crate::engine::{AnnotationStore, EngineConfig, ReconciliationDriver};

use super::picking::FootprintProvider;

/// Single owner of the store, interaction state and footprint provider.
#[derive(Resource)]
pub struct AnnotationEngine {
    pub driver: ReconciliationDriver<FootprintProvider>,
}

impl Default for AnnotationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AnnotationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            driver: ReconciliationDriver::new(
                FootprintProvider::new(),
                AnnotationStore::new(),
                config,
            ),
        }
    }
}

/// Startup system: rebuild the engine with the loaded configuration.
///
/// Runs before any footprints or records are loaded, so nothing is lost.
pub fn configure_engine(config: Res<AppConfig>, mut engine: ResMut<AnnotationEngine>) {
    let engine_config = config.data.engine_config();
    info!(
        "Annotation engine: drag threshold {}px, route template {:?}",
        engine_config.drag_threshold_px, engine_config.route_template
    );
    *engine = AnnotationEngine::new(engine_config);
}
