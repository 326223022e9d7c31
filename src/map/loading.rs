//! Async footprint loading (file I/O and GeoJSON parsing off the main thread).

use std::path::PathBuf;

use bevy::prelude::*;
use bevy::tasks::{IoTaskPool, Task};
use futures_lite::future;

use crate::config::{AppConfig, UpdateFootprintsPathRequest};
use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};

use super::camera::FocusCameraRequest;
use super::engine::AnnotationEngine;
use super::footprints::{parse_footprints, ParsedFootprints};

#[derive(Message)]
pub struct LoadFootprintsRequest {
    pub path: PathBuf,
}

/// Last footprint load failure, shown in a dialog until dismissed.
#[derive(Resource, Default)]
pub struct FootprintLoadError {
    pub message: Option<String>,
}

/// What is currently shown on the map.
#[derive(Resource, Default)]
pub struct FootprintSource {
    pub path: Option<PathBuf>,
    pub is_loading: bool,
    pub skipped: usize,
}

pub struct FootprintLoadResult {
    pub path: PathBuf,
    pub parsed: Option<ParsedFootprints>,
    pub error: Option<String>,
}

#[derive(Component)]
pub struct LoadFootprintsTask(pub Task<FootprintLoadResult>);

/// Startup system: reopen the footprints from the last session.
pub fn request_initial_footprints(
    config: Res<AppConfig>,
    mut load_events: MessageWriter<LoadFootprintsRequest>,
) {
    let Some(path) = &config.data.footprints_path else {
        info!("No footprints configured; use File > Open Footprints");
        return;
    };
    if !path.exists() {
        warn!("Configured footprints file no longer exists: {:?}", path);
        return;
    }
    load_events.write(LoadFootprintsRequest { path: path.clone() });
}

pub fn load_footprints_system(
    mut commands: Commands,
    mut events: MessageReader<LoadFootprintsRequest>,
    mut source: ResMut<FootprintSource>,
) {
    for event in events.read() {
        if source.is_loading {
            warn!("Footprint load already in progress");
            continue;
        }
        source.is_loading = true;

        let path = event.path.clone();
        let task = IoTaskPool::get().spawn(async move {
            let json = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    return FootprintLoadResult {
                        path,
                        parsed: None,
                        error: Some(format!("Failed to read footprints: {}", e)),
                    };
                }
            };

            match parse_footprints(&json) {
                Ok(parsed) => FootprintLoadResult {
                    path,
                    parsed: Some(parsed),
                    error: None,
                },
                Err(e) => FootprintLoadResult {
                    path,
                    parsed: None,
                    error: Some(format!("Failed to load footprints: {}", e)),
                },
            }
        });

        commands.spawn(LoadFootprintsTask(task));
    }
}

/// Hand finished loads to the provider and re-mark annotated buildings.
pub fn poll_footprint_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut LoadFootprintsTask)>,
    mut engine: ResMut<AnnotationEngine>,
    mut source: ResMut<FootprintSource>,
    mut load_error: ResMut<FootprintLoadError>,
    mut focus_events: MessageWriter<FocusCameraRequest>,
    mut config_events: MessageWriter<UpdateFootprintsPathRequest>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();
        source.is_loading = false;

        if let Some(error) = result.error {
            error!("{}", error);
            load_error.message = Some(error);
            continue;
        }
        let Some(parsed) = result.parsed else {
            continue;
        };

        let count = parsed.footprints.len();
        engine.driver.provider_mut().load(parsed.footprints);
        let patches = engine.driver.reset_provider_state();
        info!(
            "Loaded {} footprints from {:?} ({} skipped, {} annotated on map)",
            count,
            result.path,
            parsed.skipped,
            patches.len()
        );

        let (min, max) = engine
            .driver
            .provider()
            .footprints()
            .iter()
            .fold((Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)), |acc, f| {
                (acc.0.min(f.min), acc.1.max(f.max))
            });
        focus_events.write(FocusCameraRequest {
            world: (min + max) / 2.0,
            scale: Some(fit_scale(max - min)),
        });

        source.path = Some(result.path.clone());
        source.skipped = parsed.skipped;
        load_error.message = None;
        config_events.write(UpdateFootprintsPathRequest { path: result.path });
    }
}

/// Orthographic scale at which `extent` fills the default window with a margin.
pub fn fit_scale(extent: Vec2) -> f32 {
    let scale = (extent.x / DEFAULT_WINDOW_WIDTH).max(extent.y / DEFAULT_WINDOW_HEIGHT) * 1.1;
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_scale() {
        let scale = fit_scale(Vec2::new(DEFAULT_WINDOW_WIDTH * 2.0, 10.0));
        assert!((scale - 2.2).abs() < 1e-4);
        assert_eq!(fit_scale(Vec2::ZERO), 1.0);
        assert_eq!(fit_scale(Vec2::splat(f32::NEG_INFINITY)), 1.0);
    }

    #[test]
    fn test_footprint_source_default() {
        let source = FootprintSource::default();
        assert!(source.path.is_none());
        assert!(!source.is_loading);
    }
}
