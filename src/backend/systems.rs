//! Bevy systems for loading and persisting annotation records.

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use futures_lite::future;

use crate::config::AppConfig;
use crate::map::AnnotationEngine;

use super::operations::{fetch_all, persist_record};
use super::state::{
    BackendError, BackendStatus, FetchAnnotationsTask, FetchResult, PersistAnnotationRequest,
    PersistAnnotationTask, PersistResult, ReloadAnnotationsRequest,
};

/// Startup system: load records from the configured backend.
pub fn request_initial_load(mut reload_events: MessageWriter<ReloadAnnotationsRequest>) {
    reload_events.write(ReloadAnnotationsRequest);
}

pub fn start_fetch_system(
    mut commands: Commands,
    mut events: MessageReader<ReloadAnnotationsRequest>,
    mut status: ResMut<BackendStatus>,
    config: Res<AppConfig>,
) {
    // Several reload requests in one frame collapse into one fetch
    if events.read().count() == 0 {
        return;
    }
    if !status.begin_load() {
        info!("Annotation load in progress, reloading when it finishes");
        return;
    }

    let target = config.data.backend_target();
    info!("Loading annotations from {}", target);
    let task = IoTaskPool::get().spawn(async move {
        match fetch_all(&target) {
            Ok(fetched) => FetchResult {
                target,
                fetched: Some(fetched),
                error: None,
            },
            Err(error) => FetchResult {
                target,
                fetched: None,
                error: Some(error),
            },
        }
    });

    commands.spawn(FetchAnnotationsTask(task));
}

pub fn poll_fetch_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut FetchAnnotationsTask)>,
    mut status: ResMut<BackendStatus>,
    mut backend_error: ResMut<BackendError>,
    mut engine: ResMut<AnnotationEngine>,
    mut reload_events: MessageWriter<ReloadAnnotationsRequest>,
    config: Res<AppConfig>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();
        if status.finish_load() {
            reload_events.write(ReloadAnnotationsRequest);
        }

        let current = config.data.backend_target();
        if !result.is_for(&current) {
            info!(
                "Discarding annotations from {} (backend is now {})",
                result.target, current
            );
            continue;
        }

        if let Some(error) = result.error {
            error!("{}", error);
            backend_error.message = Some(error);
            continue;
        }
        let Some(fetched) = result.fetched else {
            continue;
        };

        let mut summary = engine.driver.import_records(fetched.records);
        summary.rejected += fetched.malformed;
        info!(
            "Imported {} annotations from {} ({} rejected)",
            summary.imported, result.target, summary.rejected
        );
        status.loaded_from = Some(result.target.to_string());
        status.last_import = Some(summary);
    }
}

pub fn queue_persist_system(
    mut events: MessageReader<PersistAnnotationRequest>,
    mut status: ResMut<BackendStatus>,
) {
    for event in events.read() {
        status.queued.push_back(event.record.clone());
    }
}

/// Start the next queued save when none is running.
pub fn dispatch_persist_system(
    mut commands: Commands,
    mut status: ResMut<BackendStatus>,
    config: Res<AppConfig>,
    engine: Res<AnnotationEngine>,
) {
    if status.is_saving {
        return;
    }
    let Some(record) = status.queued.pop_front() else {
        return;
    };
    status.is_saving = true;

    let target = config.data.backend_target();
    // Copy-on-read: the task never touches the live store
    let snapshot = engine.driver.store().snapshot();
    let task = IoTaskPool::get().spawn(async move {
        let error = persist_record(&target, &record, &snapshot).err();
        PersistResult {
            id: record.id,
            error,
        }
    });

    commands.spawn(PersistAnnotationTask(task));
}

pub fn poll_persist_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut PersistAnnotationTask)>,
    mut status: ResMut<BackendStatus>,
    mut backend_error: ResMut<BackendError>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();
        status.is_saving = false;

        match result.error {
            Some(error) => {
                error!("{}", error);
                backend_error.message = Some(error);
            }
            None => info!("Annotation for building {} saved", result.id),
        }
    }
}
