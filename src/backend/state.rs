//! Resources, messages and task components for backend sync.

use std::collections::VecDeque;

use bevy::prelude::*;
use bevy::tasks::Task;

use crate::engine::{AnnotationRecord, BuildingId, ImportSummary};

use super::operations::{BackendTarget, FetchedRecords};

/// Reload every record from the configured backend.
#[derive(Message)]
pub struct ReloadAnnotationsRequest;

/// Persist a record that was just accepted by the engine.
#[derive(Message)]
pub struct PersistAnnotationRequest {
    pub record: AnnotationRecord,
}

/// Last backend failure, shown in a dialog until dismissed.
#[derive(Resource, Default)]
pub struct BackendError {
    pub message: Option<String>,
}

#[derive(Resource, Default)]
pub struct BackendStatus {
    pub is_loading: bool,
    pub is_saving: bool,
    /// Human readable target of the last completed load
    pub loaded_from: Option<String>,
    pub last_import: Option<ImportSummary>,
    /// Records waiting to be persisted, oldest first. Saves run one at a time so
    /// file snapshots are written in order.
    pub queued: VecDeque<AnnotationRecord>,
    /// A reload arrived while a load was running
    pub reload_requested: bool,
}

impl BackendStatus {
    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_saving
    }

    /// Start a load, or remember the request if one is already running.
    /// Returns whether the caller should start fetching now.
    pub fn begin_load(&mut self) -> bool {
        if self.is_loading {
            self.reload_requested = true;
            return false;
        }
        self.is_loading = true;
        true
    }

    /// Mark the running load finished. Returns whether another load was
    /// requested in the meantime.
    pub fn finish_load(&mut self) -> bool {
        self.is_loading = false;
        std::mem::take(&mut self.reload_requested)
    }
}

pub struct FetchResult {
    pub target: BackendTarget,
    pub fetched: Option<FetchedRecords>,
    pub error: Option<String>,
}

impl FetchResult {
    /// Whether this result came from `current`. Results from a backend that was
    /// switched away from mid-load are dropped.
    pub fn is_for(&self, current: &BackendTarget) -> bool {
        &self.target == current
    }
}

pub struct PersistResult {
    pub id: BuildingId,
    pub error: Option<String>,
}

#[derive(Component)]
pub struct FetchAnnotationsTask(pub Task<FetchResult>);

#[derive(Component)]
pub struct PersistAnnotationTask(pub Task<PersistResult>);
