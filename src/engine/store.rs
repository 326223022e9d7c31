//! Authoritative building id → annotation record map.

use std::collections::HashMap;

use tracing::warn;

use super::error::EngineError;
use super::types::{AnnotationRecord, BuildingId};

#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    records: HashMap<BuildingId, AnnotationRecord>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from backend records, skipping the ones that fail
    /// validation. Returns the store and the number of rejected records.
    pub fn from_records(records: impl IntoIterator<Item = AnnotationRecord>) -> (Self, usize) {
        let mut store = Self::new();
        let mut rejected = 0;
        for record in records {
            if let Err(e) = store.upsert(record) {
                warn!("Skipping annotation record: {}", e);
                rejected += 1;
            }
        }
        (store, rejected)
    }

    pub fn get(&self, id: &BuildingId) -> Option<&AnnotationRecord> {
        self.records.get(id)
    }

    pub fn has(&self, id: &BuildingId) -> bool {
        self.records.contains_key(id)
    }

    /// Insert or replace a record. The store is left unchanged on error.
    pub fn upsert(&mut self, record: AnnotationRecord) -> Result<(), EngineError> {
        validate_record(&record)?;
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Every annotated building id. Each call starts a fresh iteration.
    pub fn all_ids(&self) -> impl Iterator<Item = &BuildingId> + '_ {
        self.records.keys()
    }

    pub fn records(&self) -> impl Iterator<Item = &AnnotationRecord> + '_ {
        self.records.values()
    }

    /// Owned copy of every record, ordered by id, for hand-off to background tasks.
    pub fn snapshot(&self) -> Vec<AnnotationRecord> {
        let mut out: Vec<AnnotationRecord> = self.records.values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn validate_record(record: &AnnotationRecord) -> Result<(), EngineError> {
    let anchor = record.anchor;
    if !anchor.lat.is_finite() || !anchor.lng.is_finite() {
        return Err(EngineError::InvalidRecord {
            id: record.id.clone(),
            reason: "anchor coordinates must be finite".to_string(),
        });
    }
    if !(-90.0..=90.0).contains(&anchor.lat) {
        return Err(EngineError::InvalidRecord {
            id: record.id.clone(),
            reason: format!("latitude {} outside [-90, 90]", anchor.lat),
        });
    }
    if !(-180.0..=180.0).contains(&anchor.lng) {
        return Err(EngineError::InvalidRecord {
            id: record.id.clone(),
            reason: format!("longitude {} outside [-180, 180]", anchor.lng),
        });
    }
    Ok(())
}
