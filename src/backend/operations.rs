//! Blocking backend calls. Run these on the IO task pool, never on the main schedule.

use std::fmt;
use std::path::{Path, PathBuf};

use bevy::log::warn;
use serde_json::Value;

use crate::engine::AnnotationRecord;

const USER_AGENT: &str = concat!("buildmark/", env!("CARGO_PKG_VERSION"));

/// Where annotation records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendTarget {
    /// REST collection at `{base_url}/annotations`
    Http { base_url: String },
    /// Whole-file JSON array of records
    File { path: PathBuf },
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendTarget::Http { base_url } => write!(f, "{}", collection_url(base_url)),
            BackendTarget::File { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Records decoded from the backend. Entries that are not valid records are
/// counted instead of failing the whole load.
#[derive(Debug, Default)]
pub struct FetchedRecords {
    pub records: Vec<AnnotationRecord>,
    pub malformed: usize,
}

pub fn collection_url(base_url: &str) -> String {
    format!("{}/annotations", base_url.trim_end_matches('/'))
}

/// Load every record from the backend.
pub fn fetch_all(target: &BackendTarget) -> Result<FetchedRecords, String> {
    match target {
        BackendTarget::Http { base_url } => {
            let url = collection_url(base_url);
            match ureq::get(&url).set("User-Agent", USER_AGENT).call() {
                Ok(resp) => resp
                    .into_json::<Vec<Value>>()
                    .map(decode_records)
                    .map_err(|e| format!("Failed to parse annotations from {}: {}", url, e)),
                // No collection yet - start empty
                Err(ureq::Error::Status(404, _)) => Ok(FetchedRecords::default()),
                Err(e) => Err(format!("Failed to fetch annotations from {}: {}", url, e)),
            }
        }
        BackendTarget::File { path } => {
            if !path.exists() {
                return Ok(FetchedRecords::default());
            }
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            parse_records(&json).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
        }
    }
}

/// Store one newly created record.
///
/// HTTP targets receive just the record; file targets are rewritten from
/// `snapshot`, which must already contain it.
pub fn persist_record(
    target: &BackendTarget,
    record: &AnnotationRecord,
    snapshot: &[AnnotationRecord],
) -> Result<(), String> {
    match target {
        BackendTarget::Http { base_url } => {
            let url = collection_url(base_url);
            ureq::post(&url)
                .set("User-Agent", USER_AGENT)
                .send_json(record)
                .map(|_| ())
                .map_err(|e| format!("Failed to save annotation {} to {}: {}", record.id, url, e))
        }
        BackendTarget::File { path } => write_records(path, snapshot),
    }
}

pub fn parse_records(json: &str) -> Result<FetchedRecords, serde_json::Error> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    Ok(decode_records(values))
}

fn decode_records(values: Vec<Value>) -> FetchedRecords {
    let mut fetched = FetchedRecords::default();
    for value in values {
        match serde_json::from_value::<AnnotationRecord>(value) {
            Ok(record) => fetched.records.push(record),
            Err(e) => {
                warn!("Skipping malformed annotation record: {}", e);
                fetched.malformed += 1;
            }
        }
    }
    fetched
}

/// Written to a temporary sibling, then renamed over `path`.
fn write_records(path: &Path, records: &[AnnotationRecord]) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
    }

    let json = serde_json::to_string_pretty(records)
        .map_err(|e| format!("Failed to serialize annotations: {}", e))?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json)
        .map_err(|e| format!("Failed to write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, path)
        .map_err(|e| format!("Failed to replace {}: {}", path.display(), e))
}
