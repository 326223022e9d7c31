//! Error taxonomy for the annotation engine.
//!
//! Every variant is local and recoverable; none of them is meant to cross the
//! event loop.

use super::types::BuildingId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Rejected on upsert or create-form submission.
    #[error("invalid annotation record for building {id}: {reason}")]
    InvalidRecord { id: BuildingId, reason: String },

    /// No centroid could be computed; callers fall back to the first coordinate.
    #[error("degenerate geometry for building {id}")]
    DegenerateGeometry { id: BuildingId },

    /// Provider geometry contained non-finite or out-of-range coordinates.
    #[error("malformed pick geometry for building {id}")]
    MalformedPick { id: BuildingId },

    #[error("no create-annotation flow is pending")]
    NoPendingCreate,
}
