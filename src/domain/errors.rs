//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use crate::domain::QueueStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Rejected before anything is persisted (empty content, blank actor id).
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Lost a claim race or the item is no longer pending. Re-fetch the list; do not spin.
    #[error("Queue item {item_id} is already claimed")]
    AlreadyClaimed { item_id: String },

    #[error("Queue item {item_id} is not held by {actor_id}")]
    NotOwner { item_id: String, actor_id: String },

    #[error("Queue item {item_id} is not claimed")]
    NotClaimed { item_id: String },

    /// The claim lapsed before the response was committed. Also returned when the
    /// item is back in `pending`: a swept lease leaves no trace of its holder, so it
    /// cannot be told apart from a claim that was never taken.
    #[error("Claim on queue item {item_id} expired")]
    Expired { item_id: String },

    #[error("Queue item {item_id} has already been answered")]
    AlreadyAnswered { item_id: String },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: QueueStatus, to: QueueStatus },

    /// Persistence failure. Fatal for the calling operation; reported verbatim.
    #[error("Repository error: {0}")]
    Repo(String),

    #[error("AI analysis failed: {0}")]
    Ai(String),
}

impl DomainError {
    /// Recoverable conflicts: the caller re-fetches and decides; nothing retries automatically.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::AlreadyClaimed { .. }
                | DomainError::NotOwner { .. }
                | DomainError::NotClaimed { .. }
                | DomainError::Expired { .. }
                | DomainError::AlreadyAnswered { .. }
        )
    }
}
