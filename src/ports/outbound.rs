//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    AIFeedback, AnalysisPrompt, DomainError, Precondition, QueueItem, QueueStatus, Response,
    Transition,
};
use chrono::{DateTime, Utc};

/// Persistent queue store. The only mutation of an existing item is [`QueueStore::transition`].
/// There is no delete: items are archived, never removed.
#[async_trait::async_trait]
pub trait QueueStore: Send + Sync {
    /// Insert a freshly created item.
    async fn insert_item(&self, item: &QueueItem) -> Result<(), DomainError>;

    /// Fetch an item with its responses.
    async fn get_item(&self, id: &str) -> Result<Option<QueueItem>, DomainError>;

    /// Atomic conditional write. Applies `transition` only if `pre` holds on the stored item
    /// at commit time, in one step. `Answer` also persists its response in the same step.
    ///
    /// Returns the updated item, or `None` when the precondition did not hold.
    /// Errors with `NotFound` for unknown ids.
    async fn transition(
        &self,
        id: &str,
        pre: &Precondition,
        transition: &Transition,
    ) -> Result<Option<QueueItem>, DomainError>;

    /// Items in `status`, ordered by creation time ascending, ties by id.
    async fn list_by_status(&self, status: QueueStatus) -> Result<Vec<QueueItem>, DomainError>;

    /// Claimed items whose deadline is at or before `now`.
    async fn list_lapsed_claims(&self, now: DateTime<Utc>)
    -> Result<Vec<QueueItem>, DomainError>;

    /// All items of one requester, oldest first.
    async fn list_for_requester(&self, requester_id: &str)
    -> Result<Vec<QueueItem>, DomainError>;

    async fn get_response(&self, response_id: &str) -> Result<Option<Response>, DomainError>;

    /// Attach analysis output to a response. A single write; callers do not retry.
    async fn attach_feedback(
        &self,
        response_id: &str,
        feedback: &AIFeedback,
    ) -> Result<(), DomainError>;
}

/// Text-completion provider. Returns unconstrained free text.
#[async_trait::async_trait]
pub trait LanguageModelPort: Send + Sync {
    /// Model identifier recorded on each feedback record.
    fn model_id(&self) -> &str;

    async fn complete(&self, prompt: &AnalysisPrompt) -> Result<String, DomainError>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
