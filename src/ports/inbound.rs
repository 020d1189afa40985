//! Inbound port. Collaborators (API layer, workers) call into the application.

use crate::domain::{AIFeedback, DomainError, ListFilter, NewRequest, QueueItem, ResponderType};

/// The queue as seen from outside. Everything is synchronous for the caller
/// except feedback attachment, which is only observable on a later `get_feedback`.
#[async_trait::async_trait]
pub trait CounselorQueue: Send + Sync {
    async fn enqueue(&self, request: NewRequest) -> Result<QueueItem, DomainError>;

    async fn claim(&self, item_id: &str, actor_id: &str) -> Result<QueueItem, DomainError>;

    async fn release(&self, item_id: &str, actor_id: &str) -> Result<QueueItem, DomainError>;

    async fn list_available(&self, filter: ListFilter) -> Result<Vec<QueueItem>, DomainError>;

    /// Returns the new response id.
    async fn submit(
        &self,
        item_id: &str,
        actor_id: &str,
        responder_type: ResponderType,
        content: &str,
    ) -> Result<String, DomainError>;

    /// `None` while analysis has not attached anything (or never will).
    async fn get_feedback(&self, response_id: &str) -> Result<Option<AIFeedback>, DomainError>;
}
