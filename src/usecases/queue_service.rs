//! Collaborator-facing facade. Routes each inbound call to the use case that owns it.

use crate::domain::{AIFeedback, DomainError, ListFilter, NewRequest, QueueItem, ResponderType};
use crate::ports::CounselorQueue;
use crate::usecases::claim_manager::ClaimManager;
use crate::usecases::submission_service::SubmissionService;
use std::sync::Arc;

pub struct QueueService {
    claims: Arc<ClaimManager>,
    submissions: Arc<SubmissionService>,
}

impl QueueService {
    pub fn new(claims: Arc<ClaimManager>, submissions: Arc<SubmissionService>) -> Self {
        Self {
            claims,
            submissions,
        }
    }
}

#[async_trait::async_trait]
impl CounselorQueue for QueueService {
    async fn enqueue(&self, request: NewRequest) -> Result<QueueItem, DomainError> {
        self.claims.enqueue(request).await
    }

    async fn claim(&self, item_id: &str, actor_id: &str) -> Result<QueueItem, DomainError> {
        self.claims.claim(item_id, actor_id).await
    }

    async fn release(&self, item_id: &str, actor_id: &str) -> Result<QueueItem, DomainError> {
        self.claims.release(item_id, actor_id).await
    }

    async fn list_available(&self, filter: ListFilter) -> Result<Vec<QueueItem>, DomainError> {
        self.claims.list_available(filter).await
    }

    async fn submit(
        &self,
        item_id: &str,
        actor_id: &str,
        responder_type: ResponderType,
        content: &str,
    ) -> Result<String, DomainError> {
        self.submissions
            .submit(item_id, actor_id, responder_type, content)
            .await
    }

    async fn get_feedback(&self, response_id: &str) -> Result<Option<AIFeedback>, DomainError> {
        self.submissions.get_feedback(response_id).await
    }
}
