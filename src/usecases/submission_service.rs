//! Response submission. Commits the response and the status change in one
//! conditional write, then hands human responses to the analysis dispatcher.

use crate::domain::{
    AIFeedback, DomainError, Precondition, QueueItem, QueueStatus, ResponderType, Response,
    ResponseMode, Transition,
};
use crate::ports::{Clock, QueueStore};
use crate::usecases::analysis_dispatcher::AnalysisDispatcher;
use crate::usecases::claim_manager::require_actor;
use std::sync::Arc;
use tracing::{debug, info};

/// Upper bound on response length, in characters.
pub const MAX_RESPONSE_CHARS: usize = 10_000;

pub struct SubmissionService {
    store: Arc<dyn QueueStore>,
    clock: Arc<dyn Clock>,
    /// Absent when analysis is disabled; submissions still succeed.
    analysis: Option<Arc<AnalysisDispatcher>>,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn QueueStore>,
        clock: Arc<dyn Clock>,
        analysis: Option<Arc<AnalysisDispatcher>>,
    ) -> Self {
        Self {
            store,
            clock,
            analysis,
        }
    }

    /// Record a response. Human responders must hold a live claim at commit time;
    /// automated responses go straight from `pending` on `ai` items.
    ///
    /// Returns as soon as the response is durable. Analysis runs detached.
    pub async fn submit(
        &self,
        item_id: &str,
        actor_id: &str,
        responder_type: ResponderType,
        content: &str,
    ) -> Result<String, DomainError> {
        require_actor(actor_id)?;
        validate_content(content)?;

        let now = self.clock.now();
        let response = Response {
            id: uuid::Uuid::new_v4().to_string(),
            queue_item_id: item_id.to_string(),
            responder_id: actor_id.to_string(),
            responder_type,
            content: content.to_string(),
            timestamp: now,
            feedback: None,
        };
        let pre = match responder_type {
            ResponderType::Human => Precondition::held_by_live(actor_id, now),
            ResponderType::Ai => Precondition::pending_ai(),
        };
        let transition = Transition::Answer {
            response: response.clone(),
        };

        let Some(item) = self.store.transition(item_id, &pre, &transition).await? else {
            return Err(self.rejection(item_id, actor_id, responder_type).await);
        };

        info!(
            item_id,
            response_id = %response.id,
            responder = %responder_type,
            "response recorded"
        );

        if responder_type == ResponderType::Human {
            match &self.analysis {
                Some(dispatcher) => dispatcher.dispatch(item, response.clone()),
                None => debug!(response_id = %response.id, "analysis disabled; no feedback will attach"),
            }
        }

        Ok(response.id)
    }

    /// Feedback for a response. `None` until (and unless) analysis attaches it.
    pub async fn get_feedback(&self, response_id: &str) -> Result<Option<AIFeedback>, DomainError> {
        self.store
            .get_response(response_id)
            .await?
            .map(|r| r.feedback)
            .ok_or_else(|| DomainError::NotFound(format!("response {}", response_id)))
    }

    /// Explain a failed commit by looking at what the item is now.
    async fn rejection(
        &self,
        item_id: &str,
        actor_id: &str,
        responder_type: ResponderType,
    ) -> DomainError {
        let current: QueueItem = match self.store.get_item(item_id).await {
            Ok(Some(item)) => item,
            Ok(None) => return DomainError::NotFound(format!("queue item {}", item_id)),
            Err(e) => return e,
        };
        let item_id = item_id.to_string();
        match (responder_type, current.status) {
            (_, QueueStatus::Answered | QueueStatus::Archived) => {
                DomainError::AlreadyAnswered { item_id }
            }
            (ResponderType::Human, QueueStatus::Claimed)
                if current.claimed_by.as_deref() == Some(actor_id) =>
            {
                DomainError::Expired { item_id }
            }
            (ResponderType::Human, QueueStatus::Claimed) => DomainError::NotOwner {
                item_id,
                actor_id: actor_id.to_string(),
            },
            // Swept and never-held leases look the same once claim fields are cleared.
            (ResponderType::Human, QueueStatus::Pending) => DomainError::Expired { item_id },
            (ResponderType::Ai, QueueStatus::Claimed) => DomainError::AlreadyClaimed { item_id },
            (ResponderType::Ai, QueueStatus::Pending)
                if current.response_mode == ResponseMode::Human =>
            {
                DomainError::Validation(format!(
                    "queue item {} is routed to human responders",
                    item_id
                ))
            }
            // Held at commit time and released before this read.
            (ResponderType::Ai, QueueStatus::Pending) => DomainError::AlreadyClaimed { item_id },
        }
    }
}

fn validate_content(content: &str) -> Result<(), DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::Validation(
            "response content must not be empty".into(),
        ));
    }
    let chars = content.chars().count();
    if chars > MAX_RESPONSE_CHARS {
        return Err(DomainError::Validation(format!(
            "response is {} characters; limit is {}",
            chars, MAX_RESPONSE_CHARS
        )));
    }
    Ok(())
}
