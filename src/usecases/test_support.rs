//! Test doubles shared by the use-case tests.

use crate::adapters::persistence::MemoryStore;
use crate::domain::{
    AIFeedback, AnalysisPrompt, DomainError, Precondition, QueueItem, QueueStatus, Response,
    Transition,
};
use crate::ports::{LanguageModelPort, QueueStore};
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// Language model that replays one canned reply and records every prompt it sees.
pub struct ScriptedModel {
    reply: Option<String>,
    delay: Duration,
    seen: Mutex<Vec<AnalysisPrompt>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<AnalysisPrompt> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LanguageModelPort for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &AnalysisPrompt) -> Result<String, DomainError> {
        self.seen.lock().unwrap().push(prompt.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply
            .clone()
            .ok_or_else(|| DomainError::Ai("provider returned 503".into()))
    }
}

/// In-memory store whose feedback writes always fail.
#[derive(Default)]
pub struct FailingAttachStore {
    inner: MemoryStore,
}

impl FailingAttachStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl QueueStore for FailingAttachStore {
    async fn insert_item(&self, item: &QueueItem) -> Result<(), DomainError> {
        self.inner.insert_item(item).await
    }

    async fn get_item(&self, id: &str) -> Result<Option<QueueItem>, DomainError> {
        self.inner.get_item(id).await
    }

    async fn transition(
        &self,
        id: &str,
        pre: &Precondition,
        transition: &Transition,
    ) -> Result<Option<QueueItem>, DomainError> {
        self.inner.transition(id, pre, transition).await
    }

    async fn list_by_status(&self, status: QueueStatus) -> Result<Vec<QueueItem>, DomainError> {
        self.inner.list_by_status(status).await
    }

    async fn list_lapsed_claims(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<QueueItem>, DomainError> {
        self.inner.list_lapsed_claims(now).await
    }

    async fn list_for_requester(
        &self,
        requester_id: &str,
    ) -> Result<Vec<QueueItem>, DomainError> {
        self.inner.list_for_requester(requester_id).await
    }

    async fn get_response(&self, response_id: &str) -> Result<Option<Response>, DomainError> {
        self.inner.get_response(response_id).await
    }

    async fn attach_feedback(
        &self,
        _response_id: &str,
        _feedback: &AIFeedback,
    ) -> Result<(), DomainError> {
        Err(DomainError::Repo("disk I/O error".into()))
    }
}

/// In-memory store that can release a claim just before the next item read,
/// standing in for an owner who lets go between a failed commit and its diagnosis.
#[derive(Default)]
pub struct ReleasingStore {
    inner: MemoryStore,
    armed: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl ReleasingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release_on_next_read(&self, actor_id: &str, at: DateTime<Utc>) {
        *self.armed.lock().unwrap() = Some((actor_id.to_string(), at));
    }
}

#[async_trait::async_trait]
impl QueueStore for ReleasingStore {
    async fn insert_item(&self, item: &QueueItem) -> Result<(), DomainError> {
        self.inner.insert_item(item).await
    }

    async fn get_item(&self, id: &str) -> Result<Option<QueueItem>, DomainError> {
        let armed = self.armed.lock().unwrap().take();
        if let Some((actor_id, at)) = armed {
            self.inner
                .transition(id, &Precondition::held_by(&actor_id), &Transition::Release { at })
                .await?;
        }
        self.inner.get_item(id).await
    }

    async fn transition(
        &self,
        id: &str,
        pre: &Precondition,
        transition: &Transition,
    ) -> Result<Option<QueueItem>, DomainError> {
        self.inner.transition(id, pre, transition).await
    }

    async fn list_by_status(&self, status: QueueStatus) -> Result<Vec<QueueItem>, DomainError> {
        self.inner.list_by_status(status).await
    }

    async fn list_lapsed_claims(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<QueueItem>, DomainError> {
        self.inner.list_lapsed_claims(now).await
    }

    async fn list_for_requester(
        &self,
        requester_id: &str,
    ) -> Result<Vec<QueueItem>, DomainError> {
        self.inner.list_for_requester(requester_id).await
    }

    async fn get_response(&self, response_id: &str) -> Result<Option<Response>, DomainError> {
        self.inner.get_response(response_id).await
    }

    async fn attach_feedback(
        &self,
        response_id: &str,
        feedback: &AIFeedback,
    ) -> Result<(), DomainError> {
        self.inner.attach_feedback(response_id, feedback).await
    }
}
