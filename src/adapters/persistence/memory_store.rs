//! In-process QueueStore. Each item sits behind its own mutex, so a conditional
//! transition locks exactly one key; the outer map lock is held only to look the key up.

use crate::domain::{
    AIFeedback, DomainError, Precondition, QueueItem, QueueStatus, Response, Transition,
};
use crate::ports::QueueStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type Slot = Arc<Mutex<QueueItem>>;

#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, Slot>>,
    /// response_id -> queue_item_id
    responses: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: &str) -> Option<Slot> {
        self.items.read().await.get(id).cloned()
    }

    /// Snapshot of every item matching `keep`, in FIFO order.
    async fn collect_where<F>(&self, keep: F) -> Vec<QueueItem>
    where
        F: Fn(&QueueItem) -> bool,
    {
        let slots: Vec<Slot> = self.items.read().await.values().cloned().collect();
        let mut out = Vec::new();
        for slot in slots {
            let item = slot.lock().await;
            if keep(&item) {
                out.push(item.clone());
            }
        }
        out.sort_by(QueueItem::fifo_cmp);
        out
    }
}

#[async_trait::async_trait]
impl QueueStore for MemoryStore {
    async fn insert_item(&self, item: &QueueItem) -> Result<(), DomainError> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Err(DomainError::Repo(format!(
                "duplicate queue item id {}",
                item.id
            )));
        }
        items.insert(item.id.clone(), Arc::new(Mutex::new(item.clone())));
        Ok(())
    }

    async fn get_item(&self, id: &str) -> Result<Option<QueueItem>, DomainError> {
        match self.slot(id).await {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn transition(
        &self,
        id: &str,
        pre: &Precondition,
        transition: &Transition,
    ) -> Result<Option<QueueItem>, DomainError> {
        transition.check_from(pre.status)?;
        let slot = self
            .slot(id)
            .await
            .ok_or_else(|| DomainError::NotFound(format!("queue item {}", id)))?;
        let mut item = slot.lock().await;
        if !pre.holds(&item) {
            return Ok(None);
        }
        item.apply(transition)?;
        if let Transition::Answer { response } = transition {
            self.responses
                .write()
                .await
                .insert(response.id.clone(), item.id.clone());
        }
        Ok(Some(item.clone()))
    }

    async fn list_by_status(&self, status: QueueStatus) -> Result<Vec<QueueItem>, DomainError> {
        Ok(self.collect_where(|i| i.status == status).await)
    }

    async fn list_lapsed_claims(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<QueueItem>, DomainError> {
        Ok(self
            .collect_where(|i| {
                i.status == QueueStatus::Claimed && i.response_deadline.is_some_and(|d| d <= now)
            })
            .await)
    }

    async fn list_for_requester(
        &self,
        requester_id: &str,
    ) -> Result<Vec<QueueItem>, DomainError> {
        Ok(self
            .collect_where(|i| i.requester_id == requester_id)
            .await)
    }

    async fn get_response(&self, response_id: &str) -> Result<Option<Response>, DomainError> {
        let item_id = match self.responses.read().await.get(response_id) {
            Some(id) => id.clone(),
            None => return Ok(None),
        };
        let Some(slot) = self.slot(&item_id).await else {
            return Ok(None);
        };
        let item = slot.lock().await;
        Ok(item.responses.iter().find(|r| r.id == response_id).cloned())
    }

    async fn attach_feedback(
        &self,
        response_id: &str,
        feedback: &AIFeedback,
    ) -> Result<(), DomainError> {
        let item_id = self
            .responses
            .read()
            .await
            .get(response_id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("response {}", response_id)))?;
        let slot = self
            .slot(&item_id)
            .await
            .ok_or_else(|| DomainError::NotFound(format!("queue item {}", item_id)))?;
        let mut item = slot.lock().await;
        let response = item
            .responses
            .iter_mut()
            .find(|r| r.id == response_id)
            .ok_or_else(|| DomainError::NotFound(format!("response {}", response_id)))?;
        response.feedback = Some(feedback.clone());
        Ok(())
    }
}
