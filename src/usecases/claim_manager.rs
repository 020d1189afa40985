//! Claim lifecycle: enqueue, claim, release, lease-expiry sweep, archive.
//!
//! Every state change is one conditional write against the store. There is no
//! read-then-write anywhere: a read only happens after a failed write, to tell the
//! caller why it failed.

use crate::domain::{
    DomainError, ListFilter, NewRequest, Precondition, QueueItem, QueueStatus, Transition,
};
use crate::ports::{Clock, QueueStore};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Claim lease length. Fixed policy, not per-deployment configuration.
pub const CLAIM_LEASE_SECS: i64 = 2 * 60 * 60;

pub fn claim_lease() -> Duration {
    Duration::seconds(CLAIM_LEASE_SECS)
}

pub(crate) fn require_actor(actor_id: &str) -> Result<(), DomainError> {
    if actor_id.trim().is_empty() {
        return Err(DomainError::Validation("actor id must not be empty".into()));
    }
    Ok(())
}

pub struct ClaimManager {
    store: Arc<dyn QueueStore>,
    clock: Arc<dyn Clock>,
}

impl ClaimManager {
    pub fn new(store: Arc<dyn QueueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a pending item from a requester's submission.
    pub async fn enqueue(&self, request: NewRequest) -> Result<QueueItem, DomainError> {
        require_actor(&request.requester_id)?;
        if request.content.trim().is_empty() {
            return Err(DomainError::Validation(
                "request content must not be empty".into(),
            ));
        }
        let item = QueueItem::new(
            uuid::Uuid::new_v4().to_string(),
            request,
            self.clock.now(),
        );
        self.store.insert_item(&item).await?;
        info!(
            item_id = %item.id,
            mode = %item.response_mode,
            priority = %item.priority,
            "queue item created"
        );
        Ok(item)
    }

    /// Take the exclusive lease on a pending item. Losing a race yields `AlreadyClaimed`.
    pub async fn claim(&self, item_id: &str, actor_id: &str) -> Result<QueueItem, DomainError> {
        require_actor(actor_id)?;
        let now = self.clock.now();
        let transition = Transition::Claim {
            actor_id: actor_id.to_string(),
            at: now,
            deadline: now + claim_lease(),
        };
        match self
            .store
            .transition(item_id, &Precondition::pending(), &transition)
            .await?
        {
            Some(item) => {
                info!(item_id, actor_id, deadline = ?item.response_deadline, "item claimed");
                Ok(item)
            }
            None => {
                debug!(item_id, actor_id, "claim lost: item no longer pending");
                Err(DomainError::AlreadyClaimed {
                    item_id: item_id.to_string(),
                })
            }
        }
    }

    /// Give a held item back to the pool.
    pub async fn release(&self, item_id: &str, actor_id: &str) -> Result<QueueItem, DomainError> {
        require_actor(actor_id)?;
        let transition = Transition::Release {
            at: self.clock.now(),
        };
        if let Some(item) = self
            .store
            .transition(item_id, &Precondition::held_by(actor_id), &transition)
            .await?
        {
            info!(item_id, actor_id, "item released");
            return Ok(item);
        }

        let current = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("queue item {}", item_id)))?;
        if current.status == QueueStatus::Claimed {
            Err(DomainError::NotOwner {
                item_id: item_id.to_string(),
                actor_id: actor_id.to_string(),
            })
        } else {
            Err(DomainError::NotClaimed {
                item_id: item_id.to_string(),
            })
        }
    }

    /// Return every lapsed claim to `pending`. Safe to run repeatedly and concurrently:
    /// an item answered or released in the meantime simply fails its guard and is skipped.
    pub async fn sweep_expired(&self) -> Result<usize, DomainError> {
        let now = self.clock.now();
        let lapsed = self.store.list_lapsed_claims(now).await?;
        let mut released = 0;
        for item in lapsed {
            let outcome = self
                .store
                .transition(
                    &item.id,
                    &Precondition::lapsed(now),
                    &Transition::Release { at: now },
                )
                .await?;
            match outcome {
                Some(_) => {
                    released += 1;
                    warn!(
                        item_id = %item.id,
                        claimed_by = ?item.claimed_by,
                        "claim expired, item returned to queue"
                    );
                }
                None => debug!(item_id = %item.id, "lapsed claim already resolved"),
            }
        }
        if released > 0 {
            info!(released, "expired claims swept");
        }
        Ok(released)
    }

    /// Pending items, oldest first. The filter narrows, never reorders.
    pub async fn list_available(&self, filter: ListFilter) -> Result<Vec<QueueItem>, DomainError> {
        let mut items = self.store.list_by_status(QueueStatus::Pending).await?;
        items.retain(|i| filter.matches(i));
        Ok(items)
    }

    /// Archive answered items untouched for at least `cooldown`.
    pub async fn archive_answered(&self, cooldown: Duration) -> Result<usize, DomainError> {
        let now = self.clock.now();
        let cutoff = now - cooldown;
        let answered = self.store.list_by_status(QueueStatus::Answered).await?;
        let mut archived = 0;
        for item in answered.into_iter().filter(|i| i.updated_at <= cutoff) {
            if self
                .store
                .transition(
                    &item.id,
                    &Precondition::answered_before(cutoff),
                    &Transition::Archive { at: now },
                )
                .await?
                .is_some()
            {
                archived += 1;
            }
        }
        if archived > 0 {
            info!(archived, "answered items archived");
        }
        Ok(archived)
    }
}
