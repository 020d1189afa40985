//! Domain entities. Pure data structures for the core business.
//!
//! Queue items move through a restricted status graph; every mutation goes through
//! [`QueueItem::apply`] guarded by a [`Precondition`] that the store checks atomically.

use crate::domain::{AIFeedback, DomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a queue item is meant to be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Ai,
    Human,
}

/// Who produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponderType {
    Ai,
    Human,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Claimed,
    Answered,
    Archived,
}

/// Advisory triage label for human responders. Never affects ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

macro_rules! str_enum {
    ($ty:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $s),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok($ty::$variant),)+
                    other => Err(DomainError::Validation(format!(
                        "unknown {}: {}",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }
    };
}

str_enum!(ResponseMode { Ai => "ai", Human => "human" });
str_enum!(ResponderType { Ai => "ai", Human => "human" });
str_enum!(QueueStatus {
    Pending => "pending",
    Claimed => "claimed",
    Answered => "answered",
    Archived => "archived",
});
str_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

impl QueueStatus {
    /// Edges of the status graph. `Pending -> Answered` exists only for the automated path.
    pub fn can_transition_to(self, next: QueueStatus) -> bool {
        use QueueStatus::*;
        matches!(
            (self, next),
            (Pending, Claimed)
                | (Claimed, Pending)
                | (Claimed, Answered)
                | (Pending, Answered)
                | (Answered, Archived)
        )
    }
}

/// A support request awaiting an automated or human response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: String,
    pub requester_id: String,
    pub content: String,
    pub response_mode: ResponseMode,
    pub status: QueueStatus,
    pub priority: Priority,
    pub cultural_context: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub response_deadline: Option<DateTime<Utc>>,
    pub response_count: u32,
    #[serde(default)]
    pub responses: Vec<Response>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: String,
    pub queue_item_id: String,
    pub responder_id: String,
    pub responder_type: ResponderType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub feedback: Option<AIFeedback>,
}

/// Fields supplied by a requester when a new item is queued.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub requester_id: String,
    pub content: String,
    pub response_mode: ResponseMode,
    pub priority: Priority,
    pub cultural_context: String,
}

/// Narrows `list_available` without reordering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFilter {
    pub priority: Option<Priority>,
    pub response_mode: Option<ResponseMode>,
}

impl ListFilter {
    pub fn matches(&self, item: &QueueItem) -> bool {
        self.priority.is_none_or(|p| item.priority == p)
            && self.response_mode.is_none_or(|m| item.response_mode == m)
    }
}

/// Lease condition evaluated at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseCheck {
    Any,
    /// Deadline strictly after the instant.
    LiveAt(DateTime<Utc>),
    /// Deadline at or before the instant.
    LapsedAt(DateTime<Utc>),
}

/// Condition that must hold on the stored item for a transition to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    pub status: QueueStatus,
    pub claimed_by: Option<String>,
    pub response_mode: Option<ResponseMode>,
    pub lease: LeaseCheck,
    pub updated_at_or_before: Option<DateTime<Utc>>,
}

impl Precondition {
    fn status(status: QueueStatus) -> Self {
        Self {
            status,
            claimed_by: None,
            response_mode: None,
            lease: LeaseCheck::Any,
            updated_at_or_before: None,
        }
    }

    pub fn pending() -> Self {
        Self::status(QueueStatus::Pending)
    }

    /// Automated direct path: still pending and routed to the model.
    pub fn pending_ai() -> Self {
        Self {
            response_mode: Some(ResponseMode::Ai),
            ..Self::pending()
        }
    }

    pub fn held_by(actor_id: &str) -> Self {
        Self {
            claimed_by: Some(actor_id.to_string()),
            ..Self::status(QueueStatus::Claimed)
        }
    }

    /// Held by `actor_id` with a lease that has not lapsed at `now`.
    pub fn held_by_live(actor_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            lease: LeaseCheck::LiveAt(now),
            ..Self::held_by(actor_id)
        }
    }

    /// Claimed by anyone, lease lapsed at `now`.
    pub fn lapsed(now: DateTime<Utc>) -> Self {
        Self {
            lease: LeaseCheck::LapsedAt(now),
            ..Self::status(QueueStatus::Claimed)
        }
    }

    pub fn answered_before(cutoff: DateTime<Utc>) -> Self {
        Self {
            updated_at_or_before: Some(cutoff),
            ..Self::status(QueueStatus::Answered)
        }
    }

    pub fn holds(&self, item: &QueueItem) -> bool {
        if item.status != self.status {
            return false;
        }
        if let Some(actor) = &self.claimed_by {
            if item.claimed_by.as_deref() != Some(actor.as_str()) {
                return false;
            }
        }
        if let Some(mode) = self.response_mode {
            if item.response_mode != mode {
                return false;
            }
        }
        let lease_ok = match (self.lease, item.response_deadline) {
            (LeaseCheck::Any, _) => true,
            (LeaseCheck::LiveAt(now), Some(deadline)) => deadline > now,
            (LeaseCheck::LapsedAt(now), Some(deadline)) => deadline <= now,
            (_, None) => false,
        };
        if !lease_ok {
            return false;
        }
        self.updated_at_or_before
            .is_none_or(|cutoff| item.updated_at <= cutoff)
    }
}

/// A single status change. Applied only after its [`Precondition`] holds.
#[derive(Debug, Clone)]
pub enum Transition {
    Claim {
        actor_id: String,
        at: DateTime<Utc>,
        deadline: DateTime<Utc>,
    },
    Release {
        at: DateTime<Utc>,
    },
    Answer {
        response: Response,
    },
    Archive {
        at: DateTime<Utc>,
    },
}

impl Transition {
    pub fn target(&self) -> QueueStatus {
        match self {
            Transition::Claim { .. } => QueueStatus::Claimed,
            Transition::Release { .. } => QueueStatus::Pending,
            Transition::Answer { .. } => QueueStatus::Answered,
            Transition::Archive { .. } => QueueStatus::Archived,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Transition::Claim { at, .. }
            | Transition::Release { at }
            | Transition::Archive { at } => *at,
            Transition::Answer { response } => response.timestamp,
        }
    }

    /// Rejects edges outside the status graph.
    pub fn check_from(&self, from: QueueStatus) -> Result<(), DomainError> {
        let to = self.target();
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition { from, to })
        }
    }
}

impl QueueItem {
    pub fn new(id: String, request: NewRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            requester_id: request.requester_id,
            content: request.content,
            response_mode: request.response_mode,
            status: QueueStatus::Pending,
            priority: request.priority,
            cultural_context: request.cultural_context,
            created_at: now,
            updated_at: now,
            claimed_by: None,
            claimed_at: None,
            response_deadline: None,
            response_count: 0,
            responses: Vec::new(),
        }
    }

    /// Apply a transition in place. Claim fields (and the deadline) exist only while claimed.
    pub fn apply(&mut self, transition: &Transition) -> Result<(), DomainError> {
        transition.check_from(self.status)?;
        match transition {
            Transition::Claim {
                actor_id,
                at,
                deadline,
            } => {
                self.claimed_by = Some(actor_id.clone());
                self.claimed_at = Some(*at);
                self.response_deadline = Some(*deadline);
            }
            Transition::Release { .. } | Transition::Archive { .. } => self.clear_claim(),
            Transition::Answer { response } => {
                self.clear_claim();
                self.response_count += 1;
                self.responses.push(response.clone());
            }
        }
        self.status = transition.target();
        self.updated_at = transition.at();
        Ok(())
    }

    fn clear_claim(&mut self) {
        self.claimed_by = None;
        self.claimed_at = None;
        self.response_deadline = None;
    }

    /// Creation-time order with id as tie-breaker.
    pub fn fifo_cmp(&self, other: &QueueItem) -> std::cmp::Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}
