//! Maintenance daemon: return lapsed claims to the queue and archive settled items.
//!
//! Runs on its own task; sleeps between cycles and stops when the token fires.

use crate::domain::DomainError;
use crate::usecases::claim_manager::ClaimManager;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of one maintenance cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceStats {
    pub claims_released: usize,
    pub items_archived: usize,
}

pub struct MaintenanceWorker {
    claims: Arc<ClaimManager>,
    /// Sleep duration between cycles.
    interval: Duration,
    /// How long an item stays `answered` before it is archived.
    archive_cooldown: chrono::Duration,
}

impl MaintenanceWorker {
    pub fn new(
        claims: Arc<ClaimManager>,
        interval: Duration,
        archive_cooldown: chrono::Duration,
    ) -> Self {
        Self {
            claims,
            interval,
            archive_cooldown,
        }
    }

    /// One cycle: sweep, then archive. A failed sweep does not skip archiving.
    pub async fn run_once(&self) -> Result<MaintenanceStats, DomainError> {
        let swept = self.claims.sweep_expired().await;
        let archived = self.claims.archive_answered(self.archive_cooldown).await;
        match (swept, archived) {
            (Ok(claims_released), Ok(items_archived)) => Ok(MaintenanceStats {
                claims_released,
                items_archived,
            }),
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }

    /// Run cycles until `cancel` fires. Cycle errors are logged and the loop continues.
    pub async fn run_loop(&self, cancel: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            cooldown_secs = self.archive_cooldown.num_seconds(),
            "Maintenance worker started"
        );
        loop {
            match self.run_once().await {
                Ok(stats) => debug!(
                    released = stats.claims_released,
                    archived = stats.items_archived,
                    "Maintenance cycle complete"
                ),
                Err(e) => warn!(error = %e, "Maintenance cycle failed; retrying next cycle"),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!("Maintenance worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::persistence::MemoryStore;
    use crate::domain::{NewRequest, Priority, QueueStatus, ResponseMode, Transition};
    use crate::domain::{Precondition, ResponderType, Response};
    use crate::ports::{Clock, QueueStore};
    use chrono::{TimeZone, Utc};

    struct Fixture {
        clock: Arc<ManualClock>,
        store: Arc<MemoryStore>,
        claims: Arc<ClaimManager>,
        worker: MaintenanceWorker,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryStore::new());
        let claims = Arc::new(ClaimManager::new(store.clone(), clock.clone()));
        let worker = MaintenanceWorker::new(
            claims.clone(),
            Duration::from_millis(10),
            chrono::Duration::hours(24),
        );
        Fixture {
            clock,
            store,
            claims,
            worker,
        }
    }

    fn request() -> NewRequest {
        NewRequest {
            requester_id: "req-3".into(),
            content: "I feel isolated at my new job".into(),
            response_mode: ResponseMode::Human,
            priority: Priority::Low,
            cultural_context: "south-asian".into(),
        }
    }

    async fn answer(f: &Fixture, item_id: &str) {
        let now = f.clock.now();
        let response = Response {
            id: format!("resp-{}", item_id),
            queue_item_id: item_id.to_string(),
            responder_id: "alice".into(),
            responder_type: ResponderType::Human,
            content: "That sounds lonely.".into(),
            timestamp: now,
            feedback: None,
        };
        f.store
            .transition(
                item_id,
                &Precondition::held_by_live("alice", now),
                &Transition::Answer { response },
            )
            .await
            .unwrap()
            .expect("answer committed");
    }

    #[tokio::test]
    async fn test_cycle_sweeps_lapsed_claims() {
        let f = fixture();
        let item = f.claims.enqueue(request()).await.unwrap();
        f.claims.claim(&item.id, "alice").await.unwrap();

        assert_eq!(f.worker.run_once().await.unwrap(), MaintenanceStats::default());

        f.clock.advance(chrono::Duration::hours(2));
        let stats = f.worker.run_once().await.unwrap();
        assert_eq!(stats.claims_released, 1);
        let stored = f.store.get_item(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.status, QueueStatus::Pending);
        assert!(stored.claimed_by.is_none());
    }

    #[tokio::test]
    async fn test_archive_respects_cooldown() {
        let f = fixture();
        let item = f.claims.enqueue(request()).await.unwrap();
        f.claims.claim(&item.id, "alice").await.unwrap();
        answer(&f, &item.id).await;

        f.clock.advance(chrono::Duration::hours(23));
        assert_eq!(f.worker.run_once().await.unwrap().items_archived, 0);

        f.clock.advance(chrono::Duration::hours(1));
        assert_eq!(f.worker.run_once().await.unwrap().items_archived, 1);
        let stored = f.store.get_item(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.status, QueueStatus::Archived);
        assert_eq!(stored.response_count, 1);

        assert_eq!(f.worker.run_once().await.unwrap().items_archived, 0);
    }

    #[tokio::test]
    async fn test_loop_stops_on_cancel() {
        let f = fixture();
        let worker = Arc::new(f.worker);
        let cancel = CancellationToken::new();
        let handle = {
            let worker = Arc::clone(&worker);
            let cancel = cancel.clone();
            tokio::spawn(async move { worker.run_loop(cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop exits after cancel")
            .unwrap();
    }
}
