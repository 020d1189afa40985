//! Detached analysis tasks. Spawned per submitted human response.
//!
//! Each task races a shared cancellation token, so shutdown can drop in-flight work:
//! feedback is attached in one write or not at all. Concurrency is bounded by a semaphore.

use crate::domain::{QueueItem, Response};
use crate::usecases::analysis_service::AnalysisService;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

/// Maximum concurrent provider calls.
const MAX_CONCURRENT: usize = 4;

pub struct AnalysisDispatcher {
    service: Arc<AnalysisService>,
    tracker: TaskTracker,
    cancel: CancellationToken,
    permits: Arc<Semaphore>,
}

impl AnalysisDispatcher {
    pub fn new(service: Arc<AnalysisService>, cancel: CancellationToken) -> Self {
        Self {
            service,
            tracker: TaskTracker::new(),
            cancel,
            permits: Arc::new(Semaphore::new(MAX_CONCURRENT)),
        }
    }

    /// Schedule analysis of `response`. Returns immediately.
    pub fn dispatch(&self, item: QueueItem, response: Response) {
        let service = Arc::clone(&self.service);
        let cancel = self.cancel.clone();
        let permits = Arc::clone(&self.permits);

        self.tracker.spawn(async move {
            let work = async {
                let Ok(_permit) = permits.acquire().await else {
                    return;
                };
                match service.analyze_and_attach(&item, &response).await {
                    Ok(_) => debug!(response_id = %response.id, "analysis task finished"),
                    Err(e) => error!(
                        response_id = %response.id,
                        error = %e,
                        "feedback not attached; response stays without feedback"
                    ),
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(response_id = %response.id, "analysis cancelled before completion");
                }
                _ = work => {}
            }
        });
    }

    /// Number of analysis tasks still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every dispatched task has finished. New dispatches are accepted afterwards.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel in-flight analysis and wait for the tasks to unwind.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        info!("analysis dispatcher stopped");
    }
}
