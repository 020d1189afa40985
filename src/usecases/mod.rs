//! Application use cases. Orchestrate domain logic via ports.

pub mod analysis_dispatcher;
pub mod analysis_service;
pub mod claim_manager;
pub mod maintenance_worker;
pub mod queue_service;
pub mod submission_service;

#[cfg(test)]
mod test_support;

pub use analysis_dispatcher::AnalysisDispatcher;
pub use analysis_service::AnalysisService;
pub use claim_manager::ClaimManager;
pub use maintenance_worker::{MaintenanceStats, MaintenanceWorker};
pub use queue_service::QueueService;
pub use submission_service::SubmissionService;
