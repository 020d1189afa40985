//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by collaborators into the application
//! - Outbound: Called by application into infrastructure

pub mod inbound;
pub mod outbound;

pub use inbound::CounselorQueue;
pub use outbound::{Clock, LanguageModelPort, QueueStore};
