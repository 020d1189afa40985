//! counsel-queue: Claim-based counseling queue with AI feedback, in Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
