//! Infrastructure adapters. Implement outbound ports.
//!
//! Persistence, language models, clocks. Map errors to DomainError.

pub mod ai;
pub mod clock;
pub mod persistence;
