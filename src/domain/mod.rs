//! Core domain layer. No external I/O dependencies.
//!
//! Entities, the status graph, prompt construction, output parsing and
//! quality classification live here. Dependencies flow inward.

pub mod culture;
pub mod entities;
pub mod errors;
pub mod feedback;
pub mod parser;
pub mod prompt;
pub mod quality;

pub use culture::CulturalBackground;
pub use entities::{
    LeaseCheck, ListFilter, NewRequest, Precondition, Priority, QueueItem, QueueStatus,
    ResponderType, Response, ResponseMode, Transition,
};
pub use errors::DomainError;
pub use feedback::{AIFeedback, ScoreCard, TrainingDataQuality, ValidatedFeedback};
pub use prompt::{AnalysisContext, AnalysisPrompt, ConversationTurn, Speaker};
