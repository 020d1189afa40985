//! Review flag and training-data quality labels derived from validated scores.
//!
//! Thresholds live here and nowhere else; display code reads these constants.

use crate::domain::feedback::{ScoreCard, TrainingDataQuality};

/// Any safety-critical score below this flags the response for supervisor review.
pub const REVIEW_THRESHOLD: f64 = 5.5;
/// Mean score required for `high` training quality.
pub const HIGH_QUALITY_MEAN: f64 = 7.0;
/// Mean score required for `medium` training quality.
pub const MEDIUM_QUALITY_MEAN: f64 = 5.5;
/// The requester's message must be longer than this (in characters) for `high`.
pub const MIN_MESSAGE_CHARS_FOR_HIGH: usize = 20;

/// Conversation facts that bear on training usefulness.
#[derive(Debug, Clone, Copy)]
pub struct QualityContext {
    pub has_prior_history: bool,
    pub original_message_chars: usize,
}

impl QualityContext {
    pub fn new(prior_turns: usize, original_message: &str) -> Self {
        Self {
            has_prior_history: prior_turns > 0,
            original_message_chars: original_message.chars().count(),
        }
    }
}

pub fn flag_for_review(scores: &ScoreCard) -> bool {
    [
        scores.cultural_sensitivity,
        scores.empathy,
        scores.professionalism,
    ]
    .iter()
    .any(|&s| s < REVIEW_THRESHOLD)
}

pub fn training_data_quality(scores: &ScoreCard, ctx: &QualityContext) -> TrainingDataQuality {
    let mean = scores.mean();
    if mean >= HIGH_QUALITY_MEAN
        && ctx.has_prior_history
        && ctx.original_message_chars > MIN_MESSAGE_CHARS_FOR_HIGH
    {
        TrainingDataQuality::High
    } else if mean >= MEDIUM_QUALITY_MEAN {
        TrainingDataQuality::Medium
    } else {
        TrainingDataQuality::Low
    }
}
