//! Feedback attached to a human response after analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest and highest admissible score.
pub const SCORE_MIN: f64 = 1.0;
pub const SCORE_MAX: f64 = 10.0;
/// Substituted for any missing, non-numeric or out-of-range score.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Eight category scores plus overall, each in [1, 10].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    pub cultural_sensitivity: f64,
    pub empathy: f64,
    pub professionalism: f64,
    pub active_listening: f64,
    pub cultural_humility: f64,
    pub therapeutic_rapport: f64,
    pub clarity: f64,
    pub actionability: f64,
    pub overall: f64,
}

/// Wire names of the score fields, in [`ScoreCard::values`] order.
pub const SCORE_FIELDS: [&str; 9] = [
    "culturalSensitivity",
    "empathy",
    "professionalism",
    "activeListening",
    "culturalHumility",
    "therapeuticRapport",
    "clarity",
    "actionability",
    "overall",
];

impl ScoreCard {
    pub fn from_values(v: [f64; 9]) -> Self {
        Self {
            cultural_sensitivity: v[0],
            empathy: v[1],
            professionalism: v[2],
            active_listening: v[3],
            cultural_humility: v[4],
            therapeutic_rapport: v[5],
            clarity: v[6],
            actionability: v[7],
            overall: v[8],
        }
    }

    pub fn values(&self) -> [f64; 9] {
        [
            self.cultural_sensitivity,
            self.empathy,
            self.professionalism,
            self.active_listening,
            self.cultural_humility,
            self.therapeutic_rapport,
            self.clarity,
            self.actionability,
            self.overall,
        ]
    }

    pub fn mean(&self) -> f64 {
        let v = self.values();
        v.iter().sum::<f64>() / v.len() as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalAnalysis {
    pub assumptions: Vec<String>,
    pub biases: Vec<String>,
    pub strengths: Vec<String>,
    pub cultural_misses: Vec<String>,
    pub appropriate_references: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub cultural_tips: Vec<String>,
    pub alternative_approaches: Vec<String>,
    pub questions_to_ask: Vec<String>,
}

/// Output of the parser: every field present and in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedFeedback {
    pub scores: ScoreCard,
    pub cultural_analysis: CulturalAnalysis,
    pub suggestions: Suggestions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingDataQuality {
    High,
    Medium,
    Low,
}

impl fmt::Display for TrainingDataQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrainingDataQuality::High => "high",
            TrainingDataQuality::Medium => "medium",
            TrainingDataQuality::Low => "low",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIFeedback {
    pub scores: ScoreCard,
    pub cultural_analysis: CulturalAnalysis,
    pub suggestions: Suggestions,
    pub flagged_for_review: bool,
    pub training_data_quality: TrainingDataQuality,
    /// False when the model output could not be parsed and the fallback was used.
    pub analysis_succeeded: bool,
    pub analyzed_at: DateTime<Utc>,
    pub model_id: String,
    pub analysis_version: String,
}
