//! Mock AI adapter for running without API calls.
//!
//! Returns a canned, well-formed analysis for development and testing purposes.

use crate::domain::{AnalysisPrompt, DomainError};
use crate::ports::LanguageModelPort;
use std::time::Duration;
use tracing::info;

const MOCK_ANALYSIS: &str = r#"{
  "culturalSensitivity": 7.5,
  "empathy": 8,
  "professionalism": 8.5,
  "activeListening": 7,
  "culturalHumility": 7,
  "therapeuticRapport": 7.5,
  "clarity": 8,
  "actionability": 6.5,
  "overall": 7.5,
  "culturalAnalysis": {
    "assumptions": ["[MOCK] No strong assumptions detected"],
    "biases": [],
    "strengths": ["[MOCK] Collaborative, non-directive tone"],
    "culturalMisses": [],
    "appropriateReferences": []
  },
  "suggestions": {
    "strengths": ["[MOCK] Validates the requester's feelings"],
    "improvements": ["[MOCK] Ask how family or community shape the concern"],
    "culturalTips": ["[MOCK] Invite the requester to describe their own cultural values"],
    "alternativeApproaches": [],
    "questionsToAsk": ["[MOCK] What would a good outcome look like for you?"]
  }
}"#;

/// Mock AI adapter.
///
/// Returns predetermined output without making API calls.
/// Simulates network latency with configurable delay.
pub struct MockAiAdapter {
    /// Simulated network delay in milliseconds.
    delay_ms: u64,
}

impl MockAiAdapter {
    /// Create a new mock adapter with default delay (100ms).
    pub fn new() -> Self {
        Self { delay_ms: 100 }
    }

    /// Create a mock adapter with custom delay.
    pub fn with_delay(delay_ms: u64) -> Self {
        Self { delay_ms }
    }
}

impl Default for MockAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LanguageModelPort for MockAiAdapter {
    fn model_id(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &AnalysisPrompt) -> Result<String, DomainError> {
        info!(
            prompt_len = prompt.user.len(),
            "[MOCK] Simulating AI analysis"
        );

        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        Ok(format!("Here is the analysis:\n```json\n{}\n```", MOCK_ANALYSIS))
    }
}
