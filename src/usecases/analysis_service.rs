//! Analysis service. Orchestrates cultural-competency analysis of one response.
//!
//! Coordinates between repository (history), prompt builder, AI adapter, parser
//! and classifier. Produces feedback even when the provider fails.

use crate::domain::parser::{fallback_analysis, parse_feedback};
use crate::domain::prompt::build_prompt;
use crate::domain::quality::{QualityContext, flag_for_review, training_data_quality};
use crate::domain::{
    AIFeedback, AnalysisContext, ConversationTurn, CulturalBackground, DomainError, Priority,
    QueueItem, Response, Speaker, ValidatedFeedback,
};
use crate::ports::{Clock, LanguageModelPort, QueueStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Recorded on every feedback record; bump when rubric or schema changes.
pub const ANALYSIS_VERSION: &str = "cultural-competency-v1";

/// Upper bound on a single provider call.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Service for AI-powered response analysis.
///
/// Orchestrates the flow:
/// 1. Gather the requester's earlier conversation from the store
/// 2. Build the prompt for the requester's cultural background
/// 3. Call the model under a timeout
/// 4. Parse, classify and attach the feedback
pub struct AnalysisService {
    llm: Arc<dyn LanguageModelPort>,
    store: Arc<dyn QueueStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl AnalysisService {
    pub fn new(
        llm: Arc<dyn LanguageModelPort>,
        store: Arc<dyn QueueStore>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            llm,
            store,
            clock,
            timeout,
        }
    }

    /// Analyze and attach. The only error is a failed attach; callers log it and move on.
    pub async fn analyze_and_attach(
        &self,
        item: &QueueItem,
        response: &Response,
    ) -> Result<AIFeedback, DomainError> {
        let feedback = self.analyze(item, response).await;
        self.store.attach_feedback(&response.id, &feedback).await?;
        info!(
            response_id = %response.id,
            overall = feedback.scores.overall,
            flagged = feedback.flagged_for_review,
            quality = %feedback.training_data_quality,
            succeeded = feedback.analysis_succeeded,
            "feedback attached"
        );
        Ok(feedback)
    }

    /// Produce feedback for a response. Never fails: provider errors and timeouts
    /// become the fallback analysis.
    pub async fn analyze(&self, item: &QueueItem, response: &Response) -> AIFeedback {
        let history = self.history_for(item).await;
        let ctx = AnalysisContext {
            requester_message: item.content.clone(),
            responder_content: response.content.clone(),
            history,
            cultural_background: CulturalBackground::from_context(&item.cultural_context),
            urgency: match item.priority {
                Priority::High | Priority::Urgent => Some(item.priority),
                Priority::Low | Priority::Medium => None,
            },
        };
        let prompt = build_prompt(&ctx);

        let (validated, succeeded) =
            match tokio::time::timeout(self.timeout, self.llm.complete(&prompt)).await {
                Ok(Ok(raw)) => parse_feedback(&raw),
                Ok(Err(e)) => {
                    warn!(
                        response_id = %response.id,
                        error = %e,
                        "AI provider failed; using fallback analysis"
                    );
                    (fallback_analysis(), false)
                }
                Err(_) => {
                    warn!(
                        response_id = %response.id,
                        timeout_secs = self.timeout.as_secs_f64(),
                        "AI provider timed out; using fallback analysis"
                    );
                    (fallback_analysis(), false)
                }
            };
        if !succeeded {
            warn!(response_id = %response.id, "analysis fell back to neutral scores");
        }

        self.finish(
            validated,
            succeeded,
            QualityContext::new(ctx.history.len(), &ctx.requester_message),
        )
    }

    fn finish(
        &self,
        validated: ValidatedFeedback,
        succeeded: bool,
        quality_ctx: QualityContext,
    ) -> AIFeedback {
        AIFeedback {
            flagged_for_review: flag_for_review(&validated.scores),
            training_data_quality: training_data_quality(&validated.scores, &quality_ctx),
            scores: validated.scores,
            cultural_analysis: validated.cultural_analysis,
            suggestions: validated.suggestions,
            analysis_succeeded: succeeded,
            analyzed_at: self.clock.now(),
            model_id: self.llm.model_id().to_string(),
            analysis_version: ANALYSIS_VERSION.to_string(),
        }
    }

    /// Earlier items of the same requester, as alternating turns, oldest first.
    async fn history_for(&self, item: &QueueItem) -> Vec<ConversationTurn> {
        let earlier = match self.store.list_for_requester(&item.requester_id).await {
            Ok(items) => items,
            Err(e) => {
                warn!(
                    item_id = %item.id,
                    error = %e,
                    "history lookup failed; analyzing without history"
                );
                return Vec::new();
            }
        };
        let mut turns = Vec::new();
        for prior in earlier
            .iter()
            .filter(|p| p.id != item.id && p.fifo_cmp(item).is_lt())
        {
            turns.push(ConversationTurn {
                speaker: Speaker::Requester,
                text: prior.content.clone(),
            });
            turns.extend(prior.responses.iter().map(|r| ConversationTurn {
                speaker: Speaker::Responder,
                text: r.content.clone(),
            }));
        }
        turns
    }
}
