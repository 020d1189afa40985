//! Analysis prompt assembly. Pure and deterministic: identical context in, identical prompt out.

use crate::domain::culture::CulturalBackground;
use crate::domain::entities::Priority;
use serde::{Deserialize, Serialize};

/// Most recent prior turns included in the excerpt.
pub const MAX_HISTORY_TURNS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Requester,
    Responder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

/// Everything the prompt is built from.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub requester_message: String,
    pub responder_content: String,
    /// Oldest first. Only the last [`MAX_HISTORY_TURNS`] are used.
    pub history: Vec<ConversationTurn>,
    pub cultural_background: CulturalBackground,
    pub urgency: Option<Priority>,
}

impl AnalysisContext {
    pub fn recent_history(&self) -> &[ConversationTurn] {
        let skip = self.history.len().saturating_sub(MAX_HISTORY_TURNS);
        &self.history[skip..]
    }
}

/// System + user message pair sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub system: String,
    pub user: String,
}

const SYSTEM_PROMPT: &str = r#"You are a clinical supervisor reviewing a peer counselor's written reply to a person seeking emotional support. Evaluate the reply for cultural competency and therapeutic quality.

## Scoring Rubric
Score each category from 1 to 10 (decimals allowed):
- culturalSensitivity: acknowledges the requester's cultural context without stereotyping
- empathy: reflects and validates the requester's feelings
- professionalism: respectful, safe, within a peer counselor's scope
- activeListening: responds to what was actually said
- culturalHumility: curious rather than assuming; invites the requester's own perspective
- therapeuticRapport: builds trust and collaboration
- clarity: easy to understand, free of jargon
- actionability: offers concrete, realistic next steps
- overall: holistic judgement of the reply

1-3 = harmful or dismissive, 4-5 = weak, 6-7 = adequate, 8-9 = strong, 10 = exemplary.

## Output Format
You MUST respond with valid JSON only. No markdown, no explanations outside JSON.
All nine score fields are numbers between 1 and 10. All list fields are arrays of strings (use [] when empty).

```json
{
  "culturalSensitivity": 7.5,
  "empathy": 8,
  "professionalism": 8,
  "activeListening": 7,
  "culturalHumility": 6.5,
  "therapeuticRapport": 7,
  "clarity": 8,
  "actionability": 6,
  "overall": 7.3,
  "culturalAnalysis": {
    "assumptions": [],
    "biases": [],
    "strengths": [],
    "culturalMisses": [],
    "appropriateReferences": []
  },
  "suggestions": {
    "strengths": [],
    "improvements": [],
    "culturalTips": [],
    "alternativeApproaches": [],
    "questionsToAsk": []
  }
}
```"#;

/// Build the analysis prompt for one response.
pub fn build_prompt(ctx: &AnalysisContext) -> AnalysisPrompt {
    AnalysisPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user: user_prompt(ctx),
    }
}

fn user_prompt(ctx: &AnalysisContext) -> String {
    let bg = ctx.cultural_background;
    let reference = bg.reference();
    let mut p = String::new();

    p.push_str(&format!(
        "## Cultural Background: {} ({})\n",
        reference.label,
        bg.as_str()
    ));
    push_list(&mut p, "Common factors", reference.common_factors);
    push_list(&mut p, "Sensitivities", reference.sensitivities);
    push_list(&mut p, "Strengths", reference.strengths);

    if let Some(urgency) = ctx.urgency {
        p.push_str(&format!("\nUrgency: {}\n", urgency));
    }

    let recent = ctx.recent_history();
    if !recent.is_empty() {
        p.push_str("\n## Prior Conversation (oldest first)\n");
        for turn in recent {
            let who = match turn.speaker {
                Speaker::Requester => "Requester",
                Speaker::Responder => "Counselor",
            };
            p.push_str(&format!("{}: {}\n", who, turn.text));
        }
    }

    p.push_str("\n## Requester Message\n");
    p.push_str(&ctx.requester_message);
    p.push_str("\n\n## Counselor Response\n");
    p.push_str(&ctx.responder_content);
    p.push_str("\n\nEvaluate the counselor response using the rubric and return the JSON object.");
    p
}

fn push_list(p: &mut String, title: &str, entries: &[&str]) {
    p.push_str(&format!("{}:\n", title));
    for e in entries {
        p.push_str(&format!("- {}\n", e));
    }
}
