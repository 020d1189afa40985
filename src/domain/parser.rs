//! Total parser for model output. Never fails: every call yields a usable
//! [`ValidatedFeedback`] plus a flag telling whether real model output was used.
//!
//! The provider is free to wrap JSON in prose or markdown fences, so the parser
//! tries every `{` as a starting point and takes the largest object that deserializes.
//! Each field is then repaired independently.

use crate::domain::feedback::{
    CulturalAnalysis, NEUTRAL_SCORE, SCORE_FIELDS, SCORE_MAX, SCORE_MIN, ScoreCard, Suggestions,
    ValidatedFeedback,
};
use serde_json::{Map, Value};

/// Note placed in the fallback so a reviewer knows the scores are placeholders.
pub const MANUAL_REVIEW_NOTE: &str =
    "Automated analysis unavailable: this response needs manual review by a supervisor.";

/// Parse raw model text. Returns `(feedback, true)` when a JSON object was found.
pub fn parse_feedback(raw_text: &str) -> (ValidatedFeedback, bool) {
    match largest_json_object(raw_text) {
        Some(obj) => (validate(&obj), true),
        None => (fallback_analysis(), false),
    }
}

/// Neutral record used when there is nothing to parse. Professionalism sits higher:
/// a response existed, it just could not be analyzed.
pub fn fallback_analysis() -> ValidatedFeedback {
    ValidatedFeedback {
        scores: ScoreCard {
            cultural_sensitivity: 5.0,
            empathy: 6.0,
            professionalism: 7.0,
            active_listening: 6.0,
            cultural_humility: 5.0,
            therapeutic_rapport: 5.5,
            clarity: 6.0,
            actionability: 5.0,
            overall: 5.5,
        },
        cultural_analysis: CulturalAnalysis::default(),
        suggestions: Suggestions {
            improvements: vec![MANUAL_REVIEW_NOTE.to_string()],
            ..Suggestions::default()
        },
    }
}

/// Tries a parse at every `{` and keeps the largest object. The stream deserializer
/// stops after the first value, so trailing prose and stray braces earlier in the
/// text do not hide a later object.
fn largest_json_object(text: &str) -> Option<Map<String, Value>> {
    let mut best: Option<(usize, Map<String, Value>)> = None;
    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        let Some(Ok(Value::Object(map))) = stream.next() else {
            continue;
        };
        let len = stream.byte_offset();
        if best.as_ref().map_or(true, |(best_len, _)| len > *best_len) {
            best = Some((len, map));
        }
    }
    best.map(|(_, map)| map)
}

fn validate(obj: &Map<String, Value>) -> ValidatedFeedback {
    let nested_scores = obj.get("scores").and_then(Value::as_object);
    let mut values = [NEUTRAL_SCORE; 9];
    for (slot, key) in values.iter_mut().zip(SCORE_FIELDS) {
        let raw = lookup(obj, key).or_else(|| nested_scores.and_then(|s| lookup(s, key)));
        *slot = repair_score(raw);
    }

    let analysis = lookup(obj, "culturalAnalysis").and_then(Value::as_object);
    let suggestions = lookup(obj, "suggestions").and_then(Value::as_object);
    let list = |section: Option<&Map<String, Value>>, key: &str| {
        section.map(|s| string_list(lookup(s, key))).unwrap_or_default()
    };

    ValidatedFeedback {
        scores: ScoreCard::from_values(values),
        cultural_analysis: CulturalAnalysis {
            assumptions: list(analysis, "assumptions"),
            biases: list(analysis, "biases"),
            strengths: list(analysis, "strengths"),
            cultural_misses: list(analysis, "culturalMisses"),
            appropriate_references: list(analysis, "appropriateReferences"),
        },
        suggestions: Suggestions {
            strengths: list(suggestions, "strengths"),
            improvements: list(suggestions, "improvements"),
            cultural_tips: list(suggestions, "culturalTips"),
            alternative_approaches: list(suggestions, "alternativeApproaches"),
            questions_to_ask: list(suggestions, "questionsToAsk"),
        },
    }
}

/// camelCase key first, then its snake_case spelling.
fn lookup<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).or_else(|| obj.get(&to_snake_case(key)))
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn repair_score(raw: Option<&Value>) -> f64 {
    let n = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(x) if x.is_finite() && (SCORE_MIN..=SCORE_MAX).contains(&x) => round_one_decimal(x),
        _ => NEUTRAL_SCORE,
    }
}

fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn string_list(raw: Option<&Value>) -> Vec<String> {
    match raw {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
