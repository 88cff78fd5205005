//! Model-backed classifier.
//!
//! Asks a classifier model (default `gpt-4o-mini`) for a strict JSON verdict
//! and validates it into a [`Classification`]. Any failure, transport or
//! parse, degrades to a `general` classification with confidence `0.0` whose
//! score comes from the rule-based classifier for the same prompt.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{
    Classification, ClassifierMode, PromptClassifier, RuleBasedClassifier, TaskType, MAX_SCORE,
    MIN_SCORE,
};
use crate::routing::ModelDescriptor;
use crate::worker::{GenerationRequest, ModelWorker};

const CLASSIFIER_MAX_TOKENS: u32 = 300;
const CLASSIFIER_TEMPERATURE: f32 = 0.3;
const DEFAULT_SCORE: i64 = 5;
const DEFAULT_CONFIDENCE: f64 = 0.8;
const EMPTY_REASONING: &str = "LLM classification (no reasoning provided)";

/// System instruction sent with every classification request.
pub const SYSTEM_PROMPT: &str = r#"You are a prompt complexity classifier for an AI gateway.

Given a user prompt, analyze it and return a JSON object with exactly these fields:

{
  "complexity_score": <integer 1-10>,
  "task_type": "<one of: code, math, creative, analysis, translation, reasoning, simple_qa, general>",
  "reasoning": "<1-2 sentence explanation of why you assigned this score and type>",
  "confidence": <float 0.0-1.0>
}

Scoring guidelines:
- 1-3: Simple factual questions, definitions, basic translations, yes/no questions
- 4-6: Moderate tasks like standard code generation, creative writing, straightforward analysis
- 7-10: Complex multi-step reasoning, advanced math, system design, nuanced long-form analysis

Task type definitions:
- simple_qa: Factual questions, definitions, lookups
- translation: Language translation requests
- code: Programming, debugging, code generation
- analysis: Comparing, evaluating, critiquing, reviewing
- creative: Poetry, stories, essays, artistic writing
- math: Calculations, proofs, equations, statistics
- reasoning: Logic, philosophy, thought experiments, complex explanations
- general: Anything that doesn't fit the above categories

IMPORTANT: Return ONLY the raw JSON object, no markdown fences, no extra text."#;

/// Classifier that delegates to a backend model.
///
/// # Panics
///
/// This type and its methods never panic.
pub struct LlmClassifier {
    worker: Arc<dyn ModelWorker>,
    model: ModelDescriptor,
    fallback: RuleBasedClassifier,
}

impl std::fmt::Debug for LlmClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClassifier")
            .field("model", &self.model.name)
            .finish_non_exhaustive()
    }
}

impl LlmClassifier {
    /// Create a classifier that calls `model` through `worker`.
    pub fn new(worker: Arc<dyn ModelWorker>, model: ModelDescriptor) -> Self {
        Self {
            worker,
            model,
            fallback: RuleBasedClassifier::new(),
        }
    }

    /// Name of the classifier model.
    pub fn model_name(&self) -> &str {
        &self.model.name
    }

    fn degraded(&self, prompt: &str, failure: String) -> Classification {
        let score = i64::from(self.fallback.evaluate(prompt).score());
        Classification::new(
            score,
            TaskType::General,
            vec![
                failure,
                format!("fell back to general with rule-based score {score}"),
            ],
            0.0,
            ClassifierMode::LlmBased,
        )
    }
}

#[async_trait]
impl PromptClassifier for LlmClassifier {
    fn mode(&self) -> ClassifierMode {
        ClassifierMode::LlmBased
    }

    async fn classify(&self, prompt: &str) -> Classification {
        let request = GenerationRequest::new(format!("Classify this prompt:\n\n{prompt}"))
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(CLASSIFIER_MAX_TOKENS)
            .with_temperature(CLASSIFIER_TEMPERATURE);

        let raw = match self.worker.generate(&request, &self.model).await {
            Ok(generation) => generation.text,
            Err(e) => {
                tracing::warn!(model = %self.model.name, error = %e, "classifier model call failed");
                return self.degraded(prompt, format!("classifier model call failed: {e}"));
            }
        };

        match parse_llm_response(&raw) {
            Ok(classification) => classification,
            Err(reason) => {
                tracing::warn!(model = %self.model.name, %reason, "unusable classifier response");
                self.degraded(prompt, format!("unusable classifier response: {reason}"))
            }
        }
    }
}

/// Remove a surrounding markdown code fence (with or without a language tag).
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => trimmed.trim_start_matches('`'),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse and validate a classifier reply.
///
/// Missing fields take defaults (score 5, type `general`, confidence 0.8);
/// out-of-range values are clamped; unknown task types become `general`.
///
/// # Errors
///
/// Returns a short reason when the text is not a JSON object, or when
/// `complexity_score` or `confidence` is present but neither a number nor
/// a numeric string (`null` included).
pub fn parse_llm_response(raw: &str) -> Result<Classification, String> {
    let cleaned = strip_fences(raw);
    let value: Value = serde_json::from_str(cleaned).map_err(|e| format!("invalid JSON: {e}"))?;
    let object = value
        .as_object()
        .ok_or_else(|| "expected a JSON object".to_string())?;

    let score = match object.get("complexity_score") {
        None => DEFAULT_SCORE,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => i,
            None => n.as_f64().map_or(DEFAULT_SCORE, |f| f.trunc() as i64),
        },
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("complexity_score is not an integer: {s:?}"))?,
        Some(other) => return Err(format!("complexity_score has the wrong type: {other}")),
    }
    .clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE));

    let task_type = object
        .get("task_type")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<TaskType>().ok())
        .unwrap_or(TaskType::General);

    let confidence = match object.get("confidence") {
        None => DEFAULT_CONFIDENCE,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(DEFAULT_CONFIDENCE),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| format!("confidence is not a number: {s:?}"))?,
        Some(other) => return Err(format!("confidence has the wrong type: {other}")),
    };
    let confidence = (confidence.clamp(0.0, 1.0) * 100.0).round() / 100.0;

    let reasoning = match object.get("reasoning") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Array(items)) => {
            let joined: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if joined.is_empty() {
                EMPTY_REASONING.to_string()
            } else {
                joined.join(" ")
            }
        }
        _ => EMPTY_REASONING.to_string(),
    };

    Ok(Classification::new(
        score,
        task_type,
        vec![reasoning],
        confidence,
        ClassifierMode::LlmBased,
    ))
}
