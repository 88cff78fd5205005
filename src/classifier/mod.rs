//! # Stage: Prompt Classification
//!
//! ## Responsibility
//! Turn raw prompt text into a [`Classification`]: a complexity score on a
//! 1–10 scale, a [`TaskType`] label, and an ordered reasoning trace.
//!
//! Two interchangeable implementations share the [`PromptClassifier`] trait:
//! - [`RuleBasedClassifier`]: deterministic keyword/regex heuristics.
//! - [`LlmClassifier`]: asks a backend model for the same structure and
//!   validates the answer.
//!
//! ## Guarantees
//! - Total: classification never fails. Malformed input or malformed
//!   backend output still yields a valid [`Classification`].
//! - Bounded: `score` is clamped to `[1, 10]` and `confidence` to `[0, 1]`
//!   at construction.
//! - Deterministic (rule-based): the same text always produces a
//!   byte-identical classification.
//!
//! ## NOT Responsible For
//! - Choosing a model (that belongs to `routing`)
//! - Caching (that belongs to `cache`)

pub mod llm_based;
pub mod rule_based;
pub mod rules;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use llm_based::LlmClassifier;
pub use rule_based::RuleBasedClassifier;

/// Lowest complexity score a classification can carry.
pub const MIN_SCORE: u8 = 1;
/// Highest complexity score a classification can carry.
pub const MAX_SCORE: u8 = 10;

/// Closed set of prompt task categories.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Programming, debugging, code generation.
    Code,
    /// Calculations, proofs, equations, statistics.
    Math,
    /// Poetry, stories, essays, artistic writing.
    Creative,
    /// Comparing, evaluating, critiquing, reviewing.
    Analysis,
    /// Language translation requests.
    Translation,
    /// Logic, philosophy, thought experiments.
    Reasoning,
    /// Factual questions, definitions, lookups.
    SimpleQa,
    /// Anything without a strong signal for the other categories.
    General,
}

impl TaskType {
    /// Every task type, in declaration order.
    pub const ALL: [TaskType; 8] = [
        TaskType::Code,
        TaskType::Math,
        TaskType::Creative,
        TaskType::Analysis,
        TaskType::Translation,
        TaskType::Reasoning,
        TaskType::SimpleQa,
        TaskType::General,
    ];

    /// Wire name of the task type (`"simple_qa"`, `"code"`, …).
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Code => "code",
            TaskType::Math => "math",
            TaskType::Creative => "creative",
            TaskType::Analysis => "analysis",
            TaskType::Translation => "translation",
            TaskType::Reasoning => "reasoning",
            TaskType::SimpleQa => "simple_qa",
            TaskType::General => "general",
        }
    }

    /// Fixed starting score assigned before length and keyword adjustments.
    pub fn base_score(&self) -> i32 {
        match self {
            TaskType::SimpleQa => 2,
            TaskType::Translation | TaskType::General => 3,
            TaskType::Creative | TaskType::Code | TaskType::Analysis => 5,
            TaskType::Math => 6,
            TaskType::Reasoning => 7,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TaskType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown task type '{s}'"))
    }
}

/// Which classification strategy produced (or should produce) a result.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierMode {
    /// Deterministic keyword heuristics.
    #[default]
    RuleBased,
    /// Classification delegated to a backend model.
    LlmBased,
}

impl ClassifierMode {
    /// Wire name of the mode (`"rule_based"` / `"llm_based"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierMode::RuleBased => "rule_based",
            ClassifierMode::LlmBased => "llm_based",
        }
    }
}

impl fmt::Display for ClassifierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassifierMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rule_based" => Ok(ClassifierMode::RuleBased),
            "llm_based" => Ok(ClassifierMode::LlmBased),
            other => Err(format!(
                "unknown classifier mode '{other}' (expected 'rule_based' or 'llm_based')"
            )),
        }
    }
}

/// Output of either classifier. Immutable once built.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    score: u8,
    task_type: TaskType,
    reasoning: Vec<String>,
    confidence: f64,
    classifier_mode: ClassifierMode,
}

impl Classification {
    /// Build a classification, clamping `score` into `[1, 10]` and
    /// `confidence` into `[0.0, 1.0]`. A NaN confidence becomes `0.0`.
    pub fn new(
        score: i64,
        task_type: TaskType,
        reasoning: Vec<String>,
        confidence: f64,
        classifier_mode: ClassifierMode,
    ) -> Self {
        Self {
            score: clamp_score(score),
            task_type,
            reasoning,
            confidence: clamp_confidence(confidence),
            classifier_mode,
        }
    }

    /// Complexity score in `[1, 10]`.
    pub fn score(&self) -> u8 {
        self.score
    }

    /// Detected task type.
    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    /// Ordered reasoning trace.
    pub fn reasoning(&self) -> &[String] {
        &self.reasoning
    }

    /// Classifier confidence in `[0.0, 1.0]`.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Strategy that produced this classification.
    pub fn classifier_mode(&self) -> ClassifierMode {
        self.classifier_mode
    }
}

/// The single capability both classifier variants provide.
///
/// Implementations must be total: any failure is absorbed and expressed as
/// a low-confidence classification instead of an error.
#[async_trait]
pub trait PromptClassifier: Send + Sync {
    /// The mode tag stamped on every classification this classifier emits.
    fn mode(&self) -> ClassifierMode;

    /// Classify a prompt.
    async fn classify(&self, prompt: &str) -> Classification;
}

/// Clamp a raw integer score into `[MIN_SCORE, MAX_SCORE]`.
pub(crate) fn clamp_score(raw: i64) -> u8 {
    raw.clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE)) as u8
}

fn clamp_confidence(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}
