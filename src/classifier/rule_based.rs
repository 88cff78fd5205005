//! Deterministic keyword classifier.
//!
//! Scores a prompt on the 1–10 complexity scale and labels its task type
//! from the static tables in [`super::rules`]:
//!
//! 1. **Token estimate**: `max(floor((words * 0.75 + chars / 4) / 2), 1)`
//! 2. **Task type**: bank with the most matching signals, ties broken by
//!    bank priority, no signal at all → `general`
//! 3. **Base score** from the task type
//! 4. **Length**: `+1` above 80 estimated tokens, a further `+2` above 200
//! 5. **Boosters**, then **reducers**, each applied at most once
//! 6. **Clamp** into `[1, 10]`
//!
//! Every applied step lands in the reasoning trace in that order.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use super::rules::{
    Adjustment, PatternBank, Trigger, BOOSTERS, LONG_PROMPT_TOKENS, PATTERN_BANKS, REDUCERS,
    VERY_LONG_PROMPT_TOKENS,
};
use super::{clamp_score, Classification, ClassifierMode, PromptClassifier, TaskType};

/// Rule-based prompt classifier.
///
/// Stateless and cheap to construct; the regex tables are compiled once per
/// process and shared by every instance.
///
/// # Panics
///
/// This type and its methods never panic.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    /// Create a new classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify a prompt synchronously.
    ///
    /// Total over all inputs: empty or whitespace-only text yields
    /// `general` at its base score of 3, the top of the LOW tier.
    ///
    /// # Example
    ///
    /// ```rust
    /// use prompt_gateway::classifier::{RuleBasedClassifier, TaskType};
    /// let c = RuleBasedClassifier::new().evaluate("What is 2+2?");
    /// assert_eq!(c.task_type(), TaskType::SimpleQa);
    /// assert!(c.score() <= 2);
    /// ```
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn evaluate(&self, prompt: &str) -> Classification {
        let rules = compiled_rules();
        let text = prompt.trim();
        let mut reasoning = Vec::new();

        let tokens = estimate_tokens(text);
        let (task_type, hits) = rules.detect_task_type(text, &mut reasoning);
        if hits == 0 {
            reasoning.push("no strong task-type signal; defaulting to general".to_string());
        }

        let mut score = task_type.base_score();
        reasoning.push(format!("base score {score} for task type '{task_type}'"));

        score += length_adjustment(tokens, &mut reasoning);

        for adjustment in rules.boosters.iter().chain(&rules.reducers) {
            if adjustment.fires(text) {
                score += adjustment.delta;
                reasoning.push(format!("{:+}: {}", adjustment.delta, adjustment.reason));
            }
        }

        let raw = i64::from(score);
        let clamped = clamp_score(raw);
        if i64::from(clamped) != raw {
            reasoning.push(format!("clamped from {raw} to {clamped}"));
        }

        Classification::new(
            i64::from(clamped),
            task_type,
            reasoning,
            1.0,
            ClassifierMode::RuleBased,
        )
    }
}

#[async_trait]
impl PromptClassifier for RuleBasedClassifier {
    fn mode(&self) -> ClassifierMode {
        ClassifierMode::RuleBased
    }

    async fn classify(&self, prompt: &str) -> Classification {
        self.evaluate(prompt)
    }
}

/// Rough token estimate blending a word-based and a character-based guess.
///
/// Never returns less than 1, even for empty text.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count() as f64;
    let chars = text.chars().count() as f64;
    let estimate = ((words * 0.75 + chars / 4.0) / 2.0).floor() as usize;
    estimate.max(1)
}

fn length_adjustment(tokens: usize, reasoning: &mut Vec<String>) -> i32 {
    let mut delta = 0;
    if tokens > LONG_PROMPT_TOKENS {
        delta += 1;
        reasoning.push(format!(
            "+1: long prompt (~{tokens} tokens > {LONG_PROMPT_TOKENS})"
        ));
    }
    if tokens > VERY_LONG_PROMPT_TOKENS {
        delta += 2;
        reasoning.push(format!(
            "+2: very long prompt (~{tokens} tokens > {VERY_LONG_PROMPT_TOKENS})"
        ));
    }
    if delta == 0 {
        reasoning.push(format!("short prompt (~{tokens} tokens), no length adjustment"));
    }
    delta
}

// -- compiled tables ---------------------------------------------------------

struct CompiledBank {
    task_type: TaskType,
    priority: u8,
    reason: &'static str,
    patterns: Vec<Regex>,
}

enum Matcher {
    Pattern(Regex),
    ShorterThan(usize),
}

struct CompiledAdjustment {
    matcher: Matcher,
    delta: i32,
    reason: &'static str,
}

impl CompiledAdjustment {
    fn fires(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Pattern(re) => re.is_match(text),
            Matcher::ShorterThan(limit) => (1..*limit).contains(&text.chars().count()),
        }
    }
}

struct CompiledRules {
    banks: Vec<CompiledBank>,
    boosters: Vec<CompiledAdjustment>,
    reducers: Vec<CompiledAdjustment>,
}

impl CompiledRules {
    fn build() -> Self {
        let mut banks: Vec<CompiledBank> = PATTERN_BANKS.iter().map(compile_bank).collect();
        banks.sort_by_key(|b| b.priority);
        Self {
            banks,
            boosters: BOOSTERS.iter().filter_map(compile_adjustment).collect(),
            reducers: REDUCERS.iter().filter_map(compile_adjustment).collect(),
        }
    }

    /// Winning task type and its hit count. Strictly-greater comparison over
    /// banks sorted by priority keeps the earlier bank on ties.
    fn detect_task_type(&self, text: &str, reasoning: &mut Vec<String>) -> (TaskType, usize) {
        let mut best: Option<(&CompiledBank, usize)> = None;
        for bank in &self.banks {
            let hits = bank.patterns.iter().filter(|re| re.is_match(text)).count();
            if hits == 0 {
                continue;
            }
            match best {
                Some((_, best_hits)) if hits <= best_hits => {}
                _ => best = Some((bank, hits)),
            }
        }

        match best {
            Some((bank, hits)) => {
                let plural = if hits == 1 { "" } else { "s" };
                reasoning.push(format!("{} ({hits} signal{plural})", bank.reason));
                (bank.task_type, hits)
            }
            None => (TaskType::General, 0),
        }
    }
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!(pattern, error = %e, "classifier pattern failed to compile; skipping");
            None
        }
    }
}

fn compile_bank(bank: &PatternBank) -> CompiledBank {
    CompiledBank {
        task_type: bank.task_type,
        priority: bank.priority,
        reason: bank.reason,
        patterns: bank
            .patterns
            .iter()
            .filter_map(|p| compile_pattern(p))
            .collect(),
    }
}

fn compile_adjustment(adjustment: &Adjustment) -> Option<CompiledAdjustment> {
    let matcher = match adjustment.trigger {
        Trigger::Pattern(p) => Matcher::Pattern(compile_pattern(p)?),
        Trigger::ShorterThan(limit) => Matcher::ShorterThan(limit),
    };
    Some(CompiledAdjustment {
        matcher,
        delta: adjustment.delta,
        reason: adjustment.reason,
    })
}

fn compiled_rules() -> &'static CompiledRules {
    static RULES: OnceLock<CompiledRules> = OnceLock::new();
    RULES.get_or_init(CompiledRules::build)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(prompt: &str) -> Classification {
        RuleBasedClassifier::new().evaluate(prompt)
    }

    #[test]
    fn test_all_rules_compiled() {
        let rules = compiled_rules();
        let compiled: usize = rules.banks.iter().map(|b| b.patterns.len()).sum();
        let declared: usize = PATTERN_BANKS.iter().map(|b| b.patterns.len()).sum();
        assert_eq!(compiled, declared);
        assert_eq!(rules.boosters.len(), BOOSTERS.len());
        assert_eq!(rules.reducers.len(), REDUCERS.len());
    }

    #[test]
    fn test_estimate_tokens_floor_is_one() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("hi"), 1);
    }

    #[test]
    fn test_estimate_tokens_blends_words_and_chars() {
        // 4 words, 18 chars: (3.0 + 4.5) / 2 = 3.75 → 3
        assert_eq!(estimate_tokens("one two three four"), 3);
    }

    #[test]
    fn test_simple_arithmetic_question_is_simple_qa_low() {
        let c = classify("What is 2+2?");
        assert_eq!(c.task_type(), TaskType::SimpleQa);
        assert!((1..=2).contains(&c.score()), "score was {}", c.score());
        assert!((c.confidence() - 1.0).abs() < f64::EPSILON);
        assert_eq!(c.classifier_mode(), ClassifierMode::RuleBased);
    }

    #[test]
    fn test_step_by_step_integral_is_math_high() {
        let c = classify("Solve the integral of x^2 * e^x dx step by step");
        assert_eq!(c.task_type(), TaskType::Math);
        assert!(c.score() >= 7, "score was {}", c.score());
        assert!(c
            .reasoning()
            .iter()
            .any(|r| r == "+2: requests detailed/thorough treatment"));
    }

    #[test]
    fn test_tie_prefers_code_over_math() {
        // one code signal (runtime) and one math signal (equation)
        let c = classify("Fix the runtime crash in the equation solver");
        assert_eq!(c.task_type(), TaskType::Code);
        assert!(c.reasoning()[0].ends_with("(1 signal)"));
    }

    #[test]
    fn test_empty_prompt_is_general_at_base_score() {
        for prompt in ["", "   ", "\n\t"] {
            let c = classify(prompt);
            assert_eq!(c.task_type(), TaskType::General);
            assert_eq!(c.score(), 3);
            assert!(c.reasoning().iter().all(|r| !r.contains("very short prompt")));
        }
    }

    #[test]
    fn test_short_prompt_reducer_boundary() {
        let just_under = classify(&"x".repeat(29));
        assert_eq!(just_under.score(), 2);
        assert_eq!(
            just_under.reasoning().last().map(String::as_str),
            Some("-1: very short prompt")
        );

        let at_limit = classify(&"x".repeat(30));
        assert_eq!(at_limit.score(), 3);
        assert!(at_limit.reasoning().iter().all(|r| !r.contains("very short prompt")));
    }

    #[test]
    fn test_signals_match_whole_words_only() {
        // "reasoning" is not the reasoning signal "reason"
        let c = classify("Explain the reasoning behind this decision");
        assert_eq!(c.task_type(), TaskType::General);
        assert_eq!(c.score(), 4);

        // "logical" is not "logic"
        let c = classify("Is this logical?");
        assert_eq!(c.task_type(), TaskType::SimpleQa);
        assert_eq!(c.score(), 1);

        // "errors" is not the code signal "error"
        let c = classify("What errors did Napoleon make in Russia?");
        assert_eq!(c.task_type(), TaskType::SimpleQa);
        assert_eq!(c.score(), 2);
    }

    #[test]
    fn test_singular_signals_still_fire() {
        assert_eq!(classify("Why does this error appear?").task_type(), TaskType::Code);
        assert_eq!(
            classify("Use logic to settle this dilemma").task_type(),
            TaskType::Reasoning
        );
    }

    #[test]
    fn test_very_long_prompt_gets_both_length_bonuses() {
        let prompt = "word ".repeat(300);
        let c = classify(&prompt);
        assert_eq!(c.task_type(), TaskType::General);
        // base 3, +1 and +2 for length
        assert_eq!(c.score(), 6);
        let length_notes = c
            .reasoning()
            .iter()
            .filter(|r| r.contains("long prompt"))
            .count();
        assert_eq!(length_notes, 2);
    }

    #[test]
    fn test_binary_question_clamps_to_one() {
        let c = classify("Is the sky blue? yes or no");
        assert_eq!(c.task_type(), TaskType::SimpleQa);
        assert_eq!(c.score(), 1);
        assert_eq!(
            c.reasoning().last().map(String::as_str),
            Some("clamped from -1 to 1")
        );
    }

    #[test]
    fn test_stacked_boosters_clamp_to_ten() {
        let c = classify(
            "Explain step by step the complex distributed architecture trade-offs of multiple security designs",
        );
        assert_eq!(c.score(), 10);
        assert!(c
            .reasoning()
            .last()
            .is_some_and(|r| r.starts_with("clamped from")));
    }

    #[test]
    fn test_reasoning_trace_order() {
        let c = classify("Solve the integral of x^2 * e^x dx step by step");
        let trace = c.reasoning();
        assert!(trace[0].starts_with("math/calculation keywords detected"));
        assert_eq!(trace[1], "base score 6 for task type 'math'");
        assert!(trace[2].starts_with("short prompt"));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let prompts = [
            "Write a haiku about autumn leaves",
            "Translate 'good morning' into Spanish",
            "Compare the pros and cons of Rust and Go for distributed systems",
            "",
        ];
        for prompt in prompts {
            assert_eq!(classify(prompt), classify(prompt));
        }
    }

    #[test]
    fn test_scores_always_in_bounds() {
        let prompts = [
            "hi",
            "yes or no? simple quick brief",
            "Design a comprehensive, scalable, distributed system architecture with authentication, \
             error handling and edge cases; compare several advanced design patterns step by step",
            "Why does the moon affect tides?",
        ];
        for prompt in prompts {
            let s = classify(prompt).score();
            assert!((1..=10).contains(&s), "score {s} out of range for {prompt:?}");
        }
    }

    #[test]
    fn test_translation_detected() {
        let c = classify("Please translate this paragraph into French for me");
        assert_eq!(c.task_type(), TaskType::Translation);
    }

    #[test]
    fn test_creative_detected() {
        let c = classify("Compose a poem about the ocean at night");
        assert_eq!(c.task_type(), TaskType::Creative);
    }

    #[tokio::test]
    async fn test_trait_classify_matches_evaluate() {
        let classifier = RuleBasedClassifier::new();
        let via_trait = PromptClassifier::classify(&classifier, "What is Rust?").await;
        assert_eq!(via_trait, classifier.evaluate("What is Rust?"));
        assert_eq!(classifier.mode(), ClassifierMode::RuleBased);
    }
}
