//! Model routing logic.
//!
//! The [`ModelRouter`] maps a [`Classification`] onto a registry model via the
//! tier × task-type [`RoutingTable`](super::RoutingTable) and explains the
//! choice in a fixed five-step reasoning chain.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::{self, RoutingConfig, RoutingTable};
use super::cost::round_to;
use super::registry::{ModelDescriptor, ModelRegistry, Provider};
use crate::classifier::Classification;

/// Complexity tier.
///
/// | Tier     | Scores |
/// |----------|--------|
/// | `Low`    | 1–3    |
/// | `Medium` | 4–6    |
/// | `High`   | 7–10   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Scores 1–3.
    Low,
    /// Scores 4–6.
    Medium,
    /// Scores 7–10.
    High,
}

impl Tier {
    /// Every tier, lowest first.
    pub const ALL: [Tier; 3] = [Tier::Low, Tier::Medium, Tier::High];

    /// Tier for a complexity score. Boundaries 4 and 7 belong to the higher
    /// tier; out-of-range scores land in the nearest tier.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=3 => Tier::Low,
            4..=6 => Tier::Medium,
            _ => Tier::High,
        }
    }

    /// Config key (`"low"`, `"medium"`, `"high"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::High => "high",
        }
    }

    /// Inclusive score range as text.
    pub fn range(&self) -> &'static str {
        match self {
            Tier::Low => "1-3",
            Tier::Medium => "4-6",
            Tier::High => "7-10",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Low => "LOW",
            Tier::Medium => "MEDIUM",
            Tier::High => "HIGH",
        })
    }
}

/// One numbered line of the routing explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// 1-based position.
    pub step: u8,
    /// Human-readable text.
    pub description: String,
}

/// The routing decision for a single classification.
///
/// A pure function of the classification and the static tables.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Registry name of the chosen model.
    pub model: String,
    /// Provider of the chosen model.
    pub provider: Provider,
    /// Tier the score fell into.
    pub tier: Tier,
    /// Exactly five ordered steps.
    pub reasoning_chain: Vec<ReasoningStep>,
    /// Blended `(input + output) / 2` rate, 6 decimals.
    pub estimated_cost_per_1k: f64,
    /// Chosen model's average latency.
    pub estimated_latency_ms: u64,
}

/// Table-driven model router.
///
/// Stateless after construction; `route` takes `&self` and is safe to call
/// from any number of tasks.
///
/// # Panics
///
/// This type and its methods never panic.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    registry: ModelRegistry,
    table: RoutingTable,
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self {
            registry: ModelRegistry::default(),
            table: RoutingTable::default(),
        }
    }
}

impl ModelRouter {
    /// Create a router from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns every validation message joined with `"; "` when the table
    /// references unknown models, the baseline is missing, or the registry
    /// is malformed.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn new(config: &RoutingConfig) -> Result<Self, String> {
        let errors = config::validate(config);
        if !errors.is_empty() {
            return Err(errors.join("; "));
        }
        Ok(Self {
            registry: config.registry()?,
            table: config.table.clone(),
        })
    }

    /// The registry this router selects from.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Route a classification to a model.
    ///
    /// # Returns
    ///
    /// A [`RoutingDecision`] with a five-step reasoning chain. Identical
    /// classifications always yield identical decisions.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn route(&self, classification: &Classification) -> RoutingDecision {
        let tier = Tier::from_score(classification.score());
        let task_type = classification.task_type();
        // Every table entry is checked against the registry in `new`; the
        // baseline fallback only guards the `Default` path.
        let chosen = self
            .registry
            .get(self.table.lookup(tier, task_type))
            .unwrap_or_else(|| self.registry.baseline());

        let reasoning_chain = self.reasoning_chain(classification, tier, chosen);

        tracing::debug!(
            tier = tier.as_str(),
            task_type = task_type.as_str(),
            model = %chosen.name,
            "routing table lookup"
        );

        RoutingDecision {
            model: chosen.name.clone(),
            provider: chosen.provider,
            tier,
            reasoning_chain,
            estimated_cost_per_1k: round_to(chosen.blended_cost_per_1k(), 6),
            estimated_latency_ms: chosen.avg_latency_ms,
        }
    }

    fn reasoning_chain(
        &self,
        classification: &Classification,
        tier: Tier,
        chosen: &ModelDescriptor,
    ) -> Vec<ReasoningStep> {
        let baseline = self.registry.baseline();
        let task_type = classification.task_type();
        let score = classification.score();

        let classified = format!(
            "Prompt classified as '{task_type}' with complexity {score}/10 \
             (confidence: {:.2}) using {} classifier.",
            classification.confidence(),
            classification.classifier_mode()
        );

        let tiered = format!(
            "Complexity {score} falls in the {tier} tier (range {}).",
            tier.range()
        );

        let strengths = if chosen.strengths.is_empty() {
            "none listed".to_string()
        } else {
            chosen.strengths.join(", ")
        };
        let selected = format!(
            "For {tier} complexity + '{task_type}' tasks, routing to {} ({}). Strengths: {strengths}.",
            chosen.name, chosen.provider
        );

        let cost_note = cost_note(chosen, baseline);

        let latency = format!(
            "Expected latency: ~{}ms (baseline {}: ~{}ms).",
            chosen.avg_latency_ms, baseline.name, baseline.avg_latency_ms
        );

        [classified, tiered, selected, cost_note, latency]
            .into_iter()
            .zip(1u8..)
            .map(|(description, step)| ReasoningStep { step, description })
            .collect()
    }
}

fn cost_note(chosen: &ModelDescriptor, baseline: &ModelDescriptor) -> String {
    if chosen.name == baseline.name {
        return format!("{} is the baseline model, no savings on this request.", chosen.name);
    }

    let chosen_rate = chosen.blended_cost_per_1k();
    let baseline_rate = baseline.blended_cost_per_1k();
    let change = if baseline_rate > 0.0 {
        (baseline_rate - chosen_rate) / baseline_rate * 100.0
    } else {
        0.0
    };
    let direction = if change >= 0.0 {
        format!("~{change:.0}% cost reduction")
    } else {
        format!("~{:.0}% cost increase", -change)
    };
    format!(
        "Estimated ~${chosen_rate:.4}/1k tokens vs ${baseline_rate:.4}/1k ({} baseline), {direction}.",
        baseline.name
    )
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierMode, TaskType};

    fn classification(score: i64, task_type: TaskType) -> Classification {
        Classification::new(score, task_type, vec![], 1.0, ClassifierMode::RuleBased)
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::from_score(1), Tier::Low);
        assert_eq!(Tier::from_score(3), Tier::Low);
        assert_eq!(Tier::from_score(4), Tier::Medium);
        assert_eq!(Tier::from_score(6), Tier::Medium);
        assert_eq!(Tier::from_score(7), Tier::High);
        assert_eq!(Tier::from_score(10), Tier::High);
    }

    #[test]
    fn test_route_is_total_over_tiers_and_types() {
        let router = ModelRouter::default();
        for score in [2, 5, 9] {
            for task_type in TaskType::ALL {
                let decision = router.route(&classification(score, task_type));
                assert!(router.registry().get(&decision.model).is_some());
                assert_eq!(decision.reasoning_chain.len(), 5);
            }
        }
    }

    #[test]
    fn test_low_tier_routes_to_cheapest() {
        let router = ModelRouter::default();
        for task_type in TaskType::ALL {
            let d = router.route(&classification(1, task_type));
            assert_eq!(d.model, "gpt-4o-mini");
            assert_eq!(d.tier, Tier::Low);
        }
    }

    #[test]
    fn test_high_math_routes_to_top_model() {
        let d = ModelRouter::default().route(&classification(8, TaskType::Math));
        assert_eq!(d.model, "gpt-4o");
        assert_eq!(d.provider, Provider::OpenAi);
        assert!((d.estimated_cost_per_1k - 0.01).abs() < 1e-12);
        assert_eq!(d.estimated_latency_ms, 800);
    }

    #[test]
    fn test_medium_creative_routes_to_sonnet() {
        let d = ModelRouter::default().route(&classification(5, TaskType::Creative));
        assert_eq!(d.model, "claude-3.5-sonnet");
        assert_eq!(d.provider, Provider::Anthropic);
    }

    #[test]
    fn test_reasoning_chain_text() {
        let d = ModelRouter::default().route(&classification(2, TaskType::SimpleQa));
        let steps: Vec<&str> = d
            .reasoning_chain
            .iter()
            .map(|s| s.description.as_str())
            .collect();
        assert_eq!(
            steps[0],
            "Prompt classified as 'simple_qa' with complexity 2/10 (confidence: 1.00) using rule_based classifier."
        );
        assert_eq!(steps[1], "Complexity 2 falls in the LOW tier (range 1-3).");
        assert_eq!(
            steps[2],
            "For LOW complexity + 'simple_qa' tasks, routing to gpt-4o-mini (openai). \
             Strengths: fast, cheap, simple tasks, translations."
        );
        assert_eq!(
            steps[3],
            "Estimated ~$0.0004/1k tokens vs $0.0100/1k (gpt-4o baseline), ~96% cost reduction."
        );
        assert_eq!(steps[4], "Expected latency: ~300ms (baseline gpt-4o: ~800ms).");
        let numbers: Vec<u8> = d.reasoning_chain.iter().map(|s| s.step).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_baseline_choice_has_no_savings_note() {
        let d = ModelRouter::default().route(&classification(9, TaskType::Code));
        assert_eq!(
            d.reasoning_chain[3].description,
            "gpt-4o is the baseline model, no savings on this request."
        );
    }

    #[test]
    fn test_route_is_reproducible() {
        let router = ModelRouter::default();
        let c = classification(6, TaskType::Analysis);
        assert_eq!(router.route(&c), router.route(&c));
    }

    #[test]
    fn test_new_rejects_unknown_table_model() {
        let mut cfg = RoutingConfig::default();
        cfg.table.high.general = "ghost".to_string();
        let err = ModelRouter::new(&cfg).unwrap_err();
        assert!(err.contains("ghost"));
    }

    #[test]
    fn test_new_with_default_config_matches_default_router() {
        let router = ModelRouter::new(&RoutingConfig::default())
            .unwrap_or_else(|e| std::panic::panic_any(format!("test: {e}")));
        let c = classification(7, TaskType::Translation);
        assert_eq!(router.route(&c), ModelRouter::default().route(&c));
    }
}
