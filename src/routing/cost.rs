//! Cost computation and savings against the baseline model.
//!
//! Prices are static per-model rates from the registry multiplied by the
//! token counts a backend actually reported. Nothing here is billing-grade.

use serde::{Deserialize, Serialize};

use super::registry::ModelDescriptor;

/// Round `value` to `places` decimal digits, half away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// Split-rate cost of one generation, rounded to 6 decimals.
///
/// `input / 1000 * input_rate + output / 1000 * output_rate`
pub fn generation_cost(model: &ModelDescriptor, input_tokens: u64, output_tokens: u64) -> f64 {
    let input = input_tokens as f64 / 1000.0 * model.input_cost_per_1k;
    let output = output_tokens as f64 / 1000.0 * model.output_cost_per_1k;
    round_to(input + output, 6)
}

/// What a request cost versus what the baseline model would have cost.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostComparison {
    /// Model that served the request.
    pub chosen_model: String,
    /// Actual split-rate cost, 6 decimals.
    pub chosen_cost: f64,
    /// Baseline model name.
    pub baseline_model: String,
    /// Blended baseline rate applied to total tokens, 6 decimals.
    pub baseline_cost: f64,
    /// `(baseline - chosen) / baseline * 100`, 2 decimals; `0` unless the
    /// chosen model was strictly cheaper.
    pub savings_percent: f64,
}

impl CostComparison {
    /// Compare an actual generation against the baseline.
    ///
    /// # Arguments
    ///
    /// * `chosen`: Model that served the request.
    /// * `baseline`: Registry baseline.
    /// * `input_tokens` / `output_tokens`: Counts reported by the backend.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn compute(
        chosen: &ModelDescriptor,
        baseline: &ModelDescriptor,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Self {
        let chosen_cost = generation_cost(chosen, input_tokens, output_tokens);
        let tokens_used = input_tokens.saturating_add(output_tokens);
        let baseline_cost = tokens_used as f64 / 1000.0 * baseline.blended_cost_per_1k();

        let savings_percent = if baseline_cost > 0.0 && chosen_cost < baseline_cost {
            round_to((baseline_cost - chosen_cost) / baseline_cost * 100.0, 2)
        } else {
            0.0
        };

        Self {
            chosen_model: chosen.name.clone(),
            chosen_cost,
            baseline_model: baseline.name.clone(),
            baseline_cost: round_to(baseline_cost, 6),
            savings_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::ModelRegistry;

    fn model(registry: &ModelRegistry, name: &str) -> ModelDescriptor {
        registry
            .get(name)
            .cloned()
            .unwrap_or_else(|| std::panic::panic_any(format!("test: missing model {name}")))
    }

    #[test]
    fn test_round_to() {
        assert!((round_to(1.23456, 2) - 1.23).abs() < 1e-12);
        assert!((round_to(2.5, 0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_generation_cost_uses_split_rates() {
        let registry = ModelRegistry::default();
        let mini = model(&registry, "gpt-4o-mini");
        // 1000 in * 0.00015 + 1000 out * 0.0006
        assert!((generation_cost(&mini, 1000, 1000) - 0.00075).abs() < 1e-12);
    }

    #[test]
    fn test_cheap_model_reports_savings() {
        let registry = ModelRegistry::default();
        let mini = model(&registry, "gpt-4o-mini");
        let cmp = CostComparison::compute(&mini, registry.baseline(), 1000, 1000);
        // baseline: 2000 tokens * 0.01 / 1000 = 0.02
        assert!((cmp.baseline_cost - 0.02).abs() < 1e-12);
        assert!((cmp.chosen_cost - 0.00075).abs() < 1e-12);
        assert!((cmp.savings_percent - 96.25).abs() < 1e-9);
        assert_eq!(cmp.chosen_model, "gpt-4o-mini");
        assert_eq!(cmp.baseline_model, "gpt-4o");
    }

    #[test]
    fn test_zero_tokens_means_zero_savings() {
        let registry = ModelRegistry::default();
        let mini = model(&registry, "gpt-4o-mini");
        let cmp = CostComparison::compute(&mini, registry.baseline(), 0, 0);
        assert_eq!(cmp.savings_percent, 0.0);
        assert_eq!(cmp.baseline_cost, 0.0);
    }

    #[test]
    fn test_more_expensive_than_baseline_means_zero_savings() {
        let registry = ModelRegistry::default();
        // Output-heavy generation on the baseline itself: split-rate cost
        // exceeds the blended baseline estimate.
        let cmp = CostComparison::compute(registry.baseline(), registry.baseline(), 0, 1000);
        assert!(cmp.chosen_cost > cmp.baseline_cost);
        assert_eq!(cmp.savings_percent, 0.0);
    }
}
