//! Routing configuration types.
//!
//! Provides [`RoutingConfig`]: the model registry, the baseline model used
//! for cost comparisons, and the tier × task-type [`RoutingTable`]. All
//! fields have defaults matching the reference deployment and are
//! (de)serialisable via serde for TOML/JSON config files.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::registry::{default_models, ModelDescriptor, ModelRegistry};
use super::router::Tier;
use crate::classifier::TaskType;

// ── Default value functions ────────────────────────────────────────────

const CHEAP: &str = "gpt-4o-mini";
const TOP: &str = "gpt-4o";
const ALT_TOP: &str = "claude-3.5-sonnet";

/// Default baseline model for cost comparisons.
fn default_baseline_model() -> String {
    TOP.to_string()
}

fn default_low_routes() -> TierRoutes {
    TierRoutes::uniform(CHEAP)
}

fn default_medium_routes() -> TierRoutes {
    TierRoutes {
        code: CHEAP.to_string(),
        math: CHEAP.to_string(),
        creative: ALT_TOP.to_string(),
        analysis: ALT_TOP.to_string(),
        translation: ALT_TOP.to_string(),
        reasoning: ALT_TOP.to_string(),
        simple_qa: CHEAP.to_string(),
        general: CHEAP.to_string(),
    }
}

fn default_high_routes() -> TierRoutes {
    TierRoutes {
        code: TOP.to_string(),
        math: TOP.to_string(),
        creative: ALT_TOP.to_string(),
        analysis: ALT_TOP.to_string(),
        translation: ALT_TOP.to_string(),
        reasoning: TOP.to_string(),
        simple_qa: TOP.to_string(),
        general: ALT_TOP.to_string(),
    }
}

// ── RoutingTable ───────────────────────────────────────────────────────

/// Model choice for every task type within one tier.
///
/// One field per [`TaskType`], so a table is total over task types by
/// construction.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TierRoutes {
    /// Model for `code` prompts.
    pub code: String,
    /// Model for `math` prompts.
    pub math: String,
    /// Model for `creative` prompts.
    pub creative: String,
    /// Model for `analysis` prompts.
    pub analysis: String,
    /// Model for `translation` prompts.
    pub translation: String,
    /// Model for `reasoning` prompts.
    pub reasoning: String,
    /// Model for `simple_qa` prompts.
    pub simple_qa: String,
    /// Model for `general` prompts.
    pub general: String,
}

impl TierRoutes {
    /// Route every task type to the same model.
    pub fn uniform(model: &str) -> Self {
        Self {
            code: model.to_string(),
            math: model.to_string(),
            creative: model.to_string(),
            analysis: model.to_string(),
            translation: model.to_string(),
            reasoning: model.to_string(),
            simple_qa: model.to_string(),
            general: model.to_string(),
        }
    }

    /// Model name for `task_type`.
    pub fn model_for(&self, task_type: TaskType) -> &str {
        match task_type {
            TaskType::Code => &self.code,
            TaskType::Math => &self.math,
            TaskType::Creative => &self.creative,
            TaskType::Analysis => &self.analysis,
            TaskType::Translation => &self.translation,
            TaskType::Reasoning => &self.reasoning,
            TaskType::SimpleQa => &self.simple_qa,
            TaskType::General => &self.general,
        }
    }
}

/// Tier × task-type routing table.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RoutingTable {
    /// Scores 1–3.
    #[serde(default = "default_low_routes")]
    pub low: TierRoutes,
    /// Scores 4–6.
    #[serde(default = "default_medium_routes")]
    pub medium: TierRoutes,
    /// Scores 7–10.
    #[serde(default = "default_high_routes")]
    pub high: TierRoutes,
}

impl RoutingTable {
    /// Routes for one tier.
    pub fn tier(&self, tier: Tier) -> &TierRoutes {
        match tier {
            Tier::Low => &self.low,
            Tier::Medium => &self.medium,
            Tier::High => &self.high,
        }
    }

    /// Model name for a `(tier, task_type)` cell.
    pub fn lookup(&self, tier: Tier, task_type: TaskType) -> &str {
        self.tier(tier).model_for(task_type)
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self {
            low: default_low_routes(),
            medium: default_medium_routes(),
            high: default_high_routes(),
        }
    }
}

// ── RoutingConfig ──────────────────────────────────────────────────────

/// Configuration for the routing layer.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RoutingConfig {
    /// Registered models in declaration order.
    #[serde(default = "default_models")]
    pub models: Vec<ModelDescriptor>,

    /// Name of the model that cost savings are measured against.
    ///
    /// Must name an entry of `models`. Default: `"gpt-4o"`.
    #[serde(default = "default_baseline_model")]
    pub baseline_model: String,

    /// Tier × task-type table.
    #[serde(default)]
    pub table: RoutingTable,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            baseline_model: default_baseline_model(),
            table: RoutingTable::default(),
        }
    }
}

impl RoutingConfig {
    /// Build the read-only registry described by this config.
    ///
    /// # Errors
    ///
    /// Returns a message when the registry is empty, has duplicate names, or
    /// lacks the baseline model.
    pub fn registry(&self) -> Result<ModelRegistry, String> {
        ModelRegistry::new(self.models.clone(), &self.baseline_model)
    }
}

/// Validate a [`RoutingConfig`], returning a list of human-readable errors.
///
/// # Returns
///
/// An empty `Vec` on success, or one error string per violated constraint.
///
/// # Panics
///
/// This function never panics.
pub fn validate(config: &RoutingConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.models.is_empty() {
        errors.push("routing.models must contain at least one model".to_string());
    }

    for (i, model) in config.models.iter().enumerate() {
        if model.name.trim().is_empty() {
            errors.push(format!("routing.models[{i}].name must not be empty"));
        }
        if config.models[..i].iter().any(|m| m.name == model.name) {
            errors.push(format!("routing.models[{i}]: duplicate model name '{}'", model.name));
        }
        if model.input_cost_per_1k < 0.0 || !model.input_cost_per_1k.is_finite() {
            errors.push(format!(
                "routing.models[{i}].input_cost_per_1k must be a finite value >= 0, got {}",
                model.input_cost_per_1k
            ));
        }
        if model.output_cost_per_1k < 0.0 || !model.output_cost_per_1k.is_finite() {
            errors.push(format!(
                "routing.models[{i}].output_cost_per_1k must be a finite value >= 0, got {}",
                model.output_cost_per_1k
            ));
        }
    }

    let known = |name: &str| config.models.iter().any(|m| m.name == name);

    if !known(&config.baseline_model) {
        errors.push(format!(
            "routing.baseline_model '{}' is not a registered model",
            config.baseline_model
        ));
    }

    for tier in Tier::ALL {
        for task_type in TaskType::ALL {
            let model = config.table.lookup(tier, task_type);
            if !known(model) {
                errors.push(format!(
                    "routing.table.{}.{} references unknown model '{model}'",
                    tier.as_str(),
                    task_type.as_str()
                ));
            }
        }
    }

    errors
}

// ── Tests ──────────────────────────────────────────────────────────────
