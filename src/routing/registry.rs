//! Static model registry.
//!
//! Holds one [`ModelDescriptor`] per backend model in declaration order and
//! remembers which one is the cost baseline. Loaded once at startup and
//! shared read-only afterwards.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Backend provider family. Selects the generation adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Provider {
    /// OpenAI chat completions API.
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic messages API.
    #[serde(rename = "anthropic")]
    Anthropic,
}

impl Provider {
    /// Wire name (`"openai"` / `"anthropic"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_max_context_tokens() -> u64 {
    128_000
}

/// Static metadata for one backend model.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelDescriptor {
    /// Registry name used in routing tables and results.
    pub name: String,
    /// Provider family.
    pub provider: Provider,
    /// USD per 1 000 input tokens.
    pub input_cost_per_1k: f64,
    /// USD per 1 000 output tokens.
    pub output_cost_per_1k: f64,
    /// Typical end-to-end latency in milliseconds.
    pub avg_latency_ms: u64,
    /// Short human-readable strengths, shown in the reasoning chain.
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Context window size. Default: `128000`.
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: u64,
    /// Identifier sent to the provider API when it differs from `name`
    /// (e.g. `claude-sonnet-4-5-20250929`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_model_id: Option<String>,
}

impl ModelDescriptor {
    /// Blended per-1k rate: `(input + output) / 2`.
    pub fn blended_cost_per_1k(&self) -> f64 {
        (self.input_cost_per_1k + self.output_cost_per_1k) / 2.0
    }

    /// Model identifier to send to the provider.
    pub fn api_model_id(&self) -> &str {
        self.api_model_id.as_deref().unwrap_or(&self.name)
    }
}

/// The three models of the default deployment, in declaration order.
pub fn default_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor {
            name: "gpt-4o-mini".to_string(),
            provider: Provider::OpenAi,
            input_cost_per_1k: 0.00015,
            output_cost_per_1k: 0.0006,
            avg_latency_ms: 300,
            strengths: strings(&["fast", "cheap", "simple tasks", "translations"]),
            max_context_tokens: 128_000,
            api_model_id: None,
        },
        ModelDescriptor {
            name: "gpt-4o".to_string(),
            provider: Provider::OpenAi,
            input_cost_per_1k: 0.005,
            output_cost_per_1k: 0.015,
            avg_latency_ms: 800,
            strengths: strings(&["top-tier reasoning", "complex math", "advanced code"]),
            max_context_tokens: 128_000,
            api_model_id: None,
        },
        ModelDescriptor {
            name: "claude-3.5-sonnet".to_string(),
            provider: Provider::Anthropic,
            input_cost_per_1k: 0.003,
            output_cost_per_1k: 0.015,
            avg_latency_ms: 700,
            strengths: strings(&[
                "nuanced analysis",
                "long-form writing",
                "creative writing",
                "multilingual",
            ]),
            max_context_tokens: 200_000,
            api_model_id: Some("claude-sonnet-4-5-20250929".to_string()),
        },
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Read-only model registry with a guaranteed baseline entry.
///
/// # Panics
///
/// This type and its methods never panic.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
    baseline_idx: usize,
}

impl ModelRegistry {
    /// Build a registry.
    ///
    /// # Errors
    ///
    /// Returns a message when `models` is empty, contains duplicate names,
    /// or does not contain `baseline`.
    pub fn new(models: Vec<ModelDescriptor>, baseline: &str) -> Result<Self, String> {
        if models.is_empty() {
            return Err("model registry must contain at least one model".to_string());
        }
        for (i, model) in models.iter().enumerate() {
            if models[..i].iter().any(|m| m.name == model.name) {
                return Err(format!("duplicate model name '{}'", model.name));
            }
        }
        let baseline_idx = models
            .iter()
            .position(|m| m.name == baseline)
            .ok_or_else(|| format!("baseline model '{baseline}' is not in the registry"))?;
        Ok(Self {
            models,
            baseline_idx,
        })
    }

    /// Look up a model by registry name.
    pub fn get(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.name == name)
    }

    /// The model every cost comparison is measured against.
    pub fn baseline(&self) -> &ModelDescriptor {
        &self.models[self.baseline_idx]
    }

    /// All models in declaration order.
    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Always `false`; a registry holds at least one model.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self {
            models: default_models(),
            // gpt-4o
            baseline_idx: 1,
        }
    }
}
