//! # Stage: Declarative Gateway Configuration
//!
//! ## Responsibility
//! Parse and validate the TOML file that describes a gateway deployment:
//! the model registry, the tier × task-type routing table, the response
//! cache, the LLM classifier and the backend workers.
//! ```text
//! GATEWAY_CONFIG=gateway.toml cargo run
//! ```
//!
//! ## Guarantees
//! - Deterministic: same TOML input always produces the same `GatewayConfig`
//! - Validated: all semantic constraints are checked before a config is accepted
//! - Total defaults: an empty file yields the reference deployment
//! - Schema-exportable: JSON Schema output enables IDE autocomplete
//!
//! ## NOT Responsible For
//! - Building the gateway from config (that belongs to `gateway`)
//! - Managing worker connections (that belongs to `worker`)

pub mod loader;
pub mod validation;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL_SECS};
use crate::routing::RoutingConfig;

// ── Default value functions ──────────────────────────────────────────────

/// Default cache capacity: 100 entries.
fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

/// Default cache TTL: 1800 seconds (30 minutes).
fn default_cache_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

/// Default classifier model.
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Default backend request timeout: 30 seconds.
fn default_timeout_secs() -> u64 {
    30
}

// ── Top-level config ─────────────────────────────────────────────────────

/// Root configuration for a gateway instance.
///
/// Every section is optional; omitted sections take the documented
/// defaults.
///
/// # Example
///
/// ```toml
/// [cache]
/// capacity = 500
/// ttl_secs = 600
///
/// [routing]
/// baseline_model = "gpt-4o"
///
/// [classifier]
/// llm_model = "gpt-4o-mini"
/// ```
///
/// # Panics
///
/// This type never panics during construction or access.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct GatewayConfig {
    /// Response cache sizing.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Model registry, baseline and routing table.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// LLM classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Backend worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging format.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ── Sections ─────────────────────────────────────────────────────────────

/// Response cache configuration.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of cached results. Default: `100`.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// Seconds a cached result stays valid. Default: `1800`.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// LLM classifier configuration.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ClassifierConfig {
    /// Registry model used for `llm_based` classification.
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            llm_model: default_llm_model(),
        }
    }
}

/// Backend worker configuration.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct WorkerConfig {
    /// Per-request HTTP timeout. Default: `30`.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Observability configuration.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct ObservabilityConfig {
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log output format.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable log output.
    #[default]
    Pretty,
    /// Structured JSON log output for machine consumption.
    Json,
}

/// Export the JSON Schema for `GatewayConfig`.
///
/// # Errors
///
/// Returns `serde_json::Error` if schema serialization fails.
///
/// # Panics
///
/// This function never panics.
pub fn export_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(GatewayConfig);
    serde_json::to_string_pretty(&schema)
}
