//! Configuration validation engine.
//!
//! ## Responsibility
//! Validate semantic constraints on a parsed [`GatewayConfig`] that cannot
//! be expressed through the type system alone (range checks, references
//! from the routing table and classifier into the model registry).
//!
//! ## Guarantees
//! - Every validation rule has at least one test that triggers it
//! - Validation collects *all* errors before returning (no short-circuit)
//! - Error messages include the field path and the invalid value
//!
//! ## NOT Responsible For
//! - Parsing TOML (that belongs to `loader`)
//! - File I/O (that belongs to `loader`)

use super::GatewayConfig;
use crate::routing::config as routing_config;

/// Errors arising from configuration parsing, validation, or I/O.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing failed.
    #[error("Parse error in {file}: {source}")]
    Parse {
        /// Path of the file that failed to parse.
        file: String,
        /// Underlying TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },

    /// One or more semantic validation rules failed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A specific field has an out-of-range or contradictory value.
    #[error("Field '{field}' has invalid value {value}: {reason}")]
    InvalidField {
        /// Dot-separated field path (e.g., "cache.capacity").
        field: String,
        /// String representation of the invalid value.
        value: String,
        /// Human-readable explanation of the constraint.
        reason: String,
    },

    /// File I/O error.
    #[error("IO error reading {file}: {source}")]
    Io {
        /// Path of the file that could not be read.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Validate all semantic constraints on a [`GatewayConfig`].
///
/// Collects every violation before returning so the caller sees the full
/// scope of issues at once.
///
/// # Returns
///
/// - `Ok(())` if all constraints pass.
/// - `Err(Vec<ConfigError>)` with every violation found.
///
/// # Panics
///
/// This function never panics.
pub fn validate(config: &GatewayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // ── Cache ────────────────────────────────────────────────────────
    if config.cache.capacity == 0 {
        errors.push(ConfigError::InvalidField {
            field: "cache.capacity".into(),
            value: "0".into(),
            reason: "must be at least 1".into(),
        });
    }

    if config.cache.ttl_secs == 0 {
        errors.push(ConfigError::InvalidField {
            field: "cache.ttl_secs".into(),
            value: "0".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    // ── Worker ───────────────────────────────────────────────────────
    if config.worker.timeout_secs == 0 {
        errors.push(ConfigError::InvalidField {
            field: "worker.timeout_secs".into(),
            value: "0".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    // ── Routing ──────────────────────────────────────────────────────
    errors.extend(
        routing_config::validate(&config.routing)
            .into_iter()
            .map(ConfigError::Validation),
    );

    // ── Classifier model must be registered ──────────────────────────
    let llm_model = &config.classifier.llm_model;
    if !config.routing.models.iter().any(|m| &m.name == llm_model) {
        errors.push(ConfigError::InvalidField {
            field: "classifier.llm_model".into(),
            value: format!("'{llm_model}'"),
            reason: "must name a model in routing.models".into(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
