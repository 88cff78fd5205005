//! # prompt-gateway
//!
//! Complexity-aware prompt routing over Tokio.
//!
//! ## Architecture
//!
//! Every request flows one way through four components:
//! ```text
//! prompt ─► ResponseCache ─hit──────────────────────────────────────────► RouteResult
//!                 │miss
//!                 ▼
//!           Classifier ─► ModelRouter ─► ModelWorker (generate) ─► cost ─► cache + log
//! ```
//!
//! - [`classifier`] turns prompt text into a [`Classification`] (score 1–10,
//!   task type, reasoning trace).
//! - [`routing`] maps a classification onto a model from the static registry
//!   via a tier × task-type table and explains the decision in five steps.
//! - [`cache`] is a bounded LRU store with per-entry TTL guarding the whole
//!   pipeline.
//! - [`gateway`] orchestrates the above plus the external generation call.

// ── Lint policy ───────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(missing_docs)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

pub mod cache;
pub mod classifier;
pub mod config;
pub mod gateway;
pub mod metrics;
pub mod request_log;
pub mod routing;
pub mod worker;

// Re-exports for convenience
pub use cache::{CacheKey, CacheStats, ResponseCache};
pub use classifier::{
    Classification, ClassifierMode, LlmClassifier, PromptClassifier, RuleBasedClassifier, TaskType,
};
pub use config::GatewayConfig;
pub use gateway::{Gateway, GenerationOutput, HealthReport, RouteRequest, RouteResult};
pub use request_log::{GatewayStats, ModelUsageStat, RequestLog, RequestLogEntry};
pub use routing::{
    CostComparison, ModelDescriptor, ModelRegistry, ModelRouter, Provider, RoutingDecision, Tier,
};
pub use worker::{
    AnthropicWorker, EchoWorker, Generation, GenerationRequest, ModelWorker, OpenAiWorker, WorkerPool,
};

/// Initialise the global tracing subscriber.
///
/// Reads the `LOG_FORMAT` environment variable to choose output format:
/// - `"json"`: structured JSON output for log aggregators
/// - anything else (including unset): human-readable pretty output
///
/// Filter level is controlled by `RUST_LOG` (e.g. `RUST_LOG=info`).
///
/// # Errors
///
/// Returns [`GatewayError::Other`] if the global subscriber has already
/// been set (e.g. by a previous call or a test harness).
///
/// # Panics
///
/// This function never panics.
pub fn init_tracing() -> Result<(), GatewayError> {
    let format = match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    };
    init_tracing_with(format)
}

/// Initialise the global tracing subscriber with an explicit format.
///
/// # Errors
///
/// Returns [`GatewayError::Other`] if the global subscriber has already
/// been set.
pub fn init_tracing_with(format: LogFormat) -> Result<(), GatewayError> {
    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_current_span(true)
            .with_span_list(true)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init(),
    };

    result.map_err(|e| GatewayError::Other(format!("tracing init failed: {e}")))
}

/// Top-level gateway errors.
///
/// The only failure a routed request can surface is [`GatewayError::Generation`];
/// the remaining variants belong to the request boundary and to startup.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request was rejected at the boundary (blank prompt, unknown
    /// classifier mode, oversized input). Nothing entered the pipeline.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The backend call for the chosen model failed (network, auth, quota,
    /// or an unparseable backend response). Nothing was cached or logged.
    #[error("generation failed: {0}")]
    Generation(String),

    /// A configuration value is missing or invalid (e.g., missing env var).
    ///
    /// Returned at construction time so that misconfiguration surfaces
    /// immediately rather than at the first backend call.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Catch-all for errors that do not fit a specific variant.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display_includes_message() {
        let err = GatewayError::ConfigError("OPENAI_API_KEY not set".to_string());
        assert!(err.to_string().contains("OPENAI_API_KEY not set"));
    }

    #[test]
    fn test_generation_error_display_is_prefixed() {
        let err = GatewayError::Generation("openai: 429".to_string());
        assert_eq!(err.to_string(), "generation failed: openai: 429");
    }

    #[test]
    fn test_init_tracing_second_call_returns_err() {
        // First call may succeed or fail depending on test execution order.
        let _ = init_tracing();
        let result = init_tracing();
        assert!(result.is_err(), "double init must return Err, not panic");
    }
}
