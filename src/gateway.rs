//! # Stage: Orchestration
//!
//! ## Responsibility
//! Run one routed request end to end: cache lookup, classification, routing,
//! generation, cost comparison, then cache store and log append. Also serves
//! the read-only views (models, logs, stats, cache stats, health).
//!
//! ## Guarantees
//! - Single failure mode: a routed request fails only when the backend call
//!   fails, and then nothing is cached or logged.
//! - Cache hits return the stored result unchanged except for
//!   `served_from_cache = true`.
//! - No lock is held across an `.await`.
//!
//! ## NOT Responsible For
//! - HTTP transport (callers wrap this in whatever server they like)
//! - Deduplicating concurrent misses for the same prompt

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{Instrument, Span};

use crate::cache::{CacheKey, CacheStats, ResponseCache};
use crate::classifier::{
    Classification, ClassifierMode, LlmClassifier, PromptClassifier, RuleBasedClassifier,
};
use crate::config::GatewayConfig;
use crate::metrics;
use crate::request_log::{GatewayStats, RequestLog, RequestLogEntry};
use crate::routing::{CostComparison, ModelDescriptor, ModelRouter, Provider, RoutingDecision};
use crate::worker::{GenerationRequest, ModelWorker};
use crate::GatewayError;

/// Longest accepted prompt, in characters, after trimming.
pub const MAX_PROMPT_CHARS: usize = 10_000;

// ── Boundary ─────────────────────────────────────────────────────────────

/// A validated routing request.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    /// Trimmed, non-empty prompt.
    pub prompt: String,
    /// Classifier to use.
    pub mode: ClassifierMode,
}

impl RouteRequest {
    /// Validate raw input.
    ///
    /// # Arguments
    ///
    /// * `prompt`: Raw prompt text; surrounding whitespace is removed.
    /// * `mode`: `"rule_based"`, `"llm_based"`, or `None` for rule-based.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Validation`] for a blank or oversized prompt, or an
    /// unknown mode string.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn new(prompt: &str, mode: Option<&str>) -> Result<Self, GatewayError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GatewayError::Validation("prompt must not be empty".into()));
        }
        let chars = prompt.chars().count();
        if chars > MAX_PROMPT_CHARS {
            return Err(GatewayError::Validation(format!(
                "prompt is {chars} characters, limit is {MAX_PROMPT_CHARS}"
            )));
        }
        let mode = match mode {
            None => ClassifierMode::default(),
            Some(raw) => raw.parse().map_err(GatewayError::Validation)?,
        };
        Ok(Self {
            prompt: prompt.to_string(),
            mode,
        })
    }
}

// ── Results ──────────────────────────────────────────────────────────────

/// What the backend produced for a routed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOutput {
    /// Model that answered.
    pub model: String,
    /// Provider of that model.
    pub provider: Provider,
    /// Generated text.
    pub text: String,
    /// Prompt tokens.
    pub input_tokens: u64,
    /// Completion tokens.
    pub output_tokens: u64,
    /// `input_tokens + output_tokens`.
    pub tokens_used: u64,
    /// Backend latency.
    pub latency_ms: u64,
    /// Actual cost at split rates, 6 decimals.
    pub cost: f64,
}

/// Everything known about one routed request.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    /// UUID v4, simple (hyphenless) form.
    pub request_id: String,
    /// Prompt as routed.
    pub prompt: String,
    /// Classifier output.
    pub classification: Classification,
    /// Router output.
    pub routing: RoutingDecision,
    /// Backend output.
    pub response: GenerationOutput,
    /// Actual versus baseline cost.
    pub cost_comparison: CostComparison,
    /// When the result was first produced.
    pub timestamp: DateTime<Utc>,
    /// `true` when returned from the cache.
    pub served_from_cache: bool,
}

/// Liveness summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// Always `"ok"` while the gateway is constructed.
    pub status: String,
    /// Registered model names in declaration order.
    pub models_available: Vec<String>,
    /// Current cache counters.
    pub cache_stats: CacheStats,
    /// Entries in the request log.
    pub total_requests_logged: usize,
}

// ── Gateway ──────────────────────────────────────────────────────────────

/// The prompt gateway.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use prompt_gateway::{ClassifierMode, EchoWorker, Gateway, ModelRouter, ResponseCache};
///
/// # async fn demo() -> Result<(), prompt_gateway::GatewayError> {
/// let gateway = Gateway::new(
///     ModelRouter::default(),
///     Arc::new(EchoWorker::new()),
///     ResponseCache::default(),
/// );
/// let result = gateway.handle_route("What is 2+2?", ClassifierMode::RuleBased).await?;
/// assert_eq!(result.routing.model, "gpt-4o-mini");
/// # Ok(())
/// # }
/// ```
pub struct Gateway {
    router: ModelRouter,
    rule: RuleBasedClassifier,
    llm: LlmClassifier,
    worker: Arc<dyn ModelWorker>,
    cache: ResponseCache<RouteResult>,
    log: RequestLog,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("models", &self.router.registry().len())
            .field("llm_classifier", &self.llm.model_name())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Assemble a gateway from its parts.
    ///
    /// The LLM classifier uses the registry's cheapest model (by blended
    /// rate); use [`Gateway::with_llm_classifier`] to pick another.
    pub fn new(
        router: ModelRouter,
        worker: Arc<dyn ModelWorker>,
        cache: ResponseCache<RouteResult>,
    ) -> Self {
        let classifier_model = cheapest_model(&router).clone();
        let llm = LlmClassifier::new(Arc::clone(&worker), classifier_model);
        Self {
            router,
            rule: RuleBasedClassifier::new(),
            llm,
            worker,
            cache,
            log: RequestLog::new(),
        }
    }

    /// Replace the LLM classifier.
    pub fn with_llm_classifier(mut self, llm: LlmClassifier) -> Self {
        self.llm = llm;
        self
    }

    /// Build a gateway from a validated configuration.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConfigError`] when the routing section is invalid or
    /// the classifier model is not registered.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn from_config(
        config: &GatewayConfig,
        worker: Arc<dyn ModelWorker>,
    ) -> Result<Self, GatewayError> {
        let router = ModelRouter::new(&config.routing).map_err(GatewayError::ConfigError)?;
        let classifier_model = router
            .registry()
            .get(&config.classifier.llm_model)
            .cloned()
            .ok_or_else(|| {
                GatewayError::ConfigError(format!(
                    "classifier model '{}' is not registered",
                    config.classifier.llm_model
                ))
            })?;
        let cache = ResponseCache::new(
            config.cache.capacity,
            Duration::from_secs(config.cache.ttl_secs),
        );
        let llm = LlmClassifier::new(Arc::clone(&worker), classifier_model);
        Ok(Self::new(router, worker, cache).with_llm_classifier(llm))
    }

    /// Validate raw input and route it.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Validation`] for bad input, otherwise as
    /// [`Gateway::handle_route`].
    pub async fn route_raw(
        &self,
        prompt: &str,
        mode: Option<&str>,
    ) -> Result<RouteResult, GatewayError> {
        let request = RouteRequest::new(prompt, mode)?;
        self.handle_request(&request).await
    }

    /// Route a validated request.
    ///
    /// # Errors
    ///
    /// As [`Gateway::handle_route`].
    pub async fn handle_request(&self, request: &RouteRequest) -> Result<RouteResult, GatewayError> {
        self.handle_route(&request.prompt, request.mode).await
    }

    /// Serve `prompt` from the cache, or classify, route and generate it.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Generation`] when the backend call fails. Nothing is
    /// cached or logged in that case.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub async fn handle_route(
        &self,
        prompt: &str,
        mode: ClassifierMode,
    ) -> Result<RouteResult, GatewayError> {
        let span = tracing::info_span!(
            "gateway.route",
            mode = %mode,
            cache = tracing::field::Empty,
            model = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );
        self.route_in_span(prompt, mode).instrument(span).await
    }

    async fn route_in_span(
        &self,
        prompt: &str,
        mode: ClassifierMode,
    ) -> Result<RouteResult, GatewayError> {
        let start = Instant::now();
        let key = CacheKey::new(prompt, mode);

        if let Some(mut cached) = self.cache.get(&key) {
            tracing::debug!(key = %key, model = %cached.routing.model, "cache hit");
            metrics::record_cache_lookup(true);
            metrics::record_request(mode.as_str(), "hit");
            Span::current().record("cache", "hit");
            Span::current().record("duration_ms", start.elapsed().as_millis() as u64);
            Span::current().record("outcome", "ok");
            cached.served_from_cache = true;
            return Ok(cached);
        }
        tracing::debug!(key = %key, "cache miss");
        metrics::record_cache_lookup(false);
        Span::current().record("cache", "miss");

        let classification = match mode {
            ClassifierMode::RuleBased => self.rule.classify(prompt).await,
            ClassifierMode::LlmBased => self.llm.classify(prompt).await,
        };

        let routing = self.router.route(&classification);
        tracing::info!(
            model = %routing.model,
            tier = %routing.tier,
            task_type = %classification.task_type(),
            score = classification.score(),
            "routing decision"
        );
        metrics::record_route(
            &routing.model,
            routing.tier.as_str(),
            classification.task_type().as_str(),
        );
        Span::current().record("model", routing.model.as_str());

        let registry = self.router.registry();
        let chosen = registry
            .get(&routing.model)
            .unwrap_or_else(|| registry.baseline());

        let generation = match self
            .worker
            .generate(&GenerationRequest::new(prompt), chosen)
            .await
        {
            Ok(generation) => generation,
            Err(e) => {
                tracing::warn!(
                    model = %chosen.name,
                    provider = %chosen.provider,
                    error = %e,
                    "generation failed"
                );
                metrics::record_generation_error(chosen.provider.as_str());
                metrics::record_request(mode.as_str(), "error");
                Span::current().record("outcome", "err");
                return Err(e);
            }
        };

        let cost_comparison = CostComparison::compute(
            chosen,
            registry.baseline(),
            generation.input_tokens,
            generation.output_tokens,
        );
        metrics::record_generation(
            &chosen.name,
            Duration::from_millis(generation.latency_ms),
            cost_comparison.chosen_cost,
        );

        let result = RouteResult {
            request_id: uuid::Uuid::new_v4().simple().to_string(),
            prompt: prompt.to_string(),
            classification,
            response: GenerationOutput {
                model: chosen.name.clone(),
                provider: chosen.provider,
                tokens_used: generation.tokens_used(),
                text: generation.text,
                input_tokens: generation.input_tokens,
                output_tokens: generation.output_tokens,
                latency_ms: generation.latency_ms,
                cost: cost_comparison.chosen_cost,
            },
            routing,
            cost_comparison,
            timestamp: Utc::now(),
            served_from_cache: false,
        };

        self.cache.put(key, result.clone());
        self.log.append(RequestLogEntry::from_result(&result));

        metrics::record_request(mode.as_str(), "miss");
        Span::current().record("duration_ms", start.elapsed().as_millis() as u64);
        Span::current().record("outcome", "ok");
        Ok(result)
    }

    /// Registered models in declaration order.
    pub fn list_models(&self) -> &[ModelDescriptor] {
        self.router.registry().models()
    }

    /// Logged requests, newest first.
    pub fn logs(&self, limit: usize, offset: usize) -> Vec<RequestLogEntry> {
        self.log.logs(limit, offset)
    }

    /// Aggregate statistics over the request log.
    pub fn stats(&self) -> GatewayStats {
        self.log.stats()
    }

    /// Response cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Empty the response cache and reset its counters.
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("response cache cleared");
    }

    /// Liveness summary.
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok".to_string(),
            models_available: self.list_models().iter().map(|m| m.name.clone()).collect(),
            cache_stats: self.cache_stats(),
            total_requests_logged: self.log.len(),
        }
    }
}

fn cheapest_model(router: &ModelRouter) -> &ModelDescriptor {
    let registry = router.registry();
    registry
        .models()
        .iter()
        .min_by(|a, b| a.blended_cost_per_1k().total_cmp(&b.blended_cost_per_1k()))
        .unwrap_or_else(|| registry.baseline())
}
