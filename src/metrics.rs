//! Prometheus metrics for the gateway.
//!
//! ## Usage
//!
//! Call [`init_metrics`] once at process startup. The recording helpers
//! (`record_route`, `record_cache_lookup`, …) are no-ops if `init_metrics`
//! was never called, so the gateway is always safe to run and observability
//! simply degrades gracefully.
//!
//! ## Metrics Exposed
//!
//! | Name | Type | Labels |
//! |------|------|--------|
//! | `gateway_requests_total` | Counter | `mode`, `outcome` |
//! | `gateway_cache_lookups_total` | Counter | `result` |
//! | `gateway_routed_total` | Counter | `model`, `tier`, `task_type` |
//! | `gateway_generation_errors_total` | Counter | `provider` |
//! | `gateway_generation_duration_seconds` | Histogram | `model` |
//! | `gateway_cost_usd_total` | Counter | `model` |

use std::sync::OnceLock;
use std::time::Duration;

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

use crate::GatewayError;

// ── Internal metrics bundle ────────────────────────────────────────────────

/// All gateway metrics, stored in a single [`OnceLock`].
pub struct Metrics {
    /// Registry that owns all metric descriptors.
    pub registry: Registry,
    /// Requests by classifier mode and outcome (`miss`, `hit`, `error`).
    pub requests_total: CounterVec,
    /// Cache lookups by result.
    pub cache_lookups: CounterVec,
    /// Routing decisions by model, tier and task type.
    pub routed_total: CounterVec,
    /// Failed backend calls by provider.
    pub generation_errors: CounterVec,
    /// Backend call latency.
    pub generation_duration: HistogramVec,
    /// Accumulated cost.
    pub cost_total: CounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn counter(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> Result<CounterVec, GatewayError> {
    let c = CounterVec::new(Opts::new(name, help), labels)
        .map_err(|e| GatewayError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(c.clone()))
        .map_err(|e| GatewayError::Other(format!("metrics registration failed: {e}")))?;
    Ok(c)
}

// ── Initialisation ─────────────────────────────────────────────────────────

/// Initialise all Prometheus metrics in a private registry.
///
/// Calling it a second time is a no-op (returns `Ok(())`).
///
/// # Errors
///
/// Returns [`GatewayError::Other`] if metric construction or registration
/// fails.
///
/// # Panics
///
/// This function never panics.
pub fn init_metrics() -> Result<(), GatewayError> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let requests_total = counter(
        &registry,
        "gateway_requests_total",
        "Routed requests by classifier mode and outcome",
        &["mode", "outcome"],
    )?;
    let cache_lookups = counter(
        &registry,
        "gateway_cache_lookups_total",
        "Response cache lookups by result",
        &["result"],
    )?;
    let routed_total = counter(
        &registry,
        "gateway_routed_total",
        "Routing decisions by model, tier and task type",
        &["model", "tier", "task_type"],
    )?;
    let generation_errors = counter(
        &registry,
        "gateway_generation_errors_total",
        "Failed backend generation calls",
        &["provider"],
    )?;
    let cost_total = counter(
        &registry,
        "gateway_cost_usd_total",
        "Accumulated generation cost in USD",
        &["model"],
    )?;

    let generation_duration = HistogramVec::new(
        HistogramOpts::new(
            "gateway_generation_duration_seconds",
            "Backend generation latency",
        ),
        &["model"],
    )
    .map_err(|e| GatewayError::Other(format!("metrics init failed: {e}")))?;
    registry
        .register(Box::new(generation_duration.clone()))
        .map_err(|e| GatewayError::Other(format!("metrics registration failed: {e}")))?;

    // A racing initialiser builds identical descriptors; first one wins.
    let _ = METRICS.set(Metrics {
        registry,
        requests_total,
        cache_lookups,
        routed_total,
        generation_errors,
        generation_duration,
        cost_total,
    });

    Ok(())
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

// ── Public helper functions ────────────────────────────────────────────────

/// Count a finished request. `outcome` is `miss`, `hit` or `error`.
///
/// No-op if metrics have not been initialised.
pub fn record_request(mode: &str, outcome: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.requests_total.get_metric_with_label_values(&[mode, outcome]) {
            c.inc();
        }
    }
}

/// Count a cache lookup.
///
/// No-op if metrics have not been initialised.
pub fn record_cache_lookup(hit: bool) {
    if let Some(m) = metrics() {
        let result = if hit { "hit" } else { "miss" };
        if let Ok(c) = m.cache_lookups.get_metric_with_label_values(&[result]) {
            c.inc();
        }
    }
}

/// Count a routing decision.
///
/// No-op if metrics have not been initialised.
pub fn record_route(model: &str, tier: &str, task_type: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m
            .routed_total
            .get_metric_with_label_values(&[model, tier, task_type])
        {
            c.inc();
        }
    }
}

/// Record a successful generation's latency and cost.
///
/// No-op if metrics have not been initialised.
pub fn record_generation(model: &str, latency: Duration, cost_usd: f64) {
    if let Some(m) = metrics() {
        if let Ok(h) = m.generation_duration.get_metric_with_label_values(&[model]) {
            h.observe(latency.as_secs_f64());
        }
        if cost_usd > 0.0 {
            if let Ok(c) = m.cost_total.get_metric_with_label_values(&[model]) {
                c.inc_by(cost_usd);
            }
        }
    }
}

/// Count a failed generation.
///
/// No-op if metrics have not been initialised.
pub fn record_generation_error(provider: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.generation_errors.get_metric_with_label_values(&[provider]) {
            c.inc();
        }
    }
}

/// Encode all metrics in the Prometheus text exposition format.
///
/// Returns an empty string if metrics have not been initialised or if
/// encoding fails.
///
/// # Panics
///
/// This function never panics.
pub fn gather_metrics() -> String {
    let Some(m) = metrics() else {
        return String::new();
    };
    let families = m.registry.gather();
    let mut buffer = Vec::new();
    if TextEncoder::new().encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
