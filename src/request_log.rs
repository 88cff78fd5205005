//! In-memory request history and aggregate statistics.
//!
//! One compact [`RequestLogEntry`] is appended per successfully routed,
//! non-cached request. Reads return copies; the lock is never held across
//! I/O.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierMode, TaskType};
use crate::gateway::RouteResult;
use crate::routing::cost::round_to;

/// Longest prompt snippet kept in a log entry, in characters.
pub const SNIPPET_MAX_CHARS: usize = 120;

/// One row of routing history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    /// Request id of the originating result.
    pub request_id: String,
    /// When the result was produced.
    pub timestamp: DateTime<Utc>,
    /// At most 120 characters of the prompt.
    pub prompt_snippet: String,
    /// Classifier that produced the classification.
    pub classifier_mode: ClassifierMode,
    /// Complexity score, 1–10.
    pub complexity_score: u8,
    /// Detected task type.
    pub task_type: TaskType,
    /// Model that served the request.
    pub routed_model: String,
    /// Backend latency.
    pub latency_ms: u64,
    /// Actual cost.
    pub cost: f64,
    /// Baseline cost for the same tokens.
    pub baseline_cost: f64,
}

impl RequestLogEntry {
    /// Build an entry from a full result.
    pub fn from_result(result: &RouteResult) -> Self {
        Self {
            request_id: result.request_id.clone(),
            timestamp: result.timestamp,
            prompt_snippet: snippet(&result.prompt),
            classifier_mode: result.classification.classifier_mode(),
            complexity_score: result.classification.score(),
            task_type: result.classification.task_type(),
            routed_model: result.routing.model.clone(),
            latency_ms: result.response.latency_ms,
            cost: result.cost_comparison.chosen_cost,
            baseline_cost: result.cost_comparison.baseline_cost,
        }
    }
}

/// Truncate to [`SNIPPET_MAX_CHARS`], marking truncation with `...`.
pub fn snippet(prompt: &str) -> String {
    if prompt.chars().count() <= SNIPPET_MAX_CHARS {
        return prompt.to_string();
    }
    let mut cut: String = prompt.chars().take(SNIPPET_MAX_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

/// Per-model usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelUsageStat {
    /// Model name.
    pub model: String,
    /// Requests served.
    pub request_count: u64,
    /// Summed cost, 6 decimals.
    pub total_cost: f64,
    /// Mean latency, 2 decimals.
    pub avg_latency_ms: f64,
}

/// Aggregates over the whole log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GatewayStats {
    /// Logged requests.
    pub total_requests: u64,
    /// Summed actual cost, 6 decimals.
    pub total_cost: f64,
    /// Summed baseline cost, 6 decimals.
    pub total_baseline_cost: f64,
    /// `max(0, baseline - actual)`, 6 decimals.
    pub total_savings: f64,
    /// Savings relative to baseline, capped at 100, 2 decimals.
    pub savings_percent: f64,
    /// Usage per model in first-seen order.
    pub model_usage: Vec<ModelUsageStat>,
    /// Mean complexity score, 2 decimals.
    pub avg_complexity: f64,
}

/// Thread-safe append-only request log.
#[derive(Debug, Default)]
pub struct RequestLog {
    entries: RwLock<Vec<RequestLogEntry>>,
}

impl RequestLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn append(&self, entry: RequestLogEntry) {
        self.entries.write().push(entry);
    }

    /// Entries newest first, skipping `offset` and returning at most `limit`.
    pub fn logs(&self, limit: usize, offset: usize) -> Vec<RequestLogEntry> {
        self.entries
            .read()
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of logged requests.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compute aggregate statistics.
    pub fn stats(&self) -> GatewayStats {
        let entries = self.entries.read().clone();
        if entries.is_empty() {
            return GatewayStats::default();
        }

        struct Usage {
            model: String,
            count: u64,
            cost: f64,
            latency_sum: u64,
        }

        let mut total_cost = 0.0;
        let mut total_baseline = 0.0;
        let mut total_complexity = 0_u64;
        let mut usage: Vec<Usage> = Vec::new();

        for entry in &entries {
            total_cost += entry.cost;
            total_baseline += entry.baseline_cost;
            total_complexity += u64::from(entry.complexity_score);

            match usage.iter_mut().find(|u| u.model == entry.routed_model) {
                Some(u) => {
                    u.count += 1;
                    u.cost += entry.cost;
                    u.latency_sum = u.latency_sum.saturating_add(entry.latency_ms);
                }
                None => usage.push(Usage {
                    model: entry.routed_model.clone(),
                    count: 1,
                    cost: entry.cost,
                    latency_sum: entry.latency_ms,
                }),
            }
        }

        let total_requests = entries.len() as u64;
        let total_savings = (total_baseline - total_cost).max(0.0);
        let savings_percent = if total_baseline > 0.0 {
            (total_savings / total_baseline * 100.0).min(100.0)
        } else {
            0.0
        };

        GatewayStats {
            total_requests,
            total_cost: round_to(total_cost, 6),
            total_baseline_cost: round_to(total_baseline, 6),
            total_savings: round_to(total_savings, 6),
            savings_percent: round_to(savings_percent, 2),
            model_usage: usage
                .into_iter()
                .map(|u| ModelUsageStat {
                    avg_latency_ms: round_to(u.latency_sum as f64 / u.count as f64, 2),
                    model: u.model,
                    request_count: u.count,
                    total_cost: round_to(u.cost, 6),
                })
                .collect(),
            avg_complexity: round_to(total_complexity as f64 / total_requests as f64, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, model: &str, score: u8, latency_ms: u64, cost: f64, baseline: f64) -> RequestLogEntry {
        RequestLogEntry {
            request_id: id.to_string(),
            timestamp: Utc::now(),
            prompt_snippet: format!("prompt {id}"),
            classifier_mode: ClassifierMode::RuleBased,
            complexity_score: score,
            task_type: TaskType::General,
            routed_model: model.to_string(),
            latency_ms,
            cost,
            baseline_cost: baseline,
        }
    }

    #[test]
    fn test_snippet_truncates_long_prompts() {
        let long = "x".repeat(200);
        let s = snippet(&long);
        assert_eq!(s.chars().count(), 120);
        assert!(s.ends_with("..."));
        assert_eq!(snippet("short"), "short");
        assert_eq!(snippet(&"y".repeat(120)).len(), 120);
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let s = snippet(&"é".repeat(150));
        assert_eq!(s.chars().count(), 120);
    }

    #[test]
    fn test_logs_newest_first_with_pagination() {
        let log = RequestLog::new();
        for i in 0..5 {
            log.append(entry(&i.to_string(), "gpt-4o-mini", 2, 10, 0.0, 0.0));
        }
        let ids: Vec<String> = log.logs(2, 1).into_iter().map(|e| e.request_id).collect();
        assert_eq!(ids, vec!["3", "2"]);
        assert!(log.logs(10, 10).is_empty());
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn test_empty_stats_are_zero() {
        assert_eq!(RequestLog::new().stats(), GatewayStats::default());
    }

    #[test]
    fn test_stats_aggregate_per_model_in_first_seen_order() {
        let log = RequestLog::new();
        log.append(entry("a", "gpt-4o-mini", 2, 100, 0.001, 0.01));
        log.append(entry("b", "gpt-4o", 8, 800, 0.02, 0.02));
        log.append(entry("c", "gpt-4o-mini", 3, 200, 0.002, 0.02));

        let stats = log.stats();
        assert_eq!(stats.total_requests, 3);
        assert!((stats.total_cost - 0.023).abs() < 1e-9);
        assert!((stats.total_baseline_cost - 0.05).abs() < 1e-9);
        assert!((stats.total_savings - 0.027).abs() < 1e-9);
        assert!((stats.savings_percent - 54.0).abs() < 1e-9);
        assert!((stats.avg_complexity - 4.33).abs() < 1e-9);

        let models: Vec<&str> = stats.model_usage.iter().map(|u| u.model.as_str()).collect();
        assert_eq!(models, vec!["gpt-4o-mini", "gpt-4o"]);
        assert_eq!(stats.model_usage[0].request_count, 2);
        assert!((stats.model_usage[0].avg_latency_ms - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_savings_never_negative() {
        let log = RequestLog::new();
        log.append(entry("a", "gpt-4o", 9, 800, 0.03, 0.02));
        let stats = log.stats();
        assert_eq!(stats.total_savings, 0.0);
        assert_eq!(stats.savings_percent, 0.0);
    }

    #[test]
    fn test_reads_leave_entries_in_place() {
        let log = RequestLog::new();
        log.append(entry("a", "gpt-4o", 9, 800, 0.03, 0.02));
        log.append(entry("b", "gpt-4o-mini", 2, 100, 0.001, 0.01));
        let _ = log.logs(10, 0);
        let _ = log.stats();
        assert_eq!(log.len(), 2);
        let ids: Vec<String> = log.logs(10, 0).into_iter().map(|e| e.request_id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
