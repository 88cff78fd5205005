//! End-to-end tests for `Gateway` with the offline echo worker.
//!
//! Covers the reference scenarios (simple question, hard math, repeat hit),
//! failure isolation, LLM classifier fallback, boundary validation and
//! concurrent access to the shared cache and log.

use std::sync::Arc;
use std::time::Duration;

use prompt_gateway::config::loader::load_from_str;
use prompt_gateway::{
    ClassifierMode, EchoWorker, Gateway, GatewayError, ModelRouter, ModelWorker, ResponseCache,
    RouteResult, TaskType, Tier,
};

fn gateway_with(worker: Arc<dyn ModelWorker>) -> Gateway {
    Gateway::new(ModelRouter::default(), worker, ResponseCache::default())
}

async fn route(gateway: &Gateway, prompt: &str, mode: ClassifierMode) -> RouteResult {
    gateway
        .handle_route(prompt, mode)
        .await
        .unwrap_or_else(|e| std::panic::panic_any(format!("test: route failed: {e}")))
}

#[tokio::test]
async fn test_simple_question_routes_to_cheapest_model() {
    let gateway = gateway_with(Arc::new(EchoWorker::new()));
    let result = route(&gateway, "What is 2+2?", ClassifierMode::RuleBased).await;

    assert_eq!(result.classification.task_type(), TaskType::SimpleQa);
    assert!((1..=2).contains(&result.classification.score()));
    assert_eq!(result.routing.tier, Tier::Low);
    assert_eq!(result.routing.model, "gpt-4o-mini");
    assert_eq!(result.routing.reasoning_chain.len(), 5);
    assert!(result.cost_comparison.savings_percent > 0.0);
    assert!(!result.served_from_cache);
}

#[tokio::test]
async fn test_hard_math_routes_to_top_model() {
    let gateway = gateway_with(Arc::new(EchoWorker::new()));
    let result = route(
        &gateway,
        "Solve the integral of x^2 * e^x dx step by step",
        ClassifierMode::RuleBased,
    )
    .await;

    assert_eq!(result.classification.task_type(), TaskType::Math);
    assert!(result
        .classification
        .reasoning()
        .iter()
        .any(|r| r.starts_with("+2")));
    assert_eq!(result.routing.tier, Tier::High);
    assert_eq!(result.routing.model, "gpt-4o");
    assert_eq!(result.cost_comparison.savings_percent, 0.0);
    assert!(result.routing.reasoning_chain[3]
        .description
        .contains("baseline"));
}

#[tokio::test]
async fn test_repeat_prompt_is_served_from_cache() {
    let worker = Arc::new(EchoWorker::new());
    let gateway = gateway_with(worker.clone());

    let first = route(&gateway, "What is 2+2?", ClassifierMode::RuleBased).await;
    let hits_before = gateway.cache_stats().hits;
    let second = route(&gateway, "  what is 2+2?  ", ClassifierMode::RuleBased).await;

    assert!(second.served_from_cache);
    assert_eq!(gateway.cache_stats().hits, hits_before + 1);
    assert_eq!(worker.calls(), 1);

    let mut unflagged = second.clone();
    unflagged.served_from_cache = false;
    assert_eq!(unflagged, first);

    // Only the miss is logged.
    assert_eq!(gateway.logs(10, 0).len(), 1);
}

#[tokio::test]
async fn test_modes_do_not_share_cache_entries() {
    let worker = Arc::new(EchoWorker::new());
    let gateway = gateway_with(worker.clone());

    route(&gateway, "What is 2+2?", ClassifierMode::RuleBased).await;
    let llm = route(&gateway, "What is 2+2?", ClassifierMode::LlmBased).await;

    assert!(!llm.served_from_cache);
    assert_eq!(gateway.cache_stats().size, 2);
}

#[tokio::test]
async fn test_inflected_keywords_do_not_escalate_routing() {
    let gateway = gateway_with(Arc::new(EchoWorker::new()));

    let result = route(
        &gateway,
        "Explain the reasoning behind this decision",
        ClassifierMode::RuleBased,
    )
    .await;
    assert_eq!(result.classification.task_type(), TaskType::General);
    assert_eq!(result.routing.tier, Tier::Medium);
    assert_eq!(result.routing.model, "gpt-4o-mini");

    let result = route(&gateway, "Is this logical?", ClassifierMode::RuleBased).await;
    assert_eq!(result.classification.task_type(), TaskType::SimpleQa);
    assert_eq!(result.routing.model, "gpt-4o-mini");
}

#[tokio::test]
async fn test_generation_failure_is_surfaced_without_side_effects() {
    let gateway = gateway_with(Arc::new(EchoWorker::failing("upstream 503")));
    let err = gateway
        .handle_route("Write a haiku about autumn", ClassifierMode::RuleBased)
        .await
        .err()
        .unwrap_or_else(|| std::panic::panic_any("test: expected failure"));

    assert!(matches!(err, GatewayError::Generation(_)));
    assert!(err.to_string().contains("upstream 503"));
    assert_eq!(gateway.cache_stats().size, 0);
    assert!(gateway.logs(10, 0).is_empty());
    assert_eq!(gateway.stats().total_requests, 0);
}

#[tokio::test]
async fn test_llm_mode_with_unparseable_reply_falls_back() {
    // The echo worker answers the classifier call with prose, not JSON.
    let gateway = gateway_with(Arc::new(EchoWorker::new()));
    let result = route(
        &gateway,
        "Solve the integral of x^2 * e^x dx step by step",
        ClassifierMode::LlmBased,
    )
    .await;

    assert_eq!(result.classification.classifier_mode(), ClassifierMode::LlmBased);
    assert_eq!(result.classification.task_type(), TaskType::General);
    assert!(result.classification.confidence().abs() < f64::EPSILON);
    assert_eq!(result.routing.tier, Tier::High);
    assert_eq!(result.routing.model, "claude-3.5-sonnet");
}

#[tokio::test]
async fn test_llm_mode_uses_model_verdict() {
    let worker = Arc::new(EchoWorker::new().with_reply(
        r#"{"complexity_score": 8, "task_type": "analysis", "reasoning": "Nuanced.", "confidence": 0.9}"#,
    ));
    let gateway = gateway_with(worker);
    let result = route(&gateway, "Assess this essay", ClassifierMode::LlmBased).await;

    assert_eq!(result.classification.score(), 8);
    assert_eq!(result.classification.task_type(), TaskType::Analysis);
    assert_eq!(result.routing.model, "claude-3.5-sonnet");
}

#[tokio::test]
async fn test_route_raw_rejects_invalid_input_before_pipeline() {
    let worker = Arc::new(EchoWorker::new());
    let gateway = gateway_with(worker.clone());

    assert!(matches!(
        gateway.route_raw("   ", None).await,
        Err(GatewayError::Validation(_))
    ));
    assert!(matches!(
        gateway.route_raw("hello", Some("neural")).await,
        Err(GatewayError::Validation(_))
    ));
    assert_eq!(worker.calls(), 0);
    assert_eq!(gateway.cache_stats().misses, 0);
}

#[tokio::test]
async fn test_stats_and_logs_accumulate() {
    let gateway = gateway_with(Arc::new(EchoWorker::new()));
    route(&gateway, "What is 2+2?", ClassifierMode::RuleBased).await;
    route(
        &gateway,
        "Solve the integral of x^2 * e^x dx step by step",
        ClassifierMode::RuleBased,
    )
    .await;
    route(&gateway, "Who wrote Hamlet?", ClassifierMode::RuleBased).await;

    let stats = gateway.stats();
    assert_eq!(stats.total_requests, 3);
    assert!(stats.total_savings >= 0.0);
    assert!(stats.savings_percent <= 100.0);
    let models: Vec<&str> = stats.model_usage.iter().map(|u| u.model.as_str()).collect();
    assert_eq!(models, vec!["gpt-4o-mini", "gpt-4o"]);

    let logs = gateway.logs(2, 0);
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].prompt_snippet, "Who wrote Hamlet?");
    assert_eq!(gateway.logs(10, 2)[0].prompt_snippet, "What is 2+2?");
}

#[tokio::test]
async fn test_clear_cache_forces_regeneration() {
    let worker = Arc::new(EchoWorker::new());
    let gateway = gateway_with(worker.clone());
    route(&gateway, "What is 2+2?", ClassifierMode::RuleBased).await;
    gateway.clear_cache();
    let again = route(&gateway, "What is 2+2?", ClassifierMode::RuleBased).await;

    assert!(!again.served_from_cache);
    assert_eq!(worker.calls(), 2);
    assert_eq!(gateway.health().total_requests_logged, 2);
}

#[tokio::test]
async fn test_expired_entry_regenerates() {
    let worker = Arc::new(EchoWorker::new());
    let gateway = Gateway::new(
        ModelRouter::default(),
        worker.clone(),
        ResponseCache::new(10, Duration::from_millis(30)),
    );
    route(&gateway, "What is 2+2?", ClassifierMode::RuleBased).await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    let again = route(&gateway, "What is 2+2?", ClassifierMode::RuleBased).await;

    assert!(!again.served_from_cache);
    assert_eq!(worker.calls(), 2);
}

#[tokio::test]
async fn test_concurrent_requests_share_cache_and_log() {
    let gateway = Arc::new(gateway_with(Arc::new(EchoWorker::new().with_delay(5))));
    let prompts = [
        "What is 2+2?",
        "Write a poem about the sea",
        "Translate hello into French",
        "Explain how a compiler works",
    ];

    let mut handles = Vec::new();
    for i in 0..16 {
        let gateway = Arc::clone(&gateway);
        let prompt = prompts[i % prompts.len()];
        handles.push(tokio::spawn(async move {
            gateway.handle_route(prompt, ClassifierMode::RuleBased).await
        }));
    }
    for handle in handles {
        let outcome = handle
            .await
            .unwrap_or_else(|e| std::panic::panic_any(format!("test: join failed: {e}")));
        assert!(outcome.is_ok());
    }

    let cache = gateway.cache_stats();
    assert_eq!(cache.size, prompts.len());
    assert_eq!(cache.hits + cache.misses, 16);
    assert_eq!(gateway.logs(100, 0).len() as u64, cache.misses);
}

#[tokio::test]
async fn test_gateway_from_config_applies_cache_and_classifier() {
    let config = load_from_str(
        r#"
[cache]
capacity = 1
ttl_secs = 60

[classifier]
llm_model = "gpt-4o"
"#,
        "inline.toml",
    )
    .unwrap_or_else(|e| std::panic::panic_any(format!("test: config: {e}")));

    let gateway = Gateway::from_config(&config, Arc::new(EchoWorker::new()))
        .unwrap_or_else(|e| std::panic::panic_any(format!("test: gateway: {e}")));
    route(&gateway, "What is 2+2?", ClassifierMode::RuleBased).await;
    route(&gateway, "Who wrote Hamlet?", ClassifierMode::RuleBased).await;

    let stats = gateway.cache_stats();
    assert_eq!(stats.capacity, 1);
    assert_eq!(stats.size, 1);
    assert_eq!(stats.ttl_secs, 60);
    assert_eq!(gateway.list_models().len(), 3);
}
