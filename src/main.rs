//! Demo binary for prompt-gateway
//!
//! Routes a handful of prompts through the gateway and prints each result
//! plus the aggregate statistics as JSON.
//!
//! ## Environment Variables
//!
//! - `GATEWAY_CONFIG=gateway.toml`: optional TOML configuration file
//! - `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`: real backends; without either
//!   the demo falls back to the offline echo worker
//! - `LOG_FORMAT=json`: structured JSON output (overrides the config file)
//! - `RUST_LOG=info`: log level filter

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use prompt_gateway::config::loader::load_from_file;
use prompt_gateway::{
    init_tracing, init_tracing_with, metrics, ClassifierMode, EchoWorker, Gateway, GatewayConfig,
    ModelWorker, WorkerPool,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::var("GATEWAY_CONFIG") {
        Ok(path) => load_from_file(Path::new(&path))?,
        Err(_) => GatewayConfig::default(),
    };

    let _ = if std::env::var("LOG_FORMAT").is_ok() {
        init_tracing()
    } else {
        init_tracing_with(config.observability.log_format)
    };

    metrics::init_metrics()?;

    info!("Starting prompt-gateway demo");

    let worker: Arc<dyn ModelWorker> =
        match WorkerPool::from_env(Duration::from_secs(config.worker.timeout_secs)) {
            Ok(pool) => Arc::new(pool),
            Err(e) => {
                warn!(error = %e, "falling back to echo worker");
                Arc::new(EchoWorker::new().with_delay(10))
            }
        };

    let gateway = Gateway::from_config(&config, worker)?;

    let demo_prompts = [
        ("What is 2+2?", ClassifierMode::RuleBased),
        (
            "Solve the integral of x^2 * e^x dx step by step",
            ClassifierMode::RuleBased,
        ),
        (
            "Write a short poem about the ocean at night",
            ClassifierMode::RuleBased,
        ),
        (
            "Compare the trade-offs between microservices and a monolith architecture",
            ClassifierMode::RuleBased,
        ),
        ("Translate 'good morning' into Spanish", ClassifierMode::RuleBased),
        ("What is 2+2?", ClassifierMode::RuleBased),
    ];

    info!(count = demo_prompts.len(), "Routing demo prompts");

    for (prompt, mode) in demo_prompts {
        match gateway.handle_route(prompt, mode).await {
            Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
            Err(e) => tracing::error!(error = %e, prompt, "request failed"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&gateway.stats())?);
    println!("{}", serde_json::to_string_pretty(&gateway.cache_stats())?);

    info!("Demo complete");
    Ok(())
}
