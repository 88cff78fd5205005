//! Generation backends.
//!
//! Provides the [`ModelWorker`] trait and its implementations:
//! - [`EchoWorker`]: deterministic offline backend for tests and demos
//! - [`OpenAiWorker`]: OpenAI chat completions API
//! - [`AnthropicWorker`]: Anthropic messages API
//! - [`WorkerPool`]: dispatches to one of the above by the model's provider
//!
//! Every worker reports input and output token counts separately so cost can
//! be computed with split rates. Timeouts are per worker; there is no retry.
//!
//! ## Environment Variables
//!
//! - `OPENAI_API_KEY`: Required for [`OpenAiWorker::new`]
//! - `ANTHROPIC_API_KEY`: Required for [`AnthropicWorker::new`]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::routing::{ModelDescriptor, Provider};
use crate::GatewayError;

/// One generation call.
///
/// `max_tokens` and `temperature` override the worker's defaults when set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationRequest {
    /// Optional system instruction.
    pub system: Option<String>,
    /// User prompt.
    pub prompt: String,
    /// Per-call output cap.
    pub max_tokens: Option<u32>,
    /// Per-call sampling temperature.
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    /// A plain user prompt with worker defaults.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Attach a system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Override the output cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Override the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    /// Generated text.
    pub text: String,
    /// Prompt tokens reported by the backend.
    pub input_tokens: u64,
    /// Completion tokens reported by the backend.
    pub output_tokens: u64,
    /// Wall-clock time of the backend call.
    pub latency_ms: u64,
}

impl Generation {
    /// `input_tokens + output_tokens`.
    pub fn tokens_used(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Trait for generation backends.
///
/// Implementations must be thread-safe (Send + Sync) for use across tasks.
/// The trait is object-safe to allow dynamic dispatch via `Arc<dyn ModelWorker>`.
#[async_trait]
pub trait ModelWorker: Send + Sync {
    /// Generate a completion for `request` with `model`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Generation`] on transport failure, a non-success
    /// status, or an unparseable body.
    async fn generate(
        &self,
        request: &GenerationRequest,
        model: &ModelDescriptor,
    ) -> Result<Generation, GatewayError>;
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn word_count(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

// ============================================================================
// Echo Worker (Testing)
// ============================================================================

/// Deterministic offline worker.
///
/// Replies with `"[<model>] <prompt>"`; token counts are whitespace word
/// counts. Can be configured to fail every call, and counts calls so tests
/// can assert that a cache hit skipped generation.
#[derive(Debug, Default)]
pub struct EchoWorker {
    delay_ms: u64,
    failure: Option<String>,
    reply: Option<String>,
    calls: AtomicU64,
}

impl EchoWorker {
    /// Create an echo worker with no delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate backend latency.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Always reply with `reply` instead of echoing.
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Some(reply.into());
        self
    }

    /// A worker whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Number of `generate` calls so far, failed ones included.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ModelWorker for EchoWorker {
    async fn generate(
        &self,
        request: &GenerationRequest,
        model: &ModelDescriptor,
    ) -> Result<Generation, GatewayError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        if let Some(message) = &self.failure {
            return Err(GatewayError::Generation(format!(
                "echo backend for {}: {message}",
                model.name
            )));
        }

        let text = match &self.reply {
            Some(reply) => reply.clone(),
            None => format!("[{}] {}", model.name, request.prompt),
        };
        let system_words = request.system.as_deref().map(word_count).unwrap_or(0);

        Ok(Generation {
            input_tokens: word_count(&request.prompt) + system_words,
            output_tokens: word_count(&text),
            text,
            latency_ms: elapsed_ms(start),
        })
    }
}

// ============================================================================
// OpenAI Worker
// ============================================================================

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// OpenAI chat completions worker.
///
/// Requires `OPENAI_API_KEY`.
///
/// ## Example
///
/// ```no_run
/// use prompt_gateway::OpenAiWorker;
/// use std::sync::Arc;
///
/// let worker = Arc::new(
///     OpenAiWorker::new()
///         .expect("OPENAI_API_KEY must be set")
///         .with_max_tokens(512)
///         .with_temperature(0.7),
/// );
/// ```
pub struct OpenAiWorker {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiWorker")
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAiWorker {
    /// Create a worker reading the key from `OPENAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConfigError`] if the variable is unset or empty.
    pub fn new() -> Result<Self, GatewayError> {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(GatewayError::ConfigError(
                "OPENAI_API_KEY environment variable not set".to_string(),
            ));
        }
        Ok(Self::with_api_key(api_key))
    }

    /// Create a worker with an explicit key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }

    /// Point at a different API root (tests, proxies). No trailing slash.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set default maximum tokens to generate
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set default temperature (0.0 - 2.0)
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ModelWorker for OpenAiWorker {
    async fn generate(
        &self,
        request: &GenerationRequest,
        model: &ModelDescriptor,
    ) -> Result<Generation, GatewayError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = OpenAiRequest {
            model: model.api_model_id(),
            messages,
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            temperature: request.temperature.unwrap_or(self.temperature),
        };

        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Generation(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Generation(format!(
                "OpenAI API error {status}: {error_text}"
            )));
        }

        let api_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Generation(format!("Failed to parse OpenAI response: {e}")))?;
        let latency_ms = elapsed_ms(start);

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Generation("No choices in OpenAI response".to_string()))?;
        let (input_tokens, output_tokens) = api_response
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(Generation {
            text: choice.message.content.unwrap_or_default(),
            input_tokens,
            output_tokens,
            latency_ms,
        })
    }
}

// ============================================================================
// Anthropic Worker
// ============================================================================

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Anthropic messages API worker.
///
/// Requires `ANTHROPIC_API_KEY`.
///
/// ## Example
///
/// ```no_run
/// use prompt_gateway::AnthropicWorker;
/// use std::time::Duration;
///
/// let worker = AnthropicWorker::new()
///     .expect("ANTHROPIC_API_KEY must be set")
///     .with_timeout(Duration::from_secs(90));
/// ```
pub struct AnthropicWorker {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl std::fmt::Debug for AnthropicWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicWorker")
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AnthropicWorker {
    /// Create a worker reading the key from `ANTHROPIC_API_KEY`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConfigError`] if the variable is unset or empty.
    pub fn new() -> Result<Self, GatewayError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(GatewayError::ConfigError(
                "ANTHROPIC_API_KEY environment variable not set".to_string(),
            ));
        }
        Ok(Self::with_api_key(api_key))
    }

    /// Create a worker with an explicit key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
            max_tokens: 1024,
            temperature: 1.0,
            timeout: Duration::from_secs(60),
        }
    }

    /// Point at a different API root (tests, proxies). No trailing slash.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set default maximum tokens to generate
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set default temperature (0.0 - 1.0)
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ModelWorker for AnthropicWorker {
    async fn generate(
        &self,
        request: &GenerationRequest,
        model: &ModelDescriptor,
    ) -> Result<Generation, GatewayError> {
        let body = AnthropicRequest {
            model: model.api_model_id(),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            temperature: request.temperature.unwrap_or(self.temperature),
            system: request.system.as_deref(),
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Generation(format!("Anthropic request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Generation(format!(
                "Anthropic API error {status}: {error_text}"
            )));
        }

        let api_response: AnthropicResponse = response.json().await.map_err(|e| {
            GatewayError::Generation(format!("Failed to parse Anthropic response: {e}"))
        })?;
        let latency_ms = elapsed_ms(start);

        let text = api_response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .unwrap_or_default();
        let (input_tokens, output_tokens) = api_response
            .usage
            .map(|u| (u.input_tokens, u.output_tokens))
            .unwrap_or((0, 0));

        Ok(Generation {
            text,
            input_tokens,
            output_tokens,
            latency_ms,
        })
    }
}

// ============================================================================
// Worker Pool
// ============================================================================

/// Dispatches each call to the worker registered for the model's provider.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use prompt_gateway::{EchoWorker, Provider, WorkerPool};
///
/// let pool = WorkerPool::new()
///     .with_worker(Provider::OpenAi, Arc::new(EchoWorker::new()))
///     .with_worker(Provider::Anthropic, Arc::new(EchoWorker::new()));
/// assert!(pool.has_worker(Provider::Anthropic));
/// ```
#[derive(Clone, Default)]
pub struct WorkerPool {
    workers: HashMap<Provider, Arc<dyn ModelWorker>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<&str> = self.workers.keys().map(Provider::as_str).collect();
        providers.sort_unstable();
        f.debug_struct("WorkerPool")
            .field("providers", &providers)
            .finish()
    }
}

impl WorkerPool {
    /// An empty pool. Every call fails until workers are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the worker for `provider`.
    pub fn with_worker(mut self, provider: Provider, worker: Arc<dyn ModelWorker>) -> Self {
        self.workers.insert(provider, worker);
        self
    }

    /// Build HTTP workers for every provider whose API key is present.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConfigError`] when neither key is set.
    pub fn from_env(timeout: Duration) -> Result<Self, GatewayError> {
        let mut pool = Self::new();
        match OpenAiWorker::new() {
            Ok(w) => pool = pool.with_worker(Provider::OpenAi, Arc::new(w.with_timeout(timeout))),
            Err(e) => tracing::warn!(error = %e, "OpenAI worker unavailable"),
        }
        match AnthropicWorker::new() {
            Ok(w) => {
                pool = pool.with_worker(Provider::Anthropic, Arc::new(w.with_timeout(timeout)))
            }
            Err(e) => tracing::warn!(error = %e, "Anthropic worker unavailable"),
        }
        if pool.workers.is_empty() {
            return Err(GatewayError::ConfigError(
                "no provider API key set (OPENAI_API_KEY or ANTHROPIC_API_KEY)".to_string(),
            ));
        }
        Ok(pool)
    }

    /// Whether a worker serves `provider`.
    pub fn has_worker(&self, provider: Provider) -> bool {
        self.workers.contains_key(&provider)
    }
}

#[async_trait]
impl ModelWorker for WorkerPool {
    async fn generate(
        &self,
        request: &GenerationRequest,
        model: &ModelDescriptor,
    ) -> Result<Generation, GatewayError> {
        let worker = self.workers.get(&model.provider).ok_or_else(|| {
            GatewayError::Generation(format!(
                "no worker registered for provider '{}' (model {})",
                model.provider, model.name
            ))
        })?;
        worker.generate(request, model).await
    }
}
