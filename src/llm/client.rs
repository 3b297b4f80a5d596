/// Groq chat-completions client implementation.
///
/// This module provides `GroqClient` for making synchronous HTTP requests to an
/// OpenAI-compatible chat-completions endpoint, along with error types and the
/// builder used to configure it.
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Model used when neither the builder nor `GROQ_MODEL` names one.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Endpoint root used when neither the builder nor `GROQ_BASE_URL` names one.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Errors that can occur when talking to the model provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No credential was configured
    #[error("Missing API key: set GROQ_API_KEY or pass one to the client builder")]
    MissingApiKey,

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code and the provider's explanation, if any
    #[error("HTTP error: status {status}{}", format_provider_message(.message))]
    Http { status: u16, message: Option<String> },

    /// Provider answered successfully but without a usable completion
    #[error("Provider API error: {message}")]
    Api { message: String },
}

fn format_provider_message(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(" ({m})"),
        None => String::new(),
    }
}

impl LlmError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            LlmError::Timeout(error)
        } else {
            LlmError::Network(error)
        }
    }
}

/// Longest wait between two attempts, however many retries are configured.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Bounded exponential backoff for transient provider failures.
///
/// The default policy performs no retries, so a failed call fails the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made after the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every further retry, up to
    /// [`MAX_RETRY_DELAY`]
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy retrying `max_retries` times with 1s, 2s, 4s, ... delays,
    /// capped at 30s.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry))
            .min(MAX_RETRY_DELAY)
    }
}

/// Builder for constructing `GroqClient` instances.
///
/// # Examples
///
/// ```
/// use postags::llm::GroqClientBuilder;
///
/// let client = GroqClientBuilder::new()
///     .api_key("gsk_example")
///     .model("llama-3.3-70b-versatile")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.model(), "llama-3.3-70b-versatile");
/// ```
#[derive(Default)]
pub struct GroqClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
    temperature: Option<f32>,
    retry: RetryPolicy,
}

impl GroqClientBuilder {
    /// Creates a new `GroqClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the provider credential.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the endpoint root (e.g., "https://api.groq.com/openai/v1").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model identifier (e.g., "llama-3.3-70b-versatile").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Bounds the total duration of each request. Unset means no limit.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the sampling temperature sent with every request.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Enables bounded retry of transient failures.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// Replaces the whole retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Builds the `GroqClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// Values not set on the builder fall back to `GROQ_API_KEY`,
    /// `GROQ_MODEL` and `GROQ_BASE_URL`. Model and URL then fall back to
    /// [`DEFAULT_MODEL`] and [`DEFAULT_BASE_URL`]; a missing credential is an error.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` if no credential is available and
    /// `LlmError::InvalidUrl` if the base URL does not parse.
    pub fn build(self) -> Result<GroqClient, LlmError> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let base_url = self
            .base_url
            .or_else(|| std::env::var("GROQ_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        let model = self
            .model
            .or_else(|| std::env::var("GROQ_MODEL").ok())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        reqwest::Url::parse(&base_url)
            .map_err(|e| LlmError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(LlmError::Network)?;

        Ok(GroqClient {
            client,
            api_key,
            base_url,
            model,
            temperature: self.temperature,
            retry: self.retry,
        })
    }
}

/// Synchronous client for a chat-completions provider.
///
/// Construct it once with `GroqClientBuilder` and share it by reference; its
/// configuration never changes after construction.
pub struct GroqClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    retry: RetryPolicy,
}

impl fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("retry", &self.retry)
            .finish()
    }
}

/// A text-completion capability: prompt in, completion out.
///
/// This trait enables substituting a test double for the real provider.
pub trait CompletionClient: Send + Sync {
    /// Sends `prompt` to the model and returns the completion text.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` if the provider cannot be reached, rejects the
    /// request, or answers without a completion.
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

impl GroqClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model identifier configured for this client.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the retry policy configured for this client.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Lists model ids the credential can use, sorted alphabetically.
    ///
    /// Fetches the `/models` endpoint.
    pub fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(LlmError::from_reqwest)?;

        let json = read_json_body(response)?;

        let mut models: Vec<String> = json
            .get("data")
            .and_then(|d| d.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|model| model.get("id").and_then(|id| id.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        models.sort();
        Ok(models)
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        if let Some(temperature) = self.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        body
    }

    fn complete_once(&self, url: &str, body: &serde_json::Value) -> Result<String, LlmError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(LlmError::from_reqwest)?;

        let json = read_json_body(response)?;
        extract_completion(&json)
    }
}

impl CompletionClient for GroqClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(prompt);

        let start = Instant::now();
        let completion = retry_with_backoff(self.retry, || self.complete_once(&url, &body))?;

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            model = %self.model,
            prompt_bytes = prompt.len(),
            response_bytes = completion.len(),
            "completion received"
        );

        Ok(completion)
    }
}

/// Turns a response into JSON, mapping non-success statuses to `LlmError::Http`.
fn read_json_body(response: reqwest::blocking::Response) -> Result<serde_json::Value, LlmError> {
    let status = response.status();
    if !status.is_success() {
        // The body is only used to explain the failure
        let message = response
            .text()
            .ok()
            .and_then(|text| provider_error_message(&text));
        return Err(LlmError::Http {
            status: status.as_u16(),
            message,
        });
    }

    response.json().map_err(LlmError::from_reqwest)
}

/// Pulls `error.message` out of an OpenAI-style error body.
fn provider_error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json.get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Extracts `choices[0].message.content` from a chat-completions response.
fn extract_completion(json: &serde_json::Value) -> Result<String, LlmError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| LlmError::Api {
            message: "Missing 'choices[0].message.content' in API response".to_string(),
        })
}

/// Retries an operation with exponential backoff.
///
/// The operation runs once, then up to `policy.max_retries` more times while
/// it keeps failing with a transient error (network, timeout, HTTP 429 or 5xx).
/// Non-transient errors are returned immediately.
///
/// # Returns
///
/// Returns the result of the operation if it succeeds, or the last error if all retries fail.
pub fn retry_with_backoff<F, T>(policy: RetryPolicy, mut f: F) -> Result<T, LlmError>
where
    F: FnMut() -> Result<T, LlmError>,
{
    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) => {
            if !should_retry(&e) {
                return Err(e);
            }
            e
        }
    };

    for retry in 0..policy.max_retries {
        let delay = policy.delay_for(retry);
        tracing::warn!(
            attempt = retry + 2,
            delay_ms = delay.as_millis() as u64,
            error = %last_error,
            "retrying model call"
        );
        thread::sleep(delay);

        match f() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !should_retry(&e) {
                    return Err(e);
                }
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// Determines if an error is transient.
fn should_retry(error: &LlmError) -> bool {
    match error {
        LlmError::Network(_) => true,
        LlmError::Timeout(_) => true,
        LlmError::Http { status, .. } => *status == 429 || (500..600).contains(status),
        LlmError::MissingApiKey => false,
        LlmError::InvalidUrl(_) => false,
        LlmError::Api { .. } => false,
    }
}
