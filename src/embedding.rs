//! Embedding provider abstraction and implementations.
//!
//! Defines the [`EmbeddingProvider`] trait and concrete implementations:
//! - **[`DisabledProvider`]** — returns errors; used when embeddings are not configured.
//! - **[`HttpProvider`]** — calls an OpenAI-compatible embeddings endpoint
//!   (api.openai.com or a local server) with retry and backoff.
//!
//! [`embed_all`] is the entry point the pipeline uses: it batches requests,
//! substitutes blank inputs, and converts every provider failure into a
//! neutral fallback so a partial outage never aborts a run.
//!
//! # Retry Strategy
//!
//! The HTTP provider uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::EmbeddingConfig;

/// Trait for embedding providers.
///
/// The provider seam of the pipeline: tests supply a deterministic fake,
/// production uses [`HttpProvider`] against OpenAI or a local endpoint.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"nomic-embed-text"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `768`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

// ============ Disabled Provider ============

/// A no-op embedding provider that always returns errors.
///
/// Used when `embedding.provider = "disabled"`. A run against it degrades
/// to neutral vectors everywhere (uniform zero similarity) rather than
/// failing — useful for exercising the pipeline without a model server.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("Embedding provider is disabled")
    }
}

// ============ HTTP Provider ============

/// Embedding provider for OpenAI-compatible HTTP endpoints.
///
/// Posts `{model, input}` to `{base_url}/embeddings` and reads
/// `data[].embedding` from the response. Covers both the hosted OpenAI API
/// (`provider = "openai"`, requires `OPENAI_API_KEY`) and a local model
/// server (`provider = "local"`, no key).
pub struct HttpProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dims: usize,
    max_retries: u32,
}

impl HttpProvider {
    /// Create a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` or `dims` is not set, or if the
    /// `"openai"` provider is selected without `OPENAI_API_KEY` in the
    /// environment.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required"))?;

        let (base_url, api_key) = match config.provider.as_str() {
            "openai" => {
                let key = std::env::var("OPENAI_API_KEY")
                    .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
                ("https://api.openai.com/v1".to_string(), Some(key))
            }
            "local" => {
                let url = config
                    .base_url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("embedding.base_url required for local provider"))?;
                (url.trim_end_matches('/').to_string(), None)
            }
            other => bail!("Unknown embedding provider: {}", other),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
            dims,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&url).json(&body);
            if let Some(key) = &self.api_key {
                request = request.header("Authorization", format!("Bearer {}", key));
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_embeddings_response(&json);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("Embedding API error {}: {}", status, body_text));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Embedding API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Embedding failed after retries")))
    }
}

/// Parse an OpenAI-style embeddings response: `data[].embedding` in order.
fn parse_embeddings_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid embeddings response: missing data array"))?;

    let mut embeddings = Vec::with_capacity(data.len());

    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow::anyhow!("Invalid embeddings response: missing embedding"))?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        embeddings.push(vec);
    }

    Ok(embeddings)
}

/// Create the appropriate [`EmbeddingProvider`] based on configuration.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProvider)),
        "openai" | "local" => Ok(Box::new(HttpProvider::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

// ============ Batched embedding with neutral fallback ============

/// Embed a list of texts in bounded-size batches.
///
/// - An empty or all-blank input yields an empty result without calling
///   the provider.
/// - Blank texts are replaced with a single space before the request.
/// - A failed batch (provider error, or a response whose length does not
///   match the request) is replaced by neutral zero vectors of the
///   provider's dimensionality; later batches proceed unaffected.
///
/// The result is therefore either empty (nothing to embed) or exactly
/// `texts.len()` vectors aligned with the input. Never returns an error:
/// embedding failures degrade, they do not abort the run.
pub async fn embed_all(
    provider: &dyn EmbeddingProvider,
    batch_size: usize,
    texts: &[String],
) -> Vec<Vec<f32>> {
    if texts.is_empty() || texts.iter().all(|t| t.trim().is_empty()) {
        return Vec::new();
    }

    let prepared: Vec<String> = texts
        .iter()
        .map(|t| {
            if t.trim().is_empty() {
                " ".to_string()
            } else {
                t.clone()
            }
        })
        .collect();

    let batch_size = batch_size.max(1);
    let mut vectors = Vec::with_capacity(prepared.len());

    for batch in prepared.chunks(batch_size) {
        match provider.embed(batch).await {
            Ok(batch_vectors) if batch_vectors.len() == batch.len() => {
                vectors.extend(batch_vectors);
            }
            Ok(batch_vectors) => {
                eprintln!(
                    "Warning: embedding batch returned {} vectors for {} texts, using neutral fallback",
                    batch_vectors.len(),
                    batch.len()
                );
                vectors.extend(std::iter::repeat(vec![0.0; provider.dims()]).take(batch.len()));
            }
            Err(e) => {
                eprintln!("Warning: embedding batch failed: {}", e);
                vectors.extend(std::iter::repeat(vec![0.0; provider.dims()]).take(batch.len()));
            }
        }
    }

    vectors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake provider: each text embeds to `[len, 1.0]`. Optionally fails
    /// specific batch calls (by call index) to exercise fallback.
    struct FakeProvider {
        fail_calls: Vec<usize>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self {
                fail_calls: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_on(calls: Vec<usize>) -> Self {
            Self {
                fail_calls: calls,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FakeProvider {
        fn model_name(&self) -> &str {
            "fake"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_calls.contains(&call) {
                bail!("simulated batch failure");
            }
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0])
                .collect())
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn empty_input_short_circuits() {
        let provider = FakeProvider::new();
        assert!(embed_all(&provider, 10, &[]).await.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_blank_input_short_circuits() {
        let provider = FakeProvider::new();
        let result = embed_all(&provider, 10, &texts(&["", "   "])).await;
        assert!(result.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_texts_replaced_with_space() {
        let provider = FakeProvider::new();
        let result = embed_all(&provider, 10, &texts(&["hola", ""])).await;
        assert_eq!(result.len(), 2);
        // "" was sent as " " (length 1), not dropped
        assert_eq!(result[1], vec![1.0, 1.0]);
    }

    #[tokio::test]
    async fn batches_respect_batch_size() {
        let provider = FakeProvider::new();
        let input = texts(&["a", "bb", "ccc", "dddd", "eeeee"]);
        let result = embed_all(&provider, 2, &input).await;
        assert_eq!(result.len(), 5);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_batch_isolated_to_its_items() {
        let provider = FakeProvider::failing_on(vec![0]);
        let input = texts(&["a", "bb", "ccc", "dddd"]);
        let result = embed_all(&provider, 2, &input).await;
        assert_eq!(result.len(), 4);
        // First batch degraded to neutral vectors
        assert_eq!(result[0], vec![0.0, 0.0]);
        assert_eq!(result[1], vec![0.0, 0.0]);
        // Second batch unaffected
        assert_eq!(result[2], vec![3.0, 1.0]);
        assert_eq!(result[3], vec![4.0, 1.0]);
    }

    #[tokio::test]
    async fn disabled_provider_degrades_to_neutral() {
        let result = embed_all(&DisabledProvider, 10, &texts(&["hola"])).await;
        assert_eq!(result.len(), 1);
        assert!(result[0].is_empty()); // dims() == 0
    }

    #[test]
    fn parse_response_extracts_vectors_in_order() {
        let json = serde_json::json!({
            "data": [
                {"embedding": [0.1, 0.2], "index": 0},
                {"embedding": [0.3, 0.4], "index": 1}
            ]
        });
        let vectors = parse_embeddings_response(&json).unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn parse_response_rejects_missing_data() {
        let json = serde_json::json!({"error": "nope"});
        assert!(parse_embeddings_response(&json).is_err());
    }
}
