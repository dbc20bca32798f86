use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Locations of the two corpora and the output directory.
///
/// Each corpus directory holds the JSON files produced by the preprocessing
/// step: `articles.json`, `provisions.json`, `paragraphs.json`, `preamble.json`.
#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Draft legislation (the source side of every mapping task).
    pub draft_dir: PathBuf,
    /// Current law (the target side).
    pub law_dir: PathBuf,
    /// Directory where `{task}.json` mapping files are written.
    pub output_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    /// Minimum similarity for a target unit to be retained outright.
    /// Below it, the fallback-to-best policy applies.
    #[serde(default = "default_unit_threshold")]
    pub unit_threshold: f32,
    /// Minimum similarity for a paragraph pairing. No fallback at this
    /// level: paragraphs below it simply contribute nothing.
    #[serde(default = "default_paragraph_threshold")]
    pub paragraph_threshold: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            unit_threshold: default_unit_threshold(),
            paragraph_threshold: default_paragraph_threshold(),
        }
    }
}

fn default_unit_threshold() -> f32 {
    0.7
}
fn default_paragraph_threshold() -> f32 {
    0.6
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `"openai"`, `"local"` (OpenAI-compatible endpoint), or `"disabled"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the `"local"` provider, e.g. `http://localhost:8080/v1`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            base_url: None,
            batch_size: 100,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    100
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate matching thresholds
    if !(0.0..=1.0).contains(&config.matching.unit_threshold) {
        anyhow::bail!("matching.unit_threshold must be in [0.0, 1.0]");
    }
    if !(0.0..=1.0).contains(&config.matching.paragraph_threshold) {
        anyhow::bail!("matching.paragraph_threshold must be in [0.0, 1.0]");
    }

    // Validate embedding
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "local" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or local.",
            other
        ),
    }

    if config.embedding.provider == "local" && config.embedding.base_url.is_none() {
        anyhow::bail!("embedding.base_url must be set when provider is 'local'");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_applied() {
        let f = write_config(
            r#"
[corpus]
draft_dir = "jsons/draft/law"
law_dir = "jsons/current-law/law"
output_dir = "mappings"
"#,
        );
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.matching.unit_threshold, 0.7);
        assert_eq!(cfg.matching.paragraph_threshold, 0.6);
        assert_eq!(cfg.embedding.provider, "disabled");
        assert_eq!(cfg.embedding.batch_size, 100);
    }

    #[test]
    fn enabled_provider_requires_model_and_dims() {
        let f = write_config(
            r#"
[corpus]
draft_dir = "a"
law_dir = "b"
output_dir = "c"

[embedding]
provider = "openai"
"#,
        );
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn local_provider_requires_base_url() {
        let f = write_config(
            r#"
[corpus]
draft_dir = "a"
law_dir = "b"
output_dir = "c"

[embedding]
provider = "local"
model = "nomic-embed-text"
dims = 768
"#,
        );
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let f = write_config(
            r#"
[corpus]
draft_dir = "a"
law_dir = "b"
output_dir = "c"

[matching]
unit_threshold = 1.5
"#,
        );
        assert!(load_config(f.path()).is_err());
    }
}
