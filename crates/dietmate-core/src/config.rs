//! DietMate configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietMateConfig {
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

fn default_api_key() -> String { String::new() }
fn default_provider() -> String { "gemini".into() }
fn default_model() -> String { "gemini-1.5-flash".into() }
fn default_temperature() -> f32 { 0.9 }
fn default_max_tokens() -> u32 { 1024 }

impl Default for DietMateConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            knowledge: KnowledgeConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl DietMateConfig {
    /// Load config from the default path (~/.dietmate/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::DietMateError::Config(format!("Failed to read config: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::DietMateError::Config(format!("Failed to parse config: {e}"))
        })?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::error::DietMateError::Config(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the DietMate home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dietmate")
    }
}

/// Knowledge base (RAG) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Root of the recipe corpus, one subdirectory per diet category.
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: String,
    /// Directory holding the persistent index. Non-emptiness of this
    /// directory is the sole "already ingested" signal.
    #[serde(default = "default_index_dir")]
    pub index_dir: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_corpus_dir() -> String { "./data/recipe_pdfs".into() }
fn default_index_dir() -> String { "./vector_db".into() }
fn default_chunk_size() -> usize { 1500 }
fn default_chunk_overlap() -> usize { 200 }
fn default_top_k() -> usize { 4 }

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            index_dir: default_index_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
        }
    }
}

/// Web search configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchConfig {
    /// Tavily API key. Falls back to the TAVILY_API_KEY env var; absent
    /// entirely, the web_search capability reports NotConfigured when used.
    #[serde(default)]
    pub api_key: String,
}

impl SearchConfig {
    /// Resolve the credential: config value first, then environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var("TAVILY_API_KEY").ok().filter(|k| !k.is_empty())
    }
}
