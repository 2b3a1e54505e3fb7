//! `supportdesk.toml` loading.
//!
//! Every section has defaults, so a missing file or an empty one yields a
//! working mock-provider setup.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use supportdesk_agent::ModelConfig;
use supportdesk_core::DocSet;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct SupportDeskConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Reference documentation, relative to the config file's directory.
    #[serde(default = "default_docs_path")]
    pub docs_path: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SupportDeskConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            docs_path: default_docs_path(),
            server: ServerConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_docs_path() -> PathBuf {
    PathBuf::from("docs.json")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3001
}

impl SupportDeskConfig {
    /// Read the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        Self::from_toml_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid config file '{}': {}", path.display(), e))
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `LLM_PROVIDER`, `LLM_API_KEY` and `PORT` on top of the file values.
    /// Blank values are ignored, so `KEY=` in `.env` keeps the file value.
    ///
    /// Takes the lookup as a closure so tests don't touch the process env.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.model.provider = provider;
        }
        if let Some(key) = lookup("LLM_API_KEY") {
            self.model.api_key = key;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PORT '{}': {}", port, e))?;
        }
        Ok(())
    }

    /// Location of the SQLite database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("support.db")
    }

    /// Load the documentation set. A missing file falls back to the built-in
    /// topics; an unreadable or malformed one is an error.
    pub fn load_docs(&self, config_dir: &Path) -> anyhow::Result<DocSet> {
        let path = config_dir.join(&self.docs_path);
        if !path.exists() {
            warn!(path = %path.display(), "Documentation file not found, using built-in topics");
            return Ok(DocSet::builtin());
        }
        let docs = DocSet::from_json_file(&path)?;
        info!(path = %path.display(), count = docs.len(), "Documentation loaded");
        Ok(docs)
    }
}
