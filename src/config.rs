//! Configuration for taskdeck.
//!
//! Settings are layered file → environment → CLI. The file is
//! `taskdeck.toml` in the project directory, falling back to
//! `<config_dir>/taskdeck/taskdeck.toml`.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000"
//! token = "..."
//!
//! [review]
//! tick_min_ms = 350
//! tick_jitter_ms = 120
//! max_step = 3
//! ceiling = 92
//! settle_ms = 500
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::review::{ReviewTimings, SimulatorConfig};

pub const CONFIG_FILE_NAME: &str = "taskdeck.toml";
pub const API_BASE_ENV: &str = "TASKDECK_API_BASE";
pub const TOKEN_ENV: &str = "TASKDECK_TOKEN";

/// Connection settings for the tracker API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with admin requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
        }
    }
}

/// Timing of the simulated review progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSection {
    #[serde(default = "default_tick_min_ms")]
    pub tick_min_ms: u64,
    #[serde(default = "default_tick_jitter_ms")]
    pub tick_jitter_ms: u64,
    #[serde(default = "default_max_step")]
    pub max_step: u8,
    /// Simulated progress never passes this value; must stay below 100.
    #[serde(default = "default_ceiling")]
    pub ceiling: u8,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_tick_min_ms() -> u64 {
    350
}

fn default_tick_jitter_ms() -> u64 {
    120
}

fn default_max_step() -> u8 {
    3
}

fn default_ceiling() -> u8 {
    92
}

fn default_settle_ms() -> u64 {
    500
}

impl Default for ReviewSection {
    fn default() -> Self {
        Self {
            tick_min_ms: default_tick_min_ms(),
            tick_jitter_ms: default_tick_jitter_ms(),
            max_step: default_max_step(),
            ceiling: default_ceiling(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl ReviewSection {
    /// Orchestrator timings; out-of-range values are clamped.
    pub fn timings(&self) -> ReviewTimings {
        ReviewTimings {
            simulator: SimulatorConfig {
                tick_min: Duration::from_millis(self.tick_min_ms),
                tick_jitter: Duration::from_millis(self.tick_jitter_ms),
                max_step: self.max_step,
                ceiling: self.ceiling,
            }
            .sanitized(),
            settle: Duration::from_millis(self.settle_ms),
        }
    }
}

/// Contents of `taskdeck.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub review: ReviewSection,
}

impl DeckToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse taskdeck.toml")
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize taskdeck.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            warnings.push("api.base_url is empty".to_string());
        } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            warnings.push(format!(
                "api.base_url '{}' should start with http:// or https://",
                base_url
            ));
        }

        if self.review.ceiling >= 100 {
            warnings.push(format!(
                "review.ceiling {} must be below 100; 99 will be used",
                self.review.ceiling
            ));
        }
        if self.review.max_step == 0 {
            warnings.push("review.max_step must be at least 1; 1 will be used".to_string());
        }
        if self.review.tick_min_ms == 0 {
            warnings.push("review.tick_min_ms is 0; progress will advance very fast".to_string());
        }

        warnings
    }
}

/// Locate the config file: project directory first, then the user config dir.
pub fn find_config_file(project_dir: &Path) -> Option<PathBuf> {
    let local = project_dir.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    let global = dirs::config_dir()?.join("taskdeck").join(CONFIG_FILE_NAME);
    global.exists().then_some(global)
}

/// Runtime configuration: the file merged with environment and CLI overrides.
#[derive(Debug, Clone)]
pub struct DeckConfig {
    /// Path of the file the settings came from, if any
    pub config_path: Option<PathBuf>,
    pub toml: DeckToml,
    pub cli_api_base: Option<String>,
    pub cli_token: Option<String>,
}

impl DeckConfig {
    /// Load configuration for a project directory.
    pub fn new(project_dir: &Path) -> Result<Self> {
        let config_path = find_config_file(project_dir);
        let toml = match &config_path {
            Some(path) => DeckToml::load(path)?,
            None => DeckToml::default(),
        };

        Ok(Self {
            config_path,
            toml,
            cli_api_base: None,
            cli_token: None,
        })
    }

    /// Create DeckConfig with CLI overrides.
    pub fn with_cli_args(
        project_dir: &Path,
        api_base: Option<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.cli_api_base = api_base;
        config.cli_token = token;
        Ok(config)
    }

    /// API base URL (CLI → env → file), without a trailing slash.
    pub fn api_base(&self) -> String {
        let base = self
            .cli_api_base
            .clone()
            .or_else(|| non_empty_env(API_BASE_ENV))
            .unwrap_or_else(|| self.toml.api.base_url.clone());
        base.trim_end_matches('/').to_string()
    }

    /// Bearer token (CLI → env → file).
    pub fn token(&self) -> Option<String> {
        self.cli_token
            .clone()
            .or_else(|| non_empty_env(TOKEN_ENV))
            .or_else(|| self.toml.api.token.clone())
            .filter(|t| !t.is_empty())
    }

    pub fn timings(&self) -> ReviewTimings {
        self.toml.review.timings()
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
