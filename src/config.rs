use crate::models::{DiversityInput, Ratios};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Completion service and logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Key-value file holding the API key, deployment and endpoint
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    /// Azure OpenAI API version
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Timeout for each completion request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Append-only application log
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from(".env")
}

fn default_api_version() -> String {
    "2023-12-01-preview".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_log_path() -> PathBuf {
    PathBuf::from("app.log")
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            log_path: default_log_path(),
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A single slate to evaluate
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlateConfig {
    /// Name shown in the output
    pub title: String,
    /// Actual percentages, one per criterion
    #[serde(flatten)]
    pub ratios: Ratios,
    /// Inline workflow text
    #[serde(default)]
    pub workflow: Option<String>,
    /// File containing the workflow text
    #[serde(default)]
    pub workflow_path: Option<PathBuf>,
}

impl SlateConfig {
    /// Resolve the workflow text into an evaluation request
    pub fn to_input(&self) -> Result<DiversityInput> {
        let workflow = match (&self.workflow, &self.workflow_path) {
            (Some(text), None) => text.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read workflow file: {}", path.display()))?,
            (Some(_), Some(_)) => bail!(
                "Slate {:?} sets both workflow and workflow_path",
                self.title
            ),
            (None, None) => bail!("Slate {:?} needs either workflow or workflow_path", self.title),
        };

        Ok(DiversityInput {
            ratios: self.ratios.clone(),
            workflow,
        })
    }
}

/// Root of a run file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    /// Optional local path to store results as JSON
    #[serde(default)]
    pub storage_path: Option<String>,
    /// Slates to evaluate, in order
    #[serde(default)]
    pub slates: Vec<SlateConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }
}
