use crate::client::CompletionClient;
use crate::config::{Config, SlateConfig};
use crate::evaluation::Evaluator;
use crate::models::SlateReport;
use anyhow::{Context, Result};
use std::path::Path;

/// Main runner that evaluates every slate of a run file
pub struct Runner<C> {
    config: Config,
    evaluator: Evaluator<C>,
}

impl<C: CompletionClient> Runner<C> {
    /// Create a new runner with the given configuration
    pub fn new(config: Config, evaluator: Evaluator<C>) -> Self {
        Self { config, evaluator }
    }

    /// Evaluate all slates in order; the first failure stops the run
    pub async fn run_slates(&self) -> Result<Vec<SlateReport>> {
        let total = self.config.slates.len();
        let mut reports = Vec::with_capacity(total);

        for (index, slate) in self.config.slates.iter().enumerate() {
            tracing::info!(slate = %slate.title, "evaluating slate {}/{}", index + 1, total);
            let report = self
                .evaluate_slate(slate)
                .await
                .with_context(|| format!("Failed to evaluate slate: {}", slate.title))?;
            reports.push(report);
        }

        self.store_results_if_configured(&reports)?;
        Ok(reports)
    }

    async fn evaluate_slate(&self, slate: &SlateConfig) -> Result<SlateReport> {
        let input = slate.to_input()?;
        let values = self.evaluator.evaluate(&input).await?;

        Ok(SlateReport {
            title: slate.title.clone(),
            values,
        })
    }

    /// Store results if storage path is configured
    fn store_results_if_configured(&self, reports: &[SlateReport]) -> Result<()> {
        if let Some(storage_path) = &self.config.storage_path {
            store_results(reports, storage_path)?;
        }
        Ok(())
    }
}

/// Store results to a JSON file
fn store_results(reports: &[SlateReport], path: &str) -> Result<()> {
    let json_content =
        serde_json::to_string_pretty(reports).context("Failed to serialize results to JSON")?;

    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, json_content)
        .with_context(|| format!("Failed to write results to: {}", path))?;

    tracing::info!(path, "results stored");
    Ok(())
}
