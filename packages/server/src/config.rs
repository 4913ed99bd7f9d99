use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::domains::discovery::{SearchSettings, TaskSettings};
use crate::domains::suppliers::{EvaluationSettings, ExtractionSettings};
use crate::kernel::PipelineSettings;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub anthropic_api_key: String,
    pub anthropic_base_url: Option<String>,
    pub search: SearchSettings,
    pub extraction: ExtractionSettings,
    pub evaluation: EvaluationSettings,
    pub tasks: TaskSettings,
    /// Run the job runner inside the HTTP server process
    pub run_embedded_worker: bool,
    pub worker_poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .context("ANTHROPIC_API_KEY must be set")?;

        let extraction_model = env::var("EXTRACTION_MODEL")
            .unwrap_or_else(|_| ExtractionSettings::default().model);

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parse_or("PORT", 8080)?,
            anthropic_api_key,
            anthropic_base_url: env::var("ANTHROPIC_BASE_URL").ok(),
            search: SearchSettings {
                model: env::var("SEARCH_MODEL")
                    .unwrap_or_else(|_| SearchSettings::default().model),
                max_tokens: parse_or("SEARCH_MAX_TOKENS", SearchSettings::default().max_tokens)?,
                thinking_budget: parse_or(
                    "SEARCH_THINKING_BUDGET",
                    SearchSettings::default().thinking_budget,
                )?,
                max_web_searches: parse_optional("SEARCH_MAX_USES")?,
                ..SearchSettings::default()
            },
            evaluation: EvaluationSettings {
                model: env::var("EVALUATION_MODEL").unwrap_or_else(|_| extraction_model.clone()),
                ..EvaluationSettings::default()
            },
            extraction: ExtractionSettings {
                model: extraction_model,
                ..ExtractionSettings::default()
            },
            tasks: TaskSettings {
                max_retries: parse_or("TASK_MAX_RETRIES", TaskSettings::default().max_retries)?,
                retry_backoff: Duration::from_secs(parse_or(
                    "TASK_RETRY_BACKOFF_SECS",
                    TaskSettings::default().retry_backoff.as_secs(),
                )?),
                evaluate_suppliers: parse_or("EVALUATE_SUPPLIERS", false)?,
            },
            run_embedded_worker: parse_or("RUN_EMBEDDED_WORKER", true)?,
            worker_poll_interval: Duration::from_millis(parse_or("WORKER_POLL_INTERVAL_MS", 1000)?),
        })
    }

    pub fn pipeline(&self) -> PipelineSettings {
        PipelineSettings {
            search: self.search.clone(),
            extraction: self.extraction.clone(),
            evaluation: self.evaluation.clone(),
            tasks: self.tasks.clone(),
        }
    }
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_optional(name)?.unwrap_or(default))
}

fn parse_optional<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a valid {}", name, std::any::type_name::<T>())),
        _ => Ok(None),
    }
}
