//! Application configuration (`customer-etl.toml`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use etl_core::{Collaborators, DEFAULT_FILE_PREFIX, Orchestrator, PipelineSettings};
use etl_ingest::{FsSourceLocator, SourceOptions};
use etl_output::FsArtifactStore;
use etl_persist::{DEFAULT_PRIMARY_KEY, SqliteStore};
use etl_registry::FsConfigStore;
use etl_report::{DEFAULT_SAMPLE_LIMIT, EsrsColumns};
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "customer-etl.toml";

/// Customer exports carry one junk row under the header.
pub const DEFAULT_SKIP_ROWS: usize = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub source: SourceConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
    pub esrs: EsrsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Holds `main_config.json` and `customer_config/`.
    pub config_dir: PathBuf,
    pub source_root: PathBuf,
    pub artifact_root: PathBuf,
    pub database: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            source_root: PathBuf::from("data/source"),
            artifact_root: PathBuf::from("data/artifacts"),
            database: PathBuf::from("data/customers.sqlite"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub delimiter: String,
    pub encoding: String,
    pub skip_rows: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        let options = SourceOptions::default();
        Self {
            delimiter: char::from(options.delimiter).to_string(),
            encoding: options.encoding,
            skip_rows: DEFAULT_SKIP_ROWS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub workers: usize,
    pub sample_limit: usize,
    pub file_prefix: String,
    pub primary_key: String,
    pub busy_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Answer an unknown customer name with the bare `invalid_name` text
    /// instead of a JSON envelope.
    pub plain_text_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            plain_text_errors: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsrsConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub columns: EsrsColumns,
}

impl AppConfig {
    /// Read `path`, or `customer-etl.toml` if present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("parse config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded application config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.source_options()?;
        config.bind_addr()?;
        Ok(config)
    }

    pub fn source_options(&self) -> Result<SourceOptions> {
        let mut chars = self.source.delimiter.chars();
        let delimiter = match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii() => ch as u8,
            _ => bail!(
                "source.delimiter must be a single ASCII character, got {:?}",
                self.source.delimiter
            ),
        };
        Ok(SourceOptions {
            delimiter,
            encoding: self.source.encoding.clone(),
            skip_rows: self.source.skip_rows,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("invalid server.bind {:?}", self.server.bind))
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            workers: self.pipeline.workers.max(1),
            sample_limit: self.pipeline.sample_limit,
            file_prefix: self.pipeline.file_prefix.clone(),
            esrs: self.esrs.enabled.then(|| self.esrs.columns.clone()),
        }
    }

    pub fn config_store(&self) -> FsConfigStore {
        FsConfigStore::new(&self.paths.config_dir)
    }

    /// Open the filesystem and SQLite collaborators.
    pub fn collaborators(&self) -> Result<Collaborators> {
        let database = SqliteStore::open(
            &self.paths.database,
            Duration::from_millis(self.pipeline.busy_timeout_ms),
            self.pipeline.primary_key.clone(),
        )
        .with_context(|| format!("open database {}", self.paths.database.display()))?;
        Ok(Collaborators {
            config: Arc::new(self.config_store()),
            source: Arc::new(FsSourceLocator::new(
                &self.paths.source_root,
                self.source_options()?,
            )),
            database: Arc::new(database),
            artifacts: Arc::new(FsArtifactStore::new(&self.paths.artifact_root)),
        })
    }

    pub fn orchestrator(&self) -> Result<Orchestrator> {
        let orchestrator = Orchestrator::new(self.collaborators()?, self.pipeline_settings())
            .context("start orchestrator")?;
        Ok(orchestrator)
    }
}
