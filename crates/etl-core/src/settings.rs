use std::sync::Arc;

use etl_ingest::SourceLocator;
use etl_output::ArtifactStore;
use etl_persist::RelationalStore;
use etl_registry::ConfigStore;
use etl_report::{DEFAULT_SAMPLE_LIMIT, EsrsColumns};

pub const DEFAULT_FILE_PREFIX: &str = "tapahtumat";

/// Knobs shared by every customer of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Customers processed at once.
    pub workers: usize,
    /// Rejected rows listed in each report.
    pub sample_limit: usize,
    pub file_prefix: String,
    /// Waste columns for the ESRS section; `None` disables it.
    pub esrs: Option<EsrsColumns>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: 1,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            esrs: None,
        }
    }
}

/// External systems the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub config: Arc<dyn ConfigStore>,
    pub source: Arc<dyn SourceLocator>,
    pub database: Arc<dyn RelationalStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
}
