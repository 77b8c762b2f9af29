use etl_ingest::IngestError;
use etl_model::{ErrorKind, PipelineStage, RunFailure};
use etl_output::OutputError;
use etl_persist::PersistError;
use etl_registry::RegistryError;
use etl_report::ReportError;

/// A stage failure for one customer. Never escapes the customer's run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} during {stage}: {message}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub kind: ErrorKind,
    pub message: String,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn config(error: &RegistryError) -> Self {
        Self::new(PipelineStage::Pending, ErrorKind::ConfigError, error.to_string())
    }

    pub(crate) fn export_options(error: &OutputError) -> Self {
        Self::new(PipelineStage::Pending, ErrorKind::ConfigError, error.to_string())
    }

    pub(crate) fn ingest(error: &IngestError) -> Self {
        let kind = match error {
            IngestError::NotFound { .. } | IngestError::InvalidContainer { .. } => {
                ErrorKind::NotFound
            }
            IngestError::UnknownEncoding { .. } => ErrorKind::ConfigError,
            IngestError::Decode { .. } | IngestError::Csv { .. } | IngestError::Io { .. } => {
                ErrorKind::DecodeError
            }
        };
        Self::new(PipelineStage::Fetching, kind, error.to_string())
    }

    pub(crate) fn persist(error: &PersistError) -> Self {
        Self::new(
            PipelineStage::Persisting,
            ErrorKind::PersistError,
            error.to_string(),
        )
    }

    pub(crate) fn build(error: &OutputError) -> Self {
        Self::new(PipelineStage::Building, ErrorKind::UploadError, error.to_string())
    }

    pub(crate) fn report(error: &ReportError) -> Self {
        Self::new(PipelineStage::Building, ErrorKind::UploadError, error.to_string())
    }

    pub(crate) fn upload(error: &OutputError) -> Self {
        Self::new(PipelineStage::Uploading, ErrorKind::UploadError, error.to_string())
    }
}

impl From<PipelineError> for RunFailure {
    fn from(error: PipelineError) -> Self {
        RunFailure {
            stage: error.stage,
            kind: error.kind,
            message: error.message,
        }
    }
}

/// Failure of a whole invocation, before any customer was dispatched.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] RegistryError),

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
