//! Pipeline orchestration: per-customer stage machine, worker pool and the
//! manual-run entry point.

pub mod error;
pub mod manual;
pub mod orchestrator;
pub mod pipeline;
pub mod settings;
mod stage;

pub use error::{OrchestratorError, PipelineError};
pub use manual::{
    EntryResponse, INVALID_NAME, ManualRunEntry, ManualRunResponse, clean_names, manual_run,
    manual_run_at, parse_names,
};
pub use orchestrator::{Orchestrator, SelectedRun};
pub use pipeline::run_customer;
pub use settings::{Collaborators, DEFAULT_FILE_PREFIX, PipelineSettings};
