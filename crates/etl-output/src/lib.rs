//! Output artifacts: CSV/JSON export builders and artifact storage.

pub mod builder;
pub mod error;
mod format;
pub mod store;

pub use builder::{
    ExportOptions, TIMESTAMP_FORMAT, artifact_name, artifact_stem, build, build_csv, build_json,
    sanitize_component,
};
pub use error::OutputError;
pub use format::DEFAULT_DECIMALS;
pub use store::{ArtifactStore, FsArtifactStore, artifact_ref, sha256_hex};
