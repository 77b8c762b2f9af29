//! Artifact storage.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use etl_model::{Artifact, ArtifactRef};
use sha2::Digest;

use crate::error::OutputError;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    hex::encode(digest)
}

/// Reference for `artifact` once stored in `container`.
pub fn artifact_ref(container: &str, artifact: &Artifact) -> ArtifactRef {
    ArtifactRef {
        container: container.to_string(),
        name: artifact.name.clone(),
        content_type: artifact.content_type.clone(),
        bytes: artifact.bytes.len() as u64,
        sha256: sha256_hex(&artifact.bytes),
    }
}

/// Destination for generated artifacts.
pub trait ArtifactStore: Send + Sync {
    /// Store one artifact in one write. A failed upload leaves no partial
    /// artifact behind.
    fn upload(&self, container: &str, artifact: &Artifact) -> Result<ArtifactRef, OutputError>;

    /// Store every artifact of one run, or none of them.
    fn upload_all(
        &self,
        container: &str,
        artifacts: &[Artifact],
    ) -> Result<Vec<ArtifactRef>, OutputError>;
}

/// Writes `<root>/<container>/<name>`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf, OutputError> {
        let valid = !container.trim().is_empty()
            && !container.contains(['/', '\\'])
            && container != "."
            && container != "..";
        if valid {
            Ok(self.root.join(container))
        } else {
            Err(OutputError::InvalidContainer {
                container: container.to_string(),
            })
        }
    }

    fn prepared_dir(&self, container: &str) -> Result<PathBuf, OutputError> {
        let dir = self.container_dir(container)?;
        fs::create_dir_all(&dir).map_err(|e| OutputError::Io {
            operation: "create directory",
            path: dir.clone(),
            source: e,
        })?;
        Ok(dir)
    }
}

/// A temp file written next to its final path, not yet renamed.
struct Staged {
    temp_path: PathBuf,
    path: PathBuf,
}

fn stage(dir: &Path, artifact: &Artifact) -> Result<Staged, OutputError> {
    let staged = Staged {
        temp_path: dir.join(format!(".{}.tmp", artifact.name)),
        path: dir.join(&artifact.name),
    };
    let write = || -> Result<(), OutputError> {
        let mut file = File::create(&staged.temp_path).map_err(|e| OutputError::Io {
            operation: "create",
            path: staged.temp_path.clone(),
            source: e,
        })?;
        file.write_all(&artifact.bytes).map_err(|e| OutputError::Io {
            operation: "write",
            path: staged.temp_path.clone(),
            source: e,
        })?;
        file.sync_all().map_err(|e| OutputError::Io {
            operation: "sync",
            path: staged.temp_path.clone(),
            source: e,
        })
    };
    if let Err(err) = write() {
        let _ = fs::remove_file(&staged.temp_path);
        return Err(err);
    }
    Ok(staged)
}

impl ArtifactStore for FsArtifactStore {
    fn upload(&self, container: &str, artifact: &Artifact) -> Result<ArtifactRef, OutputError> {
        let dir = self.prepared_dir(container)?;
        let entry = stage(&dir, artifact)?;
        if let Err(e) = fs::rename(&entry.temp_path, &entry.path) {
            let _ = fs::remove_file(&entry.temp_path);
            return Err(OutputError::Io {
                operation: "rename",
                path: entry.path,
                source: e,
            });
        }
        tracing::debug!(path = %entry.path.display(), bytes = artifact.len(), "stored artifact");
        Ok(artifact_ref(container, artifact))
    }

    fn upload_all(
        &self,
        container: &str,
        artifacts: &[Artifact],
    ) -> Result<Vec<ArtifactRef>, OutputError> {
        let dir = self.prepared_dir(container)?;
        let mut staged = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            match stage(&dir, artifact) {
                Ok(entry) => staged.push(entry),
                Err(err) => {
                    for entry in &staged {
                        let _ = fs::remove_file(&entry.temp_path);
                    }
                    return Err(err);
                }
            }
        }

        for (index, entry) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(&entry.temp_path, &entry.path) {
                for committed in &staged[..index] {
                    let _ = fs::remove_file(&committed.path);
                }
                for pending in &staged[index..] {
                    let _ = fs::remove_file(&pending.temp_path);
                }
                return Err(OutputError::Io {
                    operation: "rename",
                    path: entry.path.clone(),
                    source: e,
                });
            }
        }

        Ok(artifacts
            .iter()
            .zip(&staged)
            .map(|(artifact, entry)| {
                tracing::debug!(path = %entry.path.display(), bytes = artifact.len(), "stored artifact");
                artifact_ref(container, artifact)
            })
            .collect())
    }
}
