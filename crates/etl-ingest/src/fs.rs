//! Filesystem source locator: `<root>/<container>/*.csv`, newest file wins.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::delimited::parse_delimited;
use crate::encoding::{decode, lookup};
use crate::error::IngestError;
use crate::locator::{SourceFile, SourceLocator, SourceOptions};

pub const HISTORY_DIR: &str = "history";

#[derive(Debug, Clone)]
pub struct FsSourceLocator {
    root: PathBuf,
    options: SourceOptions,
}

impl FsSourceLocator {
    pub fn new(root: impl Into<PathBuf>, options: SourceOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf, IngestError> {
        let valid = !container.trim().is_empty()
            && !container.contains(['/', '\\'])
            && container != "."
            && container != "..";
        if !valid {
            return Err(IngestError::InvalidContainer {
                container: container.to_string(),
            });
        }
        Ok(self.root.join(container))
    }

    fn newest_csv(&self, dir: &Path, container: &str) -> Result<PathBuf, IngestError> {
        if !dir.is_dir() {
            return Err(IngestError::NotFound {
                container: container.to_string(),
            });
        }
        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in std::fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))? {
            let entry = entry.map_err(|e| IngestError::io(dir, e))?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !path.is_file() || !is_csv {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .map_err(|e| IngestError::io(&path, e))?;
            let replace = match &newest {
                None => true,
                Some((time, current)) => {
                    modified > *time || (modified == *time && path > *current)
                }
            };
            if replace {
                newest = Some((modified, path));
            }
        }
        newest
            .map(|(_, path)| path)
            .ok_or_else(|| IngestError::NotFound {
                container: container.to_string(),
            })
    }
}

impl SourceLocator for FsSourceLocator {
    fn fetch_latest(&self, container: &str) -> Result<SourceFile, IngestError> {
        let dir = self.container_dir(container)?;
        let path = self.newest_csv(&dir, container)?;
        let configured = lookup(&self.options.encoding).ok_or_else(|| {
            IngestError::UnknownEncoding {
                label: self.options.encoding.clone(),
            }
        })?;

        let bytes = std::fs::read(&path).map_err(|e| IngestError::io(&path, e))?;
        let (text, encoding) = decode(&bytes, configured).ok_or_else(|| IngestError::Decode {
            path: path.clone(),
            encoding: configured.name().to_string(),
        })?;
        let table = parse_delimited(&text, self.options.delimiter, self.options.skip_rows)
            .map_err(|source| IngestError::Csv {
                path: path.clone(),
                source,
            })?;

        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        tracing::debug!(
            container,
            file = %name,
            encoding = encoding.name(),
            rows = table.records.len(),
            "decoded source file"
        );
        Ok(SourceFile {
            container: container.to_string(),
            name,
            path,
            encoding: encoding.name().to_string(),
            headers: table.headers,
            records: table.records,
        })
    }

    fn archive(&self, file: &SourceFile) -> Result<(), IngestError> {
        let history = self.container_dir(&file.container)?.join(HISTORY_DIR);
        std::fs::create_dir_all(&history).map_err(|e| IngestError::io(&history, e))?;
        let target = history.join(&file.name);
        std::fs::rename(&file.path, &target).map_err(|e| IngestError::io(&file.path, e))?;
        tracing::debug!(from = %file.path.display(), to = %target.display(), "archived source file");
        Ok(())
    }
}
