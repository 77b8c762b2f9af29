//! Filesystem-backed configuration store.
//!
//! Layout:
//!
//! ```text
//! <root>/main_config.json            {"base_columns": {...}}
//! <root>/customer_config/<name>.json one customer per file
//! ```

use std::path::{Path, PathBuf};

use etl_model::{ColumnMap, CustomerConfig, MainConfig};

use crate::error::RegistryError;
use crate::store::{ConfigStore, CustomerListing, RejectedConfig};

pub const MAIN_CONFIG_FILE: &str = "main_config.json";
pub const CUSTOMER_CONFIG_DIR: &str = "customer_config";

#[derive(Debug, Clone)]
pub struct FsConfigStore {
    root: PathBuf,
}

impl FsConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn main_config_path(&self) -> PathBuf {
        self.root.join(MAIN_CONFIG_FILE)
    }

    pub fn customer_dir(&self) -> PathBuf {
        self.root.join(CUSTOMER_CONFIG_DIR)
    }

    fn customer_files(&self) -> Result<Vec<PathBuf>, RegistryError> {
        let dir = self.customer_dir();
        if !dir.exists() {
            tracing::warn!(path = %dir.display(), "customer config directory does not exist");
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| RegistryError::io(&dir, e))? {
            let entry = entry.map_err(|e| RegistryError::io(&dir, e))?;
            let path = entry.path();
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if path.is_file() && is_json {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl ConfigStore for FsConfigStore {
    fn base_columns(&self) -> Result<ColumnMap, RegistryError> {
        let path = self.main_config_path();
        let text = std::fs::read_to_string(&path).map_err(|e| RegistryError::io(&path, e))?;
        let main: MainConfig =
            serde_json::from_str(&text).map_err(|e| RegistryError::json(&path, e))?;
        Ok(main.base_columns)
    }

    /// Customers in file name order. A file that cannot be read or parsed is
    /// reported in `rejected` under its file stem instead of failing the
    /// whole listing.
    fn list_customers(&self) -> Result<CustomerListing, RegistryError> {
        let mut listing = CustomerListing::default();
        for path in self.customer_files()? {
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_string();
            let parsed = std::fs::read_to_string(&path)
                .map_err(|e| RegistryError::io(&path, e))
                .and_then(|text| {
                    serde_json::from_str::<CustomerConfig>(&text)
                        .map_err(|e| RegistryError::json(&path, e))
                });
            match parsed {
                Ok(config) => listing.customers.push(config),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable customer config");
                    listing.rejected.push(RejectedConfig {
                        name: stem,
                        reason: err.to_string(),
                    });
                }
            }
        }
        Ok(listing)
    }
}
