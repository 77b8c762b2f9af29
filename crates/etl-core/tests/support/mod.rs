#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use etl_core::{Collaborators, Orchestrator, PipelineSettings};
use etl_ingest::{IngestError, SourceFile, SourceLocator};
use etl_model::{
    Artifact, ArtifactRef, ColumnDef, ColumnMap, ColumnSpec, CustomerConfig, NormalizedRecord,
    RawRecord, RuleDef,
};
use etl_output::{ArtifactStore, OutputError, artifact_ref};
use etl_persist::{PersistError, PersistSummary, RelationalStore};
use etl_registry::InMemoryConfigStore;

pub fn timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(6, 30, 0))
        .expect("timestamp")
}

pub fn base_columns() -> ColumnMap {
    ColumnMap::new()
        .with("name", ColumnDef::new("Name", "string").required())
        .with("fax", ColumnDef::new("Fax", "string"))
        .with(
            "email",
            ColumnDef::new("Email", "string").with_rule(RuleDef::Email),
        )
}

pub fn acme() -> CustomerConfig {
    let mut config = CustomerConfig::new("acme");
    config.exclude_columns = vec!["fax".to_string()];
    config.extra_columns = ColumnMap::new().with("vat", ColumnDef::new("VAT ID", "string"));
    config
}

pub fn source_file(container: &str, rows: Vec<RawRecord>) -> SourceFile {
    SourceFile {
        container: container.to_string(),
        name: "export.csv".to_string(),
        path: PathBuf::from(container).join("export.csv"),
        encoding: "UTF-8".to_string(),
        headers: vec!["Name".to_string(), "Email".to_string(), "VAT ID".to_string()],
        records: rows,
    }
}

pub fn row(line: u64, name: &str, email: &str) -> RawRecord {
    RawRecord::new(line)
        .with("Name", name)
        .with("Email", email)
        .with("VAT ID", "")
}

#[derive(Default)]
pub struct FakeSource {
    pub files: HashMap<String, SourceFile>,
    pub fetches: AtomicUsize,
    pub archived: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_file(mut self, file: SourceFile) -> Self {
        self.files.insert(file.container.clone(), file);
        self
    }
}

impl SourceLocator for FakeSource {
    fn fetch_latest(&self, container: &str) -> Result<SourceFile, IngestError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(container)
            .cloned()
            .ok_or_else(|| IngestError::NotFound {
                container: container.to_string(),
            })
    }

    fn archive(&self, file: &SourceFile) -> Result<(), IngestError> {
        self.archived
            .lock()
            .expect("lock")
            .push(format!("{}/{}", file.container, file.name));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDatabase {
    pub fail: bool,
    pub calls: AtomicUsize,
    pub rows: Mutex<Vec<(String, usize)>>,
}

impl RelationalStore for FakeDatabase {
    fn upsert_records(
        &self,
        customer: &str,
        _spec: &ColumnSpec,
        records: &[NormalizedRecord],
    ) -> Result<PersistSummary, PersistError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PersistError::Unavailable {
                message: "database offline".to_string(),
            });
        }
        self.rows
            .lock()
            .expect("lock")
            .push((customer.to_string(), records.len()));
        Ok(PersistSummary {
            table: customer.to_string(),
            rows: records.len(),
        })
    }
}

#[derive(Default)]
pub struct FakeArtifacts {
    /// Index within one batch whose write fails; the batch stores nothing.
    pub fail_at: Option<usize>,
    pub uploads: Mutex<Vec<(String, Artifact)>>,
}

impl FakeArtifacts {
    pub fn names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .expect("lock")
            .iter()
            .map(|(container, artifact)| format!("{container}/{}", artifact.name))
            .collect()
    }
}

impl ArtifactStore for FakeArtifacts {
    fn upload(&self, container: &str, artifact: &Artifact) -> Result<ArtifactRef, OutputError> {
        self.uploads
            .lock()
            .expect("lock")
            .push((container.to_string(), artifact.clone()));
        Ok(artifact_ref(container, artifact))
    }

    fn upload_all(
        &self,
        container: &str,
        artifacts: &[Artifact],
    ) -> Result<Vec<ArtifactRef>, OutputError> {
        if let Some(index) = self.fail_at
            && index < artifacts.len()
        {
            return Err(OutputError::Io {
                operation: "write",
                path: PathBuf::from(container).join(&artifacts[index].name),
                source: std::io::Error::other("storage quota exceeded"),
            });
        }
        artifacts
            .iter()
            .map(|artifact| self.upload(container, artifact))
            .collect()
    }
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub database: Arc<FakeDatabase>,
    pub artifacts: Arc<FakeArtifacts>,
    pub orchestrator: Orchestrator,
}

pub fn harness(
    customers: Vec<CustomerConfig>,
    source: FakeSource,
    database: FakeDatabase,
    settings: PipelineSettings,
) -> Harness {
    harness_with_artifacts(
        customers,
        source,
        database,
        FakeArtifacts::default(),
        settings,
    )
}

pub fn harness_with_artifacts(
    customers: Vec<CustomerConfig>,
    source: FakeSource,
    database: FakeDatabase,
    artifacts: FakeArtifacts,
    settings: PipelineSettings,
) -> Harness {
    let source = Arc::new(source);
    let database = Arc::new(database);
    let artifacts = Arc::new(artifacts);
    let collaborators = Collaborators {
        config: Arc::new(InMemoryConfigStore::new(base_columns(), customers)),
        source: source.clone(),
        database: database.clone(),
        artifacts: artifacts.clone(),
    };
    let orchestrator = Orchestrator::new(collaborators, settings).expect("orchestrator");
    Harness {
        source,
        database,
        artifacts,
        orchestrator,
    }
}
