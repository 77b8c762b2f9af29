//! Customer configuration and the base column registry document.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

use crate::column::ColumnMap;
use crate::error::ModelError;

/// Output serialization format of a customer's export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            _ => Err(ModelError::UnknownFileFormat(s.to_string())),
        }
    }
}

/// `main_config.json`: the registry of base columns shared by every customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MainConfig {
    #[serde(default)]
    pub base_columns: ColumnMap,
}

/// One customer's declarative pipeline configuration.
///
/// Treated as an immutable value for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerConfig {
    pub name: String,
    /// Concern (group) labels. The configuration UI writes these as numbers;
    /// both numbers and strings are accepted and compared as trimmed text.
    #[serde(default, deserialize_with = "deserialize_labels")]
    pub konserni: BTreeSet<String>,
    pub source_container: String,
    pub destination_container: String,
    #[serde(default = "default_file_format")]
    pub file_format: String,
    #[serde(default = "default_file_encoding")]
    pub file_encoding: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude_columns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extra_columns: ColumnMap,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_delimiter: Option<char>,
}

impl CustomerConfig {
    /// A minimal enabled config, mostly for tests and tooling.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            konserni: BTreeSet::from(["1".to_string()]),
            source_container: name.clone(),
            destination_container: name.clone(),
            name,
            file_format: default_file_format(),
            file_encoding: default_file_encoding(),
            exclude_columns: Vec::new(),
            extra_columns: ColumnMap::new(),
            enabled: true,
            csv_delimiter: None,
        }
    }

    pub fn delimiter(&self) -> char {
        self.csv_delimiter.unwrap_or(';')
    }
}

fn default_file_format() -> String {
    "csv".to_string()
}

fn default_file_encoding() -> String {
    "utf-8".to_string()
}

fn default_enabled() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Label {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Label {
    fn into_text(self) -> String {
        match self {
            Label::Int(value) => value.to_string(),
            Label::Float(value) if value.fract() == 0.0 => format!("{value:.0}"),
            Label::Float(value) => value.to_string(),
            Label::Text(text) => text.trim().to_string(),
        }
    }
}

fn deserialize_labels<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let labels: Option<Vec<Label>> = Option::deserialize(deserializer)?;
    Ok(labels
        .unwrap_or_default()
        .into_iter()
        .map(Label::into_text)
        .filter(|label| !label.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_config_defaults() {
        let json = r#"{
            "name": "acme",
            "konserni": [1001, "1002 ", 1003.0],
            "source_container": "acme-in",
            "destination_container": "acme-out",
            "exclude_columns": null,
            "extra_columns": null
        }"#;
        let config: CustomerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.file_format, "csv");
        assert_eq!(config.file_encoding, "utf-8");
        assert!(config.enabled);
        assert!(config.exclude_columns.is_empty());
        assert!(config.extra_columns.is_empty());
        assert_eq!(config.delimiter(), ';');
        let labels: Vec<&str> = config.konserni.iter().map(String::as_str).collect();
        assert_eq!(labels, vec!["1001", "1002", "1003"]);
    }

    #[test]
    fn file_format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<FileFormat>().unwrap(), FileFormat::Csv);
        assert_eq!(" json".parse::<FileFormat>().unwrap(), FileFormat::Json);
        assert_eq!(
            "xml".parse::<FileFormat>().unwrap_err(),
            ModelError::UnknownFileFormat("xml".to_string())
        );
    }
}
