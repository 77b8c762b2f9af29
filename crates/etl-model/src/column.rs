use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use regex::Regex;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ModelError;

/// Target type of a column after coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Int,
    Float,
    Date,
    Id,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Date => "date",
            DataType::Id => "id",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ModelError;

    /// Parse a dtype label. Legacy labels written by the configuration UI
    /// (`float64`, `int64`, `str`, `datetime64[ns]`) are matched by prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "id" | "identifier" => return Ok(DataType::Id),
            _ => {}
        }
        if normalized.starts_with("float") || normalized == "double" || normalized == "decimal" {
            Ok(DataType::Float)
        } else if normalized.starts_with("int") {
            Ok(DataType::Int)
        } else if normalized.starts_with("str") || normalized == "text" {
            Ok(DataType::String)
        } else if normalized.starts_with("date") {
            Ok(DataType::Date)
        } else {
            Err(ModelError::UnknownDataType(s.to_string()))
        }
    }
}

/// A domain rule as declared in a column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleDef {
    NonNegative,
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Email,
    Pattern {
        regex: String,
    },
    OneOf {
        values: Vec<String>,
    },
    Konserni,
}

/// One entry of the base column registry or of a customer's extra columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Display name used in exports and as the database column name.
    pub name: String,
    /// Raw dtype label; parsed into [`DataType`] when the column spec is resolved.
    pub dtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleDef>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, dtype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: dtype.into(),
            decimals: None,
            length: None,
            required: false,
            aliases: Vec::new(),
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = Some(decimals);
        self
    }

    #[must_use]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: RuleDef) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Column definitions keyed by column key, in declaration order.
///
/// JSON objects are read in document order, which is the order columns
/// appear in every export. Duplicate keys are rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap(Vec<(String, ColumnDef)>);

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Returns false (and leaves the map unchanged) if the
    /// key is already present.
    pub fn insert(&mut self, key: impl Into<String>, def: ColumnDef) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.0.push((key, def));
        true
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, def: ColumnDef) -> Self {
        self.insert(key, def);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDef> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, def)| def)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnDef)> {
        self.0.iter().map(|(k, def)| (k.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ColumnDef)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (String, ColumnDef)>>(iter: I) -> Self {
        let mut map = ColumnMap::new();
        for (key, def) in iter {
            map.insert(key, def);
        }
        map
    }
}

impl Serialize for ColumnMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, def)| (k, def)))
    }
}

impl<'de> Deserialize<'de> for ColumnMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ColumnMapVisitor;

        impl<'de> Visitor<'de> for ColumnMapVisitor {
            type Value = ColumnMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column key to column definition")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ColumnMap::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = ColumnMap::new();
                while let Some((key, def)) = access.next_entry::<String, ColumnDef>()? {
                    if map.contains_key(&key) {
                        return Err(de::Error::custom(format!("duplicate column key `{key}`")));
                    }
                    map.0.push((key, def));
                }
                Ok(map)
            }
        }

        deserializer.deserialize_any(ColumnMapVisitor)
    }
}

/// A compiled domain rule attached to a resolved column.
#[derive(Debug, Clone)]
pub enum ColumnRule {
    NonNegative,
    Range { min: Option<f64>, max: Option<f64> },
    Email,
    Pattern(Regex),
    /// Allowed values, stored uppercase.
    OneOf(BTreeSet<String>),
    MaxLength(usize),
    /// The customer's concern labels.
    Konserni(Arc<BTreeSet<String>>),
}

impl ColumnRule {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnRule::NonNegative => "non_negative",
            ColumnRule::Range { .. } => "range",
            ColumnRule::Email => "email",
            ColumnRule::Pattern(_) => "pattern",
            ColumnRule::OneOf(_) => "one_of",
            ColumnRule::MaxLength(_) => "max_length",
            ColumnRule::Konserni(_) => "konserni",
        }
    }
}

/// One column of a customer's effective column set.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub key: String,
    pub name: String,
    pub dtype: DataType,
    pub required: bool,
    pub decimals: Option<u8>,
    pub length: Option<usize>,
    pub aliases: Vec<String>,
    pub rules: Vec<ColumnRule>,
}

impl ResolvedColumn {
    /// Source header names this column is read from: key, display name and
    /// declared aliases.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key.as_str())
            .chain(std::iter::once(self.name.as_str()))
            .chain(self.aliases.iter().map(String::as_str))
    }
}

/// The resolved, ordered, typed column list used for one customer in one run.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    customer: String,
    columns: Vec<ResolvedColumn>,
}

impl ColumnSpec {
    pub fn new(customer: impl Into<String>, columns: Vec<ResolvedColumn>) -> Self {
        Self {
            customer: customer.into(),
            columns,
        }
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn columns(&self) -> &[ResolvedColumn] {
        &self.columns
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    pub fn display_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&ResolvedColumn> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Find a column by key or display name, ignoring ASCII case.
    pub fn find(&self, key_or_name: &str) -> Option<&ResolvedColumn> {
        self.columns.iter().find(|c| {
            c.key.eq_ignore_ascii_case(key_or_name) || c.name.eq_ignore_ascii_case(key_or_name)
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_accepts_legacy_labels() {
        assert_eq!("float64".parse::<DataType>().unwrap(), DataType::Float);
        assert_eq!("Int64".parse::<DataType>().unwrap(), DataType::Int);
        assert_eq!("str".parse::<DataType>().unwrap(), DataType::String);
        assert_eq!("datetime64[ns]".parse::<DataType>().unwrap(), DataType::Date);
        assert_eq!("identifier".parse::<DataType>().unwrap(), DataType::Id);
        assert!("blob".parse::<DataType>().is_err());
    }

    #[test]
    fn column_map_keeps_document_order() {
        let json = r#"{"zeta": {"name": "Z", "dtype": "string"},
                       "alpha": {"name": "A", "dtype": "int"},
                       "mid": {"name": "M", "dtype": "float", "decimals": 2}}"#;
        let map: ColumnMap = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(map.get("mid").and_then(|d| d.decimals), Some(2));
    }

    #[test]
    fn column_map_rejects_duplicate_keys() {
        let json = r#"{"a": {"name": "A", "dtype": "string"}, "a": {"name": "B", "dtype": "string"}}"#;
        let err = serde_json::from_str::<ColumnMap>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate column key `a`"));
    }

    #[test]
    fn column_map_serializes_in_order() {
        let map = ColumnMap::new()
            .with("b", ColumnDef::new("B", "int"))
            .with("a", ColumnDef::new("A", "string"));
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            r#"{"b":{"name":"B","dtype":"int","required":false},"a":{"name":"A","dtype":"string","required":false}}"#
        );
    }

    #[test]
    fn rule_defs_use_kind_tag() {
        let rules: Vec<RuleDef> = serde_json::from_str(
            r#"[{"kind": "non_negative"}, {"kind": "range", "min": 0, "max": 100},
                {"kind": "pattern", "regex": "^FI"}, {"kind": "konserni"}]"#,
        )
        .unwrap();
        assert_eq!(rules[0], RuleDef::NonNegative);
        assert_eq!(
            rules[1],
            RuleDef::Range {
                min: Some(0.0),
                max: Some(100.0)
            }
        );
        assert_eq!(rules[3], RuleDef::Konserni);
    }
}
