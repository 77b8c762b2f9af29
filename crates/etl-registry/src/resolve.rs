//! ColumnSpec resolution: `(base ∪ extra) − exclude`, typed and with compiled rules.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use etl_model::{
    ColumnDef, ColumnMap, ColumnRule, ColumnSpec, CustomerConfig, DataType, FileFormat,
    ResolvedColumn, RuleDef,
};
use regex::Regex;

use crate::error::RegistryError;

/// Resolve a customer's effective column set.
///
/// Base columns come first in registry order, then extra columns in declared
/// order. Excluded keys are dropped from both.
pub fn resolve(base: &ColumnMap, config: &CustomerConfig) -> Result<ColumnSpec, RegistryError> {
    let customer = config.name.trim();
    if customer.is_empty() {
        return Err(RegistryError::EmptyName);
    }
    check_customer_settings(customer, config)?;

    for key in config.extra_columns.keys() {
        if base.contains_key(key) {
            return Err(RegistryError::ExtraColumnCollision {
                customer: customer.to_string(),
                key: key.to_string(),
            });
        }
    }

    let excluded: HashSet<&str> = config.exclude_columns.iter().map(String::as_str).collect();
    for key in &excluded {
        if !base.contains_key(key) && !config.extra_columns.contains_key(key) {
            return Err(RegistryError::UnknownExcludedColumn {
                customer: customer.to_string(),
                key: (*key).to_string(),
            });
        }
    }

    let konserni = Arc::new(config.konserni.clone());
    let mut display_names = HashSet::new();
    let mut columns = Vec::new();
    for (key, def) in base.iter().chain(config.extra_columns.iter()) {
        if excluded.contains(key) {
            continue;
        }
        let column = resolve_column(customer, key, def, &konserni)?;
        if !display_names.insert(column.name.to_lowercase()) {
            return Err(RegistryError::DuplicateDisplayName {
                customer: customer.to_string(),
                name: column.name,
            });
        }
        columns.push(column);
    }

    Ok(ColumnSpec::new(customer, columns))
}

fn check_customer_settings(customer: &str, config: &CustomerConfig) -> Result<(), RegistryError> {
    if config.konserni.is_empty() {
        return Err(RegistryError::EmptyKonserni {
            customer: customer.to_string(),
        });
    }
    if config.file_format.parse::<FileFormat>().is_err() {
        return Err(RegistryError::UnknownFileFormat {
            customer: customer.to_string(),
            format: config.file_format.clone(),
        });
    }
    if encoding_rs::Encoding::for_label(config.file_encoding.trim().as_bytes()).is_none() {
        return Err(RegistryError::UnknownEncoding {
            customer: customer.to_string(),
            encoding: config.file_encoding.clone(),
        });
    }
    let delimiter = config.delimiter();
    if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
        return Err(RegistryError::InvalidDelimiter {
            customer: customer.to_string(),
            delimiter,
        });
    }
    Ok(())
}

fn resolve_column(
    customer: &str,
    key: &str,
    def: &ColumnDef,
    konserni: &Arc<BTreeSet<String>>,
) -> Result<ResolvedColumn, RegistryError> {
    let dtype: DataType = def
        .dtype
        .parse()
        .map_err(|_| RegistryError::UnknownDataType {
            customer: customer.to_string(),
            key: key.to_string(),
            dtype: def.dtype.clone(),
        })?;
    let invalid = |message: String| RegistryError::InvalidRule {
        customer: customer.to_string(),
        key: key.to_string(),
        message,
    };

    let mut rules = Vec::with_capacity(def.rules.len() + 1);
    for rule in &def.rules {
        rules.push(compile_rule(rule, dtype, konserni).map_err(invalid)?);
    }
    if let Some(length) = def.length {
        if length == 0 {
            return Err(invalid("length must be positive".to_string()));
        }
        rules.push(ColumnRule::MaxLength(length));
    }

    let name = if def.name.trim().is_empty() {
        key.to_string()
    } else {
        def.name.trim().to_string()
    };

    Ok(ResolvedColumn {
        key: key.to_string(),
        name,
        dtype,
        required: def.required,
        decimals: def.decimals,
        length: def.length,
        aliases: def
            .aliases
            .iter()
            .map(|alias| alias.trim().to_string())
            .filter(|alias| !alias.is_empty())
            .collect(),
        rules,
    })
}

fn compile_rule(
    rule: &RuleDef,
    dtype: DataType,
    konserni: &Arc<BTreeSet<String>>,
) -> Result<ColumnRule, String> {
    match rule {
        RuleDef::NonNegative => {
            require_numeric(dtype, "non_negative")?;
            Ok(ColumnRule::NonNegative)
        }
        RuleDef::Range { min, max } => {
            require_numeric(dtype, "range")?;
            if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) {
                return Err("range bounds must be numbers".to_string());
            }
            if let (Some(min), Some(max)) = (min, max)
                && min > max
            {
                return Err(format!("range min {min} is greater than max {max}"));
            }
            Ok(ColumnRule::Range {
                min: *min,
                max: *max,
            })
        }
        RuleDef::Email => Ok(ColumnRule::Email),
        RuleDef::Pattern { regex } => Regex::new(regex)
            .map(ColumnRule::Pattern)
            .map_err(|err| format!("pattern does not compile: {err}")),
        RuleDef::OneOf { values } => {
            let values: BTreeSet<String> = values
                .iter()
                .map(|value| value.trim().to_uppercase())
                .filter(|value| !value.is_empty())
                .collect();
            if values.is_empty() {
                return Err("one_of needs at least one value".to_string());
            }
            Ok(ColumnRule::OneOf(values))
        }
        RuleDef::Konserni => Ok(ColumnRule::Konserni(Arc::clone(konserni))),
    }
}

fn require_numeric(dtype: DataType, rule: &str) -> Result<(), String> {
    if dtype.is_numeric() {
        Ok(())
    } else {
        Err(format!("{rule} applies to int or float columns, not {dtype}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ColumnMap {
        ColumnMap::new()
            .with("name", ColumnDef::new("Name", "string"))
            .with("fax", ColumnDef::new("Fax", "string"))
            .with("email", ColumnDef::new("Email", "string"))
    }

    #[test]
    fn length_becomes_max_length_rule() {
        let base = ColumnMap::new().with("code", ColumnDef::new("Code", "str").with_length(4));
        let spec = resolve(&base, &CustomerConfig::new("acme")).unwrap();
        let rules: Vec<&str> = spec.columns()[0].rules.iter().map(ColumnRule::name).collect();
        assert_eq!(rules, vec!["max_length"]);
    }

    #[test]
    fn numeric_rule_on_text_column_is_rejected() {
        let base = ColumnMap::new().with(
            "name",
            ColumnDef::new("Name", "string").with_rule(RuleDef::NonNegative),
        );
        let err = resolve(&base, &CustomerConfig::new("acme")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidRule { .. }));
    }

    #[test]
    fn blank_display_name_falls_back_to_key() {
        let mut config = CustomerConfig::new("acme");
        config.extra_columns = ColumnMap::new().with("vat", ColumnDef::new("  ", "string"));
        let spec = resolve(&base(), &config).unwrap();
        assert_eq!(spec.get("vat").map(|c| c.name.as_str()), Some("vat"));
    }
}
