//! Configuration store trait and the per-invocation snapshot.

use std::sync::Arc;

use etl_model::{ColumnMap, CustomerConfig};
use serde_json::json;

use crate::error::RegistryError;

/// A configuration document that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedConfig {
    /// Customer name if known, otherwise the document's file stem.
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerListing {
    pub customers: Vec<CustomerConfig>,
    pub rejected: Vec<RejectedConfig>,
}

/// Source of customer configurations and the base column registry.
pub trait ConfigStore: Send + Sync {
    fn base_columns(&self) -> Result<ColumnMap, RegistryError>;

    fn list_customers(&self) -> Result<CustomerListing, RegistryError>;

    /// Load everything one invocation needs, once.
    fn snapshot(&self) -> Result<ConfigSnapshot, RegistryError> {
        let base_columns = self.base_columns()?;
        let listing = self.list_customers()?;
        Ok(ConfigSnapshot::new(base_columns, listing))
    }
}

/// Immutable configuration for one invocation.
///
/// Customer names are unique ignoring ASCII case; later duplicates are moved
/// to `rejected`.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    base_columns: Arc<ColumnMap>,
    customers: Vec<Arc<CustomerConfig>>,
    rejected: Vec<RejectedConfig>,
}

impl ConfigSnapshot {
    pub fn new(base_columns: ColumnMap, listing: CustomerListing) -> Self {
        let mut customers: Vec<Arc<CustomerConfig>> = Vec::with_capacity(listing.customers.len());
        let mut rejected = listing.rejected;
        for config in listing.customers {
            let duplicate = customers
                .iter()
                .any(|known| known.name.trim().eq_ignore_ascii_case(config.name.trim()));
            if duplicate {
                tracing::warn!(customer = %config.name, "duplicate customer name in configuration");
                rejected.push(RejectedConfig {
                    name: config.name.clone(),
                    reason: format!("duplicate customer name `{}`", config.name),
                });
                continue;
            }
            customers.push(Arc::new(config));
        }
        Self {
            base_columns: Arc::new(base_columns),
            customers,
            rejected,
        }
    }

    pub fn base_columns(&self) -> &Arc<ColumnMap> {
        &self.base_columns
    }

    /// Customers in configuration order.
    pub fn customers(&self) -> &[Arc<CustomerConfig>] {
        &self.customers
    }

    pub fn rejected(&self) -> &[RejectedConfig] {
        &self.rejected
    }

    /// Case-insensitive lookup by customer name.
    pub fn find(&self, name: &str) -> Option<&Arc<CustomerConfig>> {
        let name = name.trim();
        self.customers
            .iter()
            .find(|config| config.name.trim().eq_ignore_ascii_case(name))
    }

    pub fn find_rejected(&self, name: &str) -> Option<&RejectedConfig> {
        let name = name.trim();
        self.rejected
            .iter()
            .find(|rejected| rejected.name.trim().eq_ignore_ascii_case(name))
    }

    /// Whether `name` refers to a configured customer, loadable or not.
    pub fn is_known(&self, name: &str) -> bool {
        self.find(name).is_some() || self.find_rejected(name).is_some()
    }
}

/// Store backed by values held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigStore {
    base_columns: ColumnMap,
    customers: Vec<CustomerConfig>,
}

impl InMemoryConfigStore {
    pub fn new(base_columns: ColumnMap, customers: Vec<CustomerConfig>) -> Self {
        Self {
            base_columns,
            customers,
        }
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn base_columns(&self) -> Result<ColumnMap, RegistryError> {
        Ok(self.base_columns.clone())
    }

    fn list_customers(&self) -> Result<CustomerListing, RegistryError> {
        Ok(CustomerListing {
            customers: self.customers.clone(),
            rejected: Vec::new(),
        })
    }
}

/// Summary of a snapshot for listings and logs.
pub fn describe(snapshot: &ConfigSnapshot) -> serde_json::Value {
    json!({
        "base_columns": snapshot.base_columns().keys().collect::<Vec<_>>(),
        "customers": snapshot
            .customers()
            .iter()
            .map(|config| json!({"name": config.name, "enabled": config.enabled}))
            .collect::<Vec<_>>(),
        "rejected": snapshot
            .rejected()
            .iter()
            .map(|rejected| json!({"name": rejected.name, "reason": rejected.reason}))
            .collect::<Vec<_>>(),
    })
}
