//! Customer configuration and ColumnSpec resolution.

pub mod error;
pub mod fs;
pub mod resolve;
pub mod store;

pub use error::RegistryError;
pub use fs::FsConfigStore;
pub use resolve::resolve;
pub use store::{
    ConfigSnapshot, ConfigStore, CustomerListing, InMemoryConfigStore, RejectedConfig, describe,
};
