//! Library side of the `customer-etl` binary.

pub mod config;
pub mod logging;
pub mod server;
