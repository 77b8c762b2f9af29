//! Record normalization: matching source headers to column keys and coercing
//! values to their declared types.

pub mod coerce;
pub mod normalization;
pub mod normalizer;

pub use coerce::coerce;
pub use normalizer::{Normalizer, header_key, normalize};
