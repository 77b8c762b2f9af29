//! Validation check modules.
//!
//! Each module performs one kind of per-cell check.

pub(crate) mod datatype;
pub(crate) mod required;
pub mod rules;

pub use rules::{check_rule, is_email};
