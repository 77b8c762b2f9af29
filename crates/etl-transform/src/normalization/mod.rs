//! Value normalization functions used by the record normalizer:
//! - **numeric**: locale-tolerant float/int parsing and fixed formatting
//! - **datetime**: date parsing against the accepted format list
//! - **identifier**: id token cleanup

pub mod datetime;
pub mod identifier;
pub mod numeric;

pub use datetime::{format_date, parse_date};
pub use identifier::normalize_identifier;
pub use numeric::{format_fixed, number_text, parse_float, parse_int};
