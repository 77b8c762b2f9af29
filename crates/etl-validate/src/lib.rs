mod checks;
mod engine;

pub use checks::{check_rule, is_email};
pub use engine::{ValidationEngine, validate};
