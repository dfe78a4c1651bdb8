//! Utility functions and helpers.

pub mod rows;
pub mod sql_builder;
pub mod sql_validator;

// Re-export commonly used types
pub use sql_builder::{ColumnMeta, SqlBuilder};
pub use sql_validator::SqlValidator;
