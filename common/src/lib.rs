//! Shared building blocks for the database console services.
//!
//! Contains the unified error and response types, configuration loading,
//! request/response models and SQL helper utilities used by every service.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;

// Re-export commonly used types
pub use errors::{AppError, AppResult};
pub use response::{ApiResponse, PaginatedData, Pagination};
