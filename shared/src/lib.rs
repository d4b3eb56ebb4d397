//! Shared types and models for the SARA inventory platform
//!
//! This crate contains the domain types, search predicate builder, CSV row
//! parsing and validation rules used by the backend. Nothing in here performs
//! I/O, so every rule can be tested without a database.

pub mod import;
pub mod models;
pub mod search;
pub mod types;
pub mod validation;

pub use models::*;
pub use search::*;
pub use types::*;
pub use validation::*;
