//! Shared types and models for the Distribution Ledger Platform
//!
//! This crate contains the domain model and the pure settlement logic shared
//! between the ledger engine and other components of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
