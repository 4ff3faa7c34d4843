//! Common module - Shared types, traits, and utilities

pub mod errors;
pub mod traits;
pub mod types;
