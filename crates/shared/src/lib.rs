//! Shared types, errors, and configuration for Rentara.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management for the rental engine
pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, EngineSettings};
pub use error::{AppError, AppResult};
