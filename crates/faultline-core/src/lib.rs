//! Core types, configuration, and error handling for the Faultline platform.
//!
//! This crate provides the shared foundation used by all other Faultline crates:
//! - [`FaultlineError`] — unified error type using `thiserror`
//! - [`FaultlineConfig`] — configuration loaded from `.faultline.toml`
//! - Shared types: [`MutationKind`], [`MutationStyle`], [`PatternKind`],
//!   [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{FaultlineConfig, MutationConfig, PolicyConfig};
pub use error::FaultlineError;
pub use types::{MutationKind, MutationStyle, OutputFormat, PatternKind};

/// A convenience `Result` type for Faultline operations.
pub type Result<T> = std::result::Result<T, FaultlineError>;
