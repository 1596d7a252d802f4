//! Configuration module for rback
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - JSON settings persistence and validation

pub mod paths;
pub mod settings;

pub use paths::RbackPaths;
pub use settings::{DatabaseConfig, Settings};
