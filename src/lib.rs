//! rback - Streaming database and media backups to any rclone remote
//!
//! This library backs up and restores application databases and file media
//! by streaming data through two cooperating subprocesses — a
//! database-native dump/restore tool and rclone — connected via an OS pipe,
//! with no intermediate files.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration file and path management
//! - `error`: Custom error types
//! - `connector`: Per-engine database dump/restore adapters and registry
//! - `pipeline`: The streaming process pipeline with stderr drains
//! - `rclone`: Subprocess wrapper around the rclone binary
//! - `filenames`: Backup naming convention
//! - `retention`: Keep-newest-K pruning of old backups
//! - `events`: Typed pre/post hooks around backup and restore
//! - `cli`: clap command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use rback::config::{RbackPaths, Settings};
//!
//! let paths = RbackPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! settings.validate()?;
//! ```

pub mod cli;
pub mod config;
pub mod connector;
pub mod error;
pub mod events;
pub mod filenames;
pub mod pipeline;
pub mod rclone;
pub mod retention;

pub use error::{BackupError, BackupResult};
