//! # Scout Common Library
//!
//! Shared code for the scouting sync crates including:
//! - Error type and result alias
//! - Bootstrap configuration loading and root folder resolution
//! - Event types (ScoutEvent enum) and the EventBus
//! - SQLite-backed key-value store for on-device JSON blobs
//! - The observation variant tag (match / pit)

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;
pub mod variant;

pub use error::{Error, Result};
pub use variant::Variant;
