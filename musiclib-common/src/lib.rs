//! # MusicLibrary Common Library
//!
//! Shared code for the MusicLibrary service:
//! - Database schema, models and queries
//! - Form validation rules
//! - Performance categorization for song/album/contributor pages
//! - Album track-order validation
//! - Configuration loading and root folder resolution
//! - Display formatting helpers

pub mod categorize;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod forms;
pub mod track_order;
pub mod validation;

pub use error::{Error, Result};
pub use validation::ValidationErrors;
