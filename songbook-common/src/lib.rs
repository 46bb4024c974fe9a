//! # Songbook Common Library
//!
//! Shared code for the songbook service including:
//! - Error taxonomy shared by the store and the HTTP layer
//! - Configuration loading (CLI / ENV / TOML / defaults)
//! - Release date formatting
//! - Database bootstrap, row types and the row-to-song mapping

pub mod config;
pub mod db;
pub mod error;
pub mod release_date;

pub use error::{Error, Result};
