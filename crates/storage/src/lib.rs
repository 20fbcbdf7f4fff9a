//! Storage for a single flat directory of files.
//!
//! Everything retitle does to the filesystem goes through a
//! [`StorageBackend`]: listing the directory, reading file bytes, and
//! renaming files. There is no write or delete; a rename never replaces an
//! existing file.

pub mod backend;
pub mod error;
mod models;
mod name;

pub use crate::backend::StorageBackend;
pub use crate::models::{FileInfo, split_extension};
pub use crate::name::validate as validate_name;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
