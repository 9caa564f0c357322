//! Repository pattern indexing and generated-content partitioning for UI test generation.
//!
//! The index side walks an existing test repository, classifies its files and infers the
//! conventions new tests should follow. The partitioning side takes raw language-model output
//! and splits it into an imports block, a page object section and a test section.

pub mod config;
pub mod contexts;
pub mod data;
pub mod error;
pub mod index_store;
pub mod syntax;

pub use error::{Error, Result};
