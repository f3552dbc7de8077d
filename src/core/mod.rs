//! core
//!
//! Core domain types and configuration for gh-bootstrap.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RepositoryRef
//! - [`config`] - Configuration schema and loading

pub mod config;
pub mod types;
