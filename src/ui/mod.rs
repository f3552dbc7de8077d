//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing text goes through this module so quiet mode is honored
//! in one place. Operator diagnostics use `tracing` instead.

pub mod output;
