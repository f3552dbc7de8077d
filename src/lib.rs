//! gh-bootstrap - create a GitHub repository from an existing one
//!
//! Given a target name and an origin repository, the tool creates the target
//! with the origin's settings, copies the origin's files into it as a single
//! fresh commit, and replays the origin's team grants, topics, and branch
//! protections.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, wires the pipeline)
//! - [`bootstrap`] - Origin inspection and target provisioning
//! - [`forge`] - Hosting API abstraction (GitHub REST, mock)
//! - [`git`] - Content transfer via libgit2
//! - [`core`] - Domain types and configuration
//! - [`auth`] - Token resolution
//! - [`secrets`] - Token storage
//! - [`ui`] - User-facing output
//!
//! # Guarantees
//!
//! 1. The origin is only ever read
//! 2. The target is created exactly once, before anything is applied to it
//! 3. The first failure stops the run; nothing is retried or rolled back
//! 4. Tokens never appear in logs or error messages

pub mod auth;
pub mod bootstrap;
pub mod cli;
pub mod core;
pub mod forge;
pub mod git;
pub mod secrets;
pub mod ui;
