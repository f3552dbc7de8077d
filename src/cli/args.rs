//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Flags
//!
//! - `--host <HOST>`: Hosting service (also `GH_HOST`)
//! - `--api-url <URL>`: REST API base override
//! - `--https`: Clone and push over HTTPS instead of SSH
//! - `--dry-run`: Inspect and plan without writing anything
//! - `--strict-protections`: Fail when a branch protection cannot be read
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::Parser;

use crate::core::config::{GlobalConfig, Transport};

/// Bootstrap a new GitHub repository from an existing one: settings, teams,
/// topics, branch protections, and content.
#[derive(Parser, Debug)]
#[command(name = "gh-bootstrap-repository")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to create, as `owner/name` or `name`
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Repository to copy from, as `owner/name` or `name`
    #[arg(value_name = "ORIGIN")]
    pub origin: String,

    /// Hosting service hostname [default: github.com]
    #[arg(long, env = "GH_HOST", value_name = "HOST")]
    pub host: Option<String>,

    /// REST API base URL (defaults to the host's API)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Clone and push over HTTPS instead of SSH
    #[arg(long)]
    pub https: bool,

    /// Show what would be created without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Fail if a branch protection cannot be read
    #[arg(long)]
    pub strict_protections: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Apply flag overrides on top of file configuration.
    pub fn apply_to(&self, config: &mut GlobalConfig) {
        if let Some(host) = &self.host {
            config.host = Some(host.clone());
        }
        if let Some(url) = &self.api_url {
            config.api_url = Some(url.clone());
        }
        if self.https {
            config.transport = Some(Transport::Https.to_string());
        }
        if self.strict_protections {
            config.strict_protection_lookup = Some(true);
        }
    }
}
