//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout and respect the quiet flag. Errors and warnings go
//! to stderr. Diagnostics for operators go through `tracing`, not here.

use std::fmt::{Display, Write as _};

use crate::bootstrap::{ProvisionPlan, ProvisionedRepository};
use crate::forge::RepositorySettings;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags. Quiet wins over debug.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Default `tracing` filter directive for this verbosity.
    pub fn log_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Debug => "debug",
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One `key: value` line per setting the origin reports.
pub fn format_settings(settings: &RepositorySettings, prefix: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut text = |key: &str, value: &Option<String>| {
        if let Some(v) = value {
            lines.push(format!("{}{}: {}", prefix, key, v));
        }
    };
    text("description", &settings.description);
    text("homepage", &settings.homepage);

    let flags = [
        ("private", settings.private),
        ("has_issues", settings.has_issues),
        ("has_wiki", settings.has_wiki),
        ("has_pages", settings.has_pages),
        ("has_downloads", settings.has_downloads),
        ("allow_merge_commit", settings.allow_merge_commit),
        ("allow_squash_merge", settings.allow_squash_merge),
        ("allow_rebase_merge", settings.allow_rebase_merge),
    ];
    for (key, value) in flags {
        if let Some(v) = value {
            lines.push(format!("{}{}: {}", prefix, key, v));
        }
    }
    lines.join("\n")
}

/// Render a dry-run plan.
pub fn format_plan(plan: &ProvisionPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Would create {} ({})", plan.target, plan.scope);
    let _ = writeln!(
        out,
        "  content: {} @ {}",
        plan.origin, plan.default_branch
    );

    let settings = format_settings(&plan.settings, "    ");
    if !settings.is_empty() {
        let _ = writeln!(out, "  settings:\n{}", settings);
    }

    if plan.team_grants.is_empty() {
        let _ = writeln!(out, "  teams: none");
    } else {
        let grants: Vec<String> = plan
            .team_grants
            .iter()
            .map(|(slug, permission)| format!("{} ({})", slug, permission))
            .collect();
        let _ = writeln!(out, "  teams:\n{}", format_list(&grants, "    "));
    }

    if plan.topics.is_empty() {
        let _ = writeln!(out, "  topics: none");
    } else {
        let _ = writeln!(out, "  topics: {}", plan.topics.join(", "));
    }

    if plan.protected_branches.is_empty() {
        let _ = write!(out, "  protected branches: none");
    } else {
        let _ = write!(
            out,
            "  protected branches:\n{}",
            format_list(&plan.protected_branches, "    ")
        );
    }
    out
}

/// Render the result of a completed run.
pub fn format_summary(result: &ProvisionedRepository) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Created {} ({})",
        result.repository.full_name, result.scope
    );
    let _ = writeln!(
        out,
        "  content: {} @ {}",
        result.content.branch,
        short_id(&result.content.commit)
    );
    let _ = writeln!(out, "  teams granted: {}", result.teams_granted.len());
    let _ = writeln!(out, "  topics: {}", result.topics.len());
    let _ = writeln!(
        out,
        "  protected branches: {}",
        result.protected_branches.len()
    );
    let _ = write!(out, "{}", result.repository.html_url);
    out
}

fn short_id(oid: &str) -> &str {
    oid.get(..7).unwrap_or(oid)
}
