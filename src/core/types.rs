//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`RepositoryRef`] - An `owner/name` or bare `name` repository reference
//!
//! # Validation
//!
//! References are validated at construction time, so the rest of the
//! pipeline never has to deal with empty segments or stray slashes.
//!
//! # Examples
//!
//! ```
//! use gh_bootstrap::core::types::RepositoryRef;
//!
//! let r: RepositoryRef = "acme/platform".parse().unwrap();
//! assert_eq!(r.owner(), "acme");
//! assert_eq!(r.name(), "platform");
//!
//! let bare: RepositoryRef = "platform".parse().unwrap();
//! assert_eq!(bare.owner(), "");
//! assert!(!bare.has_owner());
//!
//! assert!("a/b/c".parse::<RepositoryRef>().is_err());
//! ```

use std::str::FromStr;

use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid repository reference '{input}': {reason}")]
    InvalidRepositoryRef { input: String, reason: String },
}

impl TypeError {
    fn repo_ref(input: &str, reason: impl Into<String>) -> Self {
        TypeError::InvalidRepositoryRef {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A reference to a hosted repository.
///
/// The owner is optional on input. An empty owner means "the authenticated
/// user" and is filled in with [`RepositoryRef::resolve`] once the login is
/// known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    owner: String,
    name: String,
}

impl RepositoryRef {
    /// Create a reference from already-split parts.
    ///
    /// Pass an empty `owner` for a reference owned by the authenticated user.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, TypeError> {
        let owner = owner.into();
        let name = name.into();
        let display = if owner.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", owner, name)
        };

        if !owner.is_empty() {
            validate_segment(&display, &owner, "owner")?;
        }
        validate_segment(&display, &name, "name")?;

        Ok(Self { owner, name })
    }

    /// Parse an `owner/name` or bare `name` string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepositoryRef` for empty input, empty
    /// segments, more than one `/`, or characters GitHub does not allow.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TypeError::repo_ref(input, "reference cannot be empty"));
        }

        let mut parts = trimmed.split('/');
        let first = parts.next().unwrap_or_default();
        match (parts.next(), parts.next()) {
            (None, _) => Self::new("", first),
            (Some(second), None) => {
                if first.is_empty() {
                    return Err(TypeError::repo_ref(input, "owner cannot be empty"));
                }
                Self::new(first, second)
            }
            (Some(_), Some(_)) => Err(TypeError::repo_ref(
                input,
                "expected 'owner/name' or 'name'",
            )),
        }
    }

    /// The owner login, or `""` when absent.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The repository name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether an explicit owner was given.
    pub fn has_owner(&self) -> bool {
        !self.owner.is_empty()
    }

    /// Fill an absent owner with the authenticated user's login.
    ///
    /// References with an explicit owner are returned unchanged.
    pub fn resolve(&self, login: &str) -> RepositoryRef {
        if self.has_owner() {
            self.clone()
        } else {
            RepositoryRef {
                owner: login.to_string(),
                name: self.name.clone(),
            }
        }
    }
}

fn validate_segment(input: &str, segment: &str, what: &str) -> Result<(), TypeError> {
    if segment.is_empty() {
        return Err(TypeError::repo_ref(
            input,
            format!("{} cannot be empty", what),
        ));
    }
    if segment == "." || segment == ".." {
        return Err(TypeError::repo_ref(
            input,
            format!("{} cannot be '{}'", what, segment),
        ));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(TypeError::repo_ref(
            input,
            format!("{} contains invalid character {:?}", what, c),
        ));
    }
    Ok(())
}

impl FromStr for RepositoryRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.owner.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.owner, self.name)
        }
    }
}
