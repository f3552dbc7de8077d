//! bootstrap
//!
//! The two halves of a run: read the origin, then provision the target.
//!
//! # Architecture
//!
//! - [`inspect_origin`] reads the origin into an immutable [`OriginSnapshot`]
//!   and never writes.
//! - [`Provisioner`] creates the target and replays the snapshot onto it.
//!
//! Both receive their capabilities (`&dyn Forge`, `&dyn ContentBridge`)
//! explicitly, so tests drive them with `MockForge` and a recording bridge.
//!
//! # Example
//!
//! ```ignore
//! use gh_bootstrap::bootstrap::{inspect_origin, InspectOptions, ProvisionOptions, Provisioner};
//!
//! let snapshot = inspect_origin(forge, &origin, &InspectOptions::default()).await?;
//! let provisioner = Provisioner::new(forge, &bridge, ProvisionOptions::default());
//! let created = provisioner.provision(&target, &snapshot).await?;
//! println!("created {}", created.repository.html_url);
//! ```

mod errors;
mod inspect;
mod provision;
mod snapshot;

pub use errors::BootstrapError;
pub use inspect::{inspect_origin, InspectOptions};
pub use provision::{
    ProvisionOptions, ProvisionPlan, ProvisionedRepository, Provisioner, Scope,
};
pub use snapshot::{restriction_request, BranchProtectionRule, OriginSnapshot};
