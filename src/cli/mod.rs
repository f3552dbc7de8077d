//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Merge file configuration with flags
//! - Resolve credentials and build the forge and content bridge
//! - Run the pipeline on a current-thread runtime
//! - Print the plan or the result
//!
//! # Architecture
//!
//! The CLI layer is thin. [`execute`] is the whole pipeline over injected
//! capabilities; [`run`] only wires real implementations into it.

pub mod args;

pub use args::Cli;

use anyhow::{Context, Result};
use tracing::debug;

use crate::auth::{CredentialProvider, DefaultCredentials};
use crate::bootstrap::{
    inspect_origin, InspectOptions, ProvisionOptions, ProvisionPlan, ProvisionedRepository,
    Provisioner,
};
use crate::core::config::Config;
use crate::core::types::RepositoryRef;
use crate::forge::{create_forge, Forge};
use crate::git::{ContentBridge, GitBridge};
use crate::secrets::{FileSecretStore, SecretStore};
use crate::ui::output::{self, Verbosity};

/// Inputs for one run of the pipeline.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub target: RepositoryRef,
    pub origin: RepositoryRef,
    pub inspect: InspectOptions,
    pub provision: ProvisionOptions,
    pub dry_run: bool,
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Planned(ProvisionPlan),
    Provisioned(ProvisionedRepository),
}

/// Inspect the origin, then plan or provision the target.
pub async fn execute(
    forge: &dyn Forge,
    bridge: &dyn ContentBridge,
    request: RunRequest,
) -> Result<RunOutcome> {
    let snapshot = inspect_origin(forge, &request.origin, &request.inspect)
        .await
        .context("failed to inspect origin repository")?;

    let provisioner = Provisioner::new(forge, bridge, request.provision);
    if request.dry_run {
        let plan = provisioner.plan(&request.target, &snapshot).await?;
        return Ok(RunOutcome::Planned(plan));
    }

    let created = provisioner
        .provision(&request.target, &snapshot)
        .await
        .with_context(|| format!("failed to bootstrap '{}'", request.target))?;
    Ok(RunOutcome::Provisioned(created))
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);

    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(path) = config.loaded_from() {
        debug!(path = %path.display(), "loaded configuration");
    }
    cli.apply_to(&mut config.global);
    config.global.validate()?;

    let target = RepositoryRef::parse(&cli.target).context("invalid target repository")?;
    let origin = RepositoryRef::parse(&cli.origin).context("invalid origin repository")?;

    let host = config.host().to_string();
    let store = config
        .secrets_file()
        .ok()
        .map(|path| Box::new(FileSecretStore::new(path)) as Box<dyn SecretStore>);
    let token = DefaultCredentials::new(store)
        .token_for_host(&host)
        .context("failed to resolve credentials")?;
    debug!(host = %host, authenticated = token.is_some(), "credentials resolved");
    if token.is_none() {
        output::warn(
            format!("no token found for {}, sending unauthenticated requests", host),
            verbosity,
        );
    }

    let forge = create_forge(&host, token.clone(), config.api_url());
    let bridge = GitBridge::new(config.temp_dir())
        .with_clone_depth(config.clone_depth())
        .with_author(config.author_name(), config.author_email());

    let request = RunRequest {
        target,
        origin,
        inspect: InspectOptions {
            strict_protection_lookup: config.strict_protection_lookup(),
        },
        provision: ProvisionOptions {
            transport: config.transport(),
            token,
        },
        dry_run: cli.dry_run,
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    match rt.block_on(execute(forge.as_ref(), &bridge, request))? {
        RunOutcome::Planned(plan) => output::print(output::format_plan(&plan), verbosity),
        RunOutcome::Provisioned(created) => {
            output::success(output::format_summary(&created), verbosity)
        }
    }
    Ok(())
}

/// Error message followed by its cause chain, one cause per line.
pub fn format_error(err: &anyhow::Error) -> String {
    let mut text = err.to_string();
    for cause in err.chain().skip(1) {
        text.push_str("\n  caused by: ");
        text.push_str(&cause.to_string());
    }
    text
}
