//! Release command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use releasekit_config::{Config, find_and_load_config, load_config};
use releasekit_core::{
    BuildSecrets, CommandReleaseBuilder, CommandTidy, ExternalCommand, ReleaseSettings,
    ReleaseWorkflow, TagOutcome, WorkflowOutcome,
};
use releasekit_git::{Author, Credentials};

use super::{BumpArg, advance_mode, component};

/// Arguments for the release command.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Configuration file (default: search for releasekit.toml, then config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Component bumped for the next version (overrides the configuration)
    #[arg(short, long, value_enum)]
    pub bump: Option<BumpArg>,

    /// Working copy directory (overrides the configuration)
    #[arg(short, long)]
    pub workdir: Option<PathBuf>,

    /// Access token for the remote and the release builder
    #[arg(long, env = "RELEASEKIT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
}

fn build_workflow(config: &Config, args: &ReleaseArgs) -> ReleaseWorkflow {
    let token = args
        .access_token
        .clone()
        .unwrap_or_else(|| config.accesstoken.clone());

    let settings = ReleaseSettings {
        changelog: PathBuf::from(&config.changelog.path),
        bump: args
            .bump
            .map_or_else(|| component(config.changelog.bump), Into::into),
        advance: advance_mode(config.changelog.advance),
        tag_prefix: config.tag_prefix.clone(),
        author: Author::new(&config.username, &config.email),
        credentials: Credentials::new(&config.username, &token),
        secrets: BuildSecrets {
            token,
            fingerprint: config.gpg_fingerprint.clone(),
        },
    };

    let builder = CommandReleaseBuilder::new(
        ExternalCommand::new(&config.builder.program, &config.builder.args),
        &config.builder.dist_dir,
    )
    .with_env_names(&config.builder.token_env, &config.builder.fingerprint_env);

    let workflow = ReleaseWorkflow::new(settings, Box::new(builder));
    if config.tidy.enabled {
        workflow.with_tidy(Box::new(CommandTidy::new(ExternalCommand::new(
            &config.tidy.program,
            &config.tidy.args,
        ))))
    } else {
        workflow
    }
}

/// Runs the release command.
///
/// A failure after the release step leaves the changelog entry stamped. Running
/// again then reports nothing to release until the `(Unreleased)` header is put
/// back, after which the existing tag is reused.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ReleaseArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path),
        None => find_and_load_config(),
    }
    .context("failed to load configuration")?;
    config
        .validate_for_release()
        .context("configuration is incomplete for a release")?;

    let workdir = args
        .workdir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.workdir));
    let workflow = build_workflow(&config, &args);

    println!("Starting release of {} in {}", config.git_repo, workdir.display());

    let repo = workflow.checkout(&config.git_repo, &workdir)?;
    let outcome = workflow.run(&repo, &workdir)?;

    match outcome {
        WorkflowOutcome::NothingToRelease => {
            println!("Nothing to release: the changelog has no unreleased entry");
        }
        WorkflowOutcome::Published { version, tag, next } => {
            let tag_name = format!("{}{version}", config.tag_prefix);
            if tag == TagOutcome::AlreadyExists {
                info!(tag = %tag_name, "reused existing tag");
            }
            println!("Released {version} (tag {tag_name})");
            println!("Next version: {next}");
        }
    }

    Ok(())
}
