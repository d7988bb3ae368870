//! Create a release on a Gitea instance from a CI pipeline and attach build artifacts to it.

use clap::{Arg, ArgAction, Command, command};
use miette::{Diagnostic, Result};
use tracing::{Level, debug};

use crate::{config::Config, integrations::gitea, state::RunType};

mod config;
mod files;
mod fs;
mod integrations;
mod publish;
mod server;
mod state;

/// Parse the command line (and environment), then publish the release it describes.
///
/// ## Errors
/// Any problem that should fail the pipeline, rendered by `miette`.
pub async fn run() -> Result<()> {
    let matches = build_cli().get_matches();
    let config = Config::from_matches(&matches);
    init_tracing(config.verbose);
    publish_release(&config).await?;
    Ok(())
}

async fn publish_release(config: &Config) -> Result<(), Error> {
    let host = server::resolve(&config.server)?;
    debug!("Using the Gitea instance at {host}");
    let client = gitea::Client::new(
        config::Gitea {
            owner: config.namespace.clone(),
            repo: config.repo.clone(),
            host,
        },
        config.api_key.resolve(),
    )?;
    let api = if config.dry_run {
        RunType::DryRun(&client)
    } else {
        RunType::Real(&client)
    };

    let summary = publish::publish(api, &config.release_options(), &config.files).await?;
    summary.report();
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_level(false)
        .init();
}

fn build_cli() -> Command {
    command!()
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .env("PLUGIN_API_KEY")
                .hide_env_values(true)
                .help("Access token for the Gitea instance"),
        )
        .arg(file_arg("api-key-file", "PLUGIN_API_KEY_FILE", "access token"))
        .arg(
            Arg::new("server")
                .long("server")
                .env("PLUGIN_GITEA_SERVER")
                .help("Base URL of the Gitea instance, found from the repository if not set"),
        )
        .arg(
            Arg::new("repo-link")
                .long("repo-link")
                .env("DRONE_REPO_LINK")
                .hide(true),
        )
        .arg(
            Arg::new("git-http-url")
                .long("git-http-url")
                .env("DRONE_GIT_HTTP_URL")
                .hide(true),
        )
        .arg(
            Arg::new("namespace")
                .long("namespace")
                .env("DRONE_REPO_NAMESPACE")
                .help("The user or organization that owns the repository"),
        )
        .arg(
            Arg::new("repo")
                .long("repo")
                .env("DRONE_REPO_NAME")
                .help("The name of the repository"),
        )
        .arg(
            Arg::new("commit")
                .long("commit")
                .env("DRONE_COMMIT")
                .help("The commit to tag if the tag does not exist yet"),
        )
        .arg(
            Arg::new("tag")
                .long("tag")
                .env("PLUGIN_TAG")
                .help("Name of the tag to release"),
        )
        .arg(file_arg("tag-file", "PLUGIN_TAG_FILE", "tag name"))
        .arg(
            Arg::new("title")
                .long("title")
                .env("PLUGIN_TITLE")
                .help("Title of the release"),
        )
        .arg(file_arg("title-file", "PLUGIN_TITLE_FILE", "release title"))
        .arg(
            Arg::new("body")
                .long("body")
                .env("PLUGIN_BODY")
                .help("Release notes"),
        )
        .arg(file_arg("body-file", "PLUGIN_BODY_FILE", "release notes"))
        .arg(
            Arg::new("files")
                .long("files")
                .env("PLUGIN_FILES")
                .help("Comma-separated glob patterns of files to attach to the release"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Pretend to publish, logging what would be sent to Gitea")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Print extra information while publishing")
                .action(ArgAction::SetTrue),
        )
}

fn file_arg(id: &'static str, env: &'static str, what: &str) -> Arg {
    Arg::new(id)
        .long(id)
        .env(env)
        .help(format!("File to read the {what} from, takes priority over the plain value"))
}

#[derive(Debug, Diagnostic, thiserror::Error)]
enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Server(#[from] server::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] integrations::ApiRequestError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Publish(#[from] publish::Error),
}
