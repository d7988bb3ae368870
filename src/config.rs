use std::path::PathBuf;

use clap::ArgMatches;
use tracing::warn;

use crate::{fs, integrations::ReleaseOptions, server};

/// Everything the pipeline step was told, collected once at startup.
///
/// Values normally come from the environment variables a Drone pipeline sets; each one can also
/// be given as a command line flag.
#[derive(Clone, Debug, Default)]
pub(crate) struct Config {
    pub(crate) api_key: FileOrValue,
    pub(crate) server: server::Sources,
    /// The user or organization that owns `repo`
    pub(crate) namespace: String,
    pub(crate) repo: String,
    /// The commit the release's tag should point at
    pub(crate) commit: String,
    pub(crate) tag: FileOrValue,
    pub(crate) title: FileOrValue,
    pub(crate) body: FileOrValue,
    /// Comma-separated glob patterns of files to attach
    pub(crate) files: String,
    pub(crate) dry_run: bool,
    pub(crate) verbose: bool,
}

impl Config {
    pub(crate) fn from_matches(matches: &ArgMatches) -> Self {
        let string = |id: &str| matches.get_one::<String>(id).cloned().unwrap_or_default();
        let optional = |id: &str| {
            matches
                .get_one::<String>(id)
                .filter(|value| !value.trim().is_empty())
                .cloned()
        };
        let file_or_value = |id: &str, file_id: &str| FileOrValue {
            value: optional(id),
            file: optional(file_id).map(PathBuf::from),
        };

        Self {
            api_key: file_or_value("api-key", "api-key-file"),
            server: server::Sources {
                server: optional("server"),
                repo_link: optional("repo-link"),
                git_http_url: optional("git-http-url"),
            },
            namespace: string("namespace"),
            repo: string("repo"),
            commit: string("commit"),
            tag: file_or_value("tag", "tag-file"),
            title: file_or_value("title", "title-file"),
            body: file_or_value("body", "body-file"),
            files: string("files"),
            dry_run: matches.get_flag("dry-run"),
            verbose: matches.get_flag("verbose"),
        }
    }

    pub(crate) fn release_options(&self) -> ReleaseOptions {
        ReleaseOptions {
            tag_name: self.tag.resolve(),
            target_commit: self.commit.clone(),
            title: self.title.resolve(),
            body: self.body.resolve(),
        }
    }
}

/// A value that can be given directly or, for secrets, through a file whose path is given
/// instead (the `_FILE` variant of the variable).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct FileOrValue {
    pub(crate) value: Option<String>,
    pub(crate) file: Option<PathBuf>,
}

impl FileOrValue {
    /// The trimmed file contents if the file can be read, otherwise the plain value.
    ///
    /// Neither being set is not an error, the result is just empty.
    pub(crate) fn resolve(&self) -> String {
        if let Some(path) = &self.file {
            match fs::read_to_string(path.clone()) {
                Ok(contents) => return contents.trim().to_string(),
                Err(err) => warn!("{err}, falling back to the plain value"),
            }
        }
        self.value.clone().unwrap_or_default()
    }
}

/// Details needed to talk to the releases of one repository on a Gitea instance.
#[derive(Clone, Debug, Default)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub(crate) struct Gitea {
    /// The user or organization that owns the `repo`.
    pub(crate) owner: String,
    /// The name of the repository
    pub(crate) repo: String,
    /// Scheme and domain (or IP) of the Gitea instance, without a trailing slash
    pub(crate) host: String,
}

impl Gitea {
    fn get_base_url(&self) -> String {
        format!("{host}/api/v1", host = self.host)
    }

    /// Get the URL to create/list releases
    pub(crate) fn get_releases_url(&self) -> String {
        format!(
            "{base_url}/repos/{owner}/{repo}/releases",
            base_url = self.get_base_url(),
            owner = self.owner,
            repo = self.repo
        )
    }

    /// Get the URL to read/delete a single release
    pub(crate) fn get_release_url(&self, release_id: i64) -> String {
        format!(
            "{releases_url}/{release_id}",
            releases_url = self.get_releases_url()
        )
    }

    /// Get the URL to upload attachments to a release
    pub(crate) fn get_release_assets_url(&self, release_id: i64) -> String {
        format!(
            "{release_url}/assets",
            release_url = self.get_release_url(release_id)
        )
    }
}
