use miette::Diagnostic;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::fs::File;

pub(crate) mod gitea;

/// The release endpoints of a forge that this program needs.
///
/// [`gitea::Client`] talks to a real Gitea instance; tests swap in an in-memory fake.
pub(crate) trait ReleaseApi {
    /// Create a release, returning the handle attachments are uploaded against.
    async fn create_release(&self, options: &ReleaseOptions) -> Result<Release, ApiRequestError>;

    /// Stream `file` to the release identified by `release_id`, naming it `name`.
    async fn create_attachment(
        &self,
        release_id: i64,
        file: File,
        name: &str,
    ) -> Result<Attachment, ApiRequestError>;

    async fn delete_release(&self, release_id: i64) -> Result<(), ApiRequestError>;
}

/// Everything needed to create a release, resolved once from the configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ReleaseOptions {
    pub(crate) tag_name: String,
    /// Commit or branch the tag should point at if it doesn't exist yet
    pub(crate) target_commit: String,
    pub(crate) title: String,
    pub(crate) body: String,
}

#[derive(Serialize)]
struct CreateReleaseInput<'a> {
    tag_name: &'a str,
    target_commitish: &'a str,
    name: &'a str,
    body: &'a str,
    /// true to create a draft (unpublished) release, false to create a published one.
    draft: bool,
    prerelease: bool,
}

impl<'a> From<&'a ReleaseOptions> for CreateReleaseInput<'a> {
    fn from(options: &'a ReleaseOptions) -> Self {
        Self {
            tag_name: &options.tag_name,
            target_commitish: &options.target_commit,
            name: &options.title,
            body: &options.body,
            draft: false,
            prerelease: false,
        }
    }
}

/// The parts of a created release that matter here.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Release {
    pub(crate) id: i64,
    pub(crate) tag_name: String,
    #[serde(default)]
    pub(crate) html_url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Attachment {
    pub(crate) id: i64,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) size: i64,
    #[serde(default)]
    pub(crate) browser_download_url: String,
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum ApiRequestError {
    #[error("Could not set up an HTTP client: {0}")]
    #[diagnostic(
        code(api::client),
        help("This usually means the TLS backend could not be initialized on this machine.")
    )]
    Client(#[source] reqwest::Error),
    #[error("Trouble communicating with {host} while {activity}: {source}")]
    #[diagnostic(
        code(api::request),
        help("Check that the server is reachable from this pipeline.")
    )]
    Request {
        host: String,
        activity: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Got a {status} response from {host} while {activity}: {body}")]
    #[diagnostic(
        code(api::response),
        help(
            "Check that PLUGIN_API_KEY belongs to an account with write access to the repository."
        )
    )]
    Status {
        host: String,
        activity: String,
        status: StatusCode,
        body: String,
    },
    #[error("Trouble decoding the response from {host} while {activity}: {source}")]
    #[diagnostic(
        code(api::decode),
        help(
            "The server answered with something that doesn't look like the Gitea API. Is PLUGIN_GITEA_SERVER pointing at a Gitea instance?"
        )
    )]
    Decode {
        host: String,
        activity: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Could not determine the size of {name}: {source}")]
    #[diagnostic(code(api::file_metadata))]
    FileMetadata {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Turn transport failures and non-success statuses into [`ApiRequestError`]s.
async fn handle_response(
    response: Result<Response, reqwest::Error>,
    host: &str,
    activity: &str,
) -> Result<Response, ApiRequestError> {
    let response = response.map_err(|source| ApiRequestError::Request {
        host: host.to_string(),
        activity: activity.to_string(),
        source,
    })?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiRequestError::Status {
        host: host.to_string(),
        activity: activity.to_string(),
        status,
        body,
    })
}
