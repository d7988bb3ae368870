//! Figure out which Gitea instance to talk to.

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Every place the server address might come from.
#[derive(Clone, Debug, Default)]
pub(crate) struct Sources {
    /// Explicitly configured server (`PLUGIN_GITEA_SERVER`)
    pub(crate) server: Option<String>,
    /// Web link to the repository (`DRONE_REPO_LINK`)
    pub(crate) repo_link: Option<String>,
    /// HTTP clone URL of the repository (`DRONE_GIT_HTTP_URL`)
    pub(crate) git_http_url: Option<String>,
}

/// Resolve the base URL (scheme, host and port only) of the Gitea instance.
///
/// An explicit server always wins and must be valid. Otherwise, the fallbacks are tried in
/// order and the first one that parses to a URL with a scheme and a host is used.
///
/// ## Errors
/// 1. The explicit server is not an absolute URL
/// 2. There is no explicit server and no fallback is an absolute URL
pub(crate) fn resolve(sources: &Sources) -> Result<String, Error> {
    if let Some(server) = &sources.server {
        return base_url(server).ok_or_else(|| Error::InvalidServer {
            value: server.clone(),
        });
    }

    let fallbacks = [
        ("DRONE_REPO_LINK", &sources.repo_link),
        ("DRONE_GIT_HTTP_URL", &sources.git_http_url),
    ];
    for (name, candidate) in fallbacks {
        let Some(candidate) = candidate else {
            continue;
        };
        if let Some(base) = base_url(candidate) {
            debug!("Using the server from {name}");
            return Ok(base);
        }
        debug!("{name} ({candidate}) is not an absolute URL, skipping it");
    }
    Err(Error::NotFound)
}

fn base_url(candidate: &str) -> Option<String> {
    let url = Url::parse(candidate.trim()).ok()?;
    let host = url.host_str().filter(|host| !host.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}", scheme = url.scheme()),
        None => format!("{scheme}://{host}", scheme = url.scheme()),
    })
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("Unable to parse {value} as the Gitea server")]
    #[diagnostic(
        code(server::invalid),
        help("PLUGIN_GITEA_SERVER must be an absolute URL like https://gitea.example.com")
    )]
    InvalidServer { value: String },
    #[error("Unable to find the Gitea server in the environment")]
    #[diagnostic(
        code(server::not_found),
        help(
            "Set PLUGIN_GITEA_SERVER, or run inside a pipeline that sets DRONE_REPO_LINK or DRONE_GIT_HTTP_URL"
        )
    )]
    NotFound,
}
