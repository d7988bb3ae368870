use reqwest::{
    Client as HttpClient, RequestBuilder,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use tokio::fs::File;

use super::{ApiRequestError, Attachment, Release, ReleaseApi, ReleaseOptions};
use crate::config;

mod create_attachment;
mod create_release;
mod delete_release;

/// A connection to the release API of a single repository on a Gitea instance.
#[derive(Clone, Debug)]
pub(crate) struct Client {
    http: HttpClient,
    config: config::Gitea,
    token: String,
}

impl Client {
    pub(crate) fn new(config: config::Gitea, token: String) -> Result<Self, ApiRequestError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = HttpClient::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(ApiRequestError::Client)?;
        Ok(Self {
            http,
            config,
            token,
        })
    }

    /// Attach the token, if there is one. An empty token means an anonymous request.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.header(AUTHORIZATION, format!("token {token}", token = self.token))
        }
    }
}

impl ReleaseApi for Client {
    async fn create_release(&self, options: &ReleaseOptions) -> Result<Release, ApiRequestError> {
        create_release::create_release(self, options).await
    }

    async fn create_attachment(
        &self,
        release_id: i64,
        file: File,
        name: &str,
    ) -> Result<Attachment, ApiRequestError> {
        create_attachment::create_attachment(self, release_id, file, name).await
    }

    async fn delete_release(&self, release_id: i64) -> Result<(), ApiRequestError> {
        delete_release::delete_release(self, release_id).await
    }
}
