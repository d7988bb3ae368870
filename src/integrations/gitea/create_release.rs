use tracing::debug;

use super::Client;
use crate::integrations::{
    ApiRequestError, CreateReleaseInput, Release, ReleaseOptions, handle_response,
};

pub(super) async fn create_release(
    client: &Client,
    options: &ReleaseOptions,
) -> Result<Release, ApiRequestError> {
    const ACTIVITY: &str = "creating a release";
    let url = client.config.get_releases_url();
    debug!("Creating release {tag} at {url}", tag = options.tag_name);

    let response = client
        .authorize(client.http.post(&url))
        .json(&CreateReleaseInput::from(options))
        .send()
        .await;
    let response = handle_response(response, &client.config.host, ACTIVITY).await?;
    response
        .json::<Release>()
        .await
        .map_err(|source| ApiRequestError::Decode {
            host: client.config.host.clone(),
            activity: ACTIVITY.to_string(),
            source,
        })
}
