use tracing::debug;

use super::Client;
use crate::integrations::{ApiRequestError, handle_response};

pub(super) async fn delete_release(client: &Client, release_id: i64) -> Result<(), ApiRequestError> {
    let url = client.config.get_release_url(release_id);
    debug!("Deleting release at {url}");
    let response = client.authorize(client.http.delete(&url)).send().await;
    handle_response(response, &client.config.host, "deleting a release").await?;
    Ok(())
}
