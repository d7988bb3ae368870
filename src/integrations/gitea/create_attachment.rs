use reqwest::{
    Body,
    multipart::{Form, Part},
};
use tokio::fs::File;
use tracing::debug;

use super::Client;
use crate::integrations::{ApiRequestError, Attachment, handle_response};

/// Upload `file` as the `attachment` field of a multipart form.
///
/// The file is streamed rather than read into memory and is closed once the request finishes,
/// whether or not it succeeded.
pub(super) async fn create_attachment(
    client: &Client,
    release_id: i64,
    file: File,
    name: &str,
) -> Result<Attachment, ApiRequestError> {
    let activity = format!("attaching {name}");
    let length = file
        .metadata()
        .await
        .map_err(|source| ApiRequestError::FileMetadata {
            name: name.to_string(),
            source,
        })?
        .len();
    let part = Part::stream_with_length(Body::from(file), length).file_name(name.to_string());
    let form = Form::new().part("attachment", part);

    let url = client.config.get_release_assets_url(release_id);
    debug!("Uploading {length} bytes to {url}");
    let response = client
        .authorize(client.http.post(&url))
        .query(&[("name", name)])
        .multipart(form)
        .send()
        .await;
    let response = handle_response(response, &client.config.host, &activity).await?;
    response
        .json::<Attachment>()
        .await
        .map_err(|source| ApiRequestError::Decode {
            host: client.config.host.clone(),
            activity,
            source,
        })
}
