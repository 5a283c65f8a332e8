use crate::{resource::FileResource, storage::StorageError, utils::app_error::AppError, Environment};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use futures::{stream, StreamExt, TryStreamExt};
use time::OffsetDateTime;
use tokio_util::io::ReaderStream;
use tracing::info;

/// Serves the file shared under `access_token`.
///
/// Only shares that exist, have not expired and point at an `EXTERNAL` file are served.
/// When the store can sign URLs the client is redirected there, otherwise the bytes are
/// streamed through.
pub async fn run(
    Path(access_token): Path<String>,
    State(env): State<Environment>,
) -> Result<Response, AppError> {
    info!("resolving access token {}", access_token);

    let share = env
        .external_files
        .get_by_access_token(&access_token)
        .await?
        .ok_or_else(|| AppError::NotFound(access_token.clone()))?;

    if share.is_expired(OffsetDateTime::now_utc()) {
        return Err(AppError::Expired);
    }

    if !share.is_public() {
        return Err(AppError::Forbidden);
    }

    let file_resource = share.file_resource;

    if let Some(uri) = env.files.signed_get_uri(&file_resource.uid).await? {
        info!(uid = %file_resource.uid, "redirecting to signed uri");
        return Ok(Redirect::temporary(uri.as_str()).into_response());
    }

    let mut content = ReaderStream::new(env.files.open_content(&file_resource).await?);

    // nothing is sent before the first chunk is in hand, so early read failures still become a 500
    let first = match content.next().await {
        Some(Ok(chunk)) => Some(chunk),
        Some(Err(error)) => return Err(StorageError::from_read(error).into()),
        None => None,
    };
    info!(uid = %file_resource.uid, bytes = file_resource.content_length, "streaming content");

    let uid = file_resource.uid.clone();
    let stream = stream::iter(first.map(Ok))
        .chain(content)
        .inspect_err(move |error| {
            tracing::error!(%uid, %error, "failed streaming content, aborting response");
        });

    Ok((headers(&file_resource), Body::from_stream(stream)).into_response())
}

fn headers(file_resource: &FileResource) -> [(header::HeaderName, HeaderValue); 3] {
    let content_type = HeaderValue::from_str(&file_resource.content_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));

    [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_LENGTH, HeaderValue::from(file_resource.content_length)),
        (header::CONTENT_DISPOSITION, disposition(&file_resource.name)),
    ]
}

fn disposition(name: &str) -> HeaderValue {
    let name: String = name
        .chars()
        .map(|c| match c {
            ' '..='~' => c,
            _ => '_',
        })
        .collect();

    HeaderValue::from_str(&format!("filename={name}"))
        .unwrap_or(HeaderValue::from_static("attachment"))
}
