use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::storage::models::Media;

/// Raw media bytes with the stored content type.
pub fn media_response(media: Media) -> Response {
    let byte_size = media.data.len() as u64;
    let mut response = (StatusCode::OK, media.data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        media
            .mime
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(byte_size));

    // Media is mutable through updates.
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-cache"),
    );

    response
}
