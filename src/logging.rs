//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The number of bytes of a body logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(body_bytes) => body_bytes,
        Err(error) => {
            tracing::error!("could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    log_body(
        &format!("Received request: {parts:#?}"),
        &String::from_utf8_lossy(&body_bytes),
    );

    let response = next
        .run(Request::from_parts(parts, Body::from(body_bytes)))
        .await;

    let (parts, body) = response.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(body_bytes) => body_bytes,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_body(
        &format!("Sending response: {parts:#?}"),
        &String::from_utf8_lossy(&body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Result<Bytes, axum::Error> {
    axum::body::to_bytes(body, usize::MAX).await
}

fn log_body(headline: &str, body: &str) {
    match truncate(body, LOG_BODY_LENGTH_LIMIT) {
        Some(truncated) => {
            tracing::info!("{headline}\nbody: {truncated}...");
            tracing::debug!("Full body: {body:?}");
        }
        None => tracing::info!("{headline}\nbody: {body:?}"),
    }
}

/// The longest prefix of `text` within `limit` bytes, or `None` if `text`
/// already fits.
fn truncate(text: &str, limit: usize) -> Option<&str> {
    if text.len() <= limit {
        return None;
    }

    let end = text
        .char_indices()
        .map(|(index, _)| index)
        .take_while(|&index| index <= limit)
        .last()
        .unwrap_or(0);

    Some(&text[..end])
}
