use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;

use crate::presentation::http::app_error::{AppError, AppResult};

/// Reads the whole request body before routing, so the connection can be
/// reused whatever the handler does with it. A body over `limit` is still read
/// to the end, then refused.
pub(crate) async fn drain_request_body(
    State(limit): State<usize>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    match drain(body, limit).await {
        Ok(bytes) => next.run(Request::from_parts(parts, Body::from(bytes))).await,
        Err(err) => err.into_response(),
    }
}

async fn drain(body: Body, limit: usize) -> AppResult<Bytes> {
    let mut stream = body.into_data_stream();
    let mut buffered = Vec::new();
    let mut overflowed = false;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(AppError::RequestBody)?;
        if overflowed {
            continue;
        }
        if buffered.len() + chunk.len() > limit {
            overflowed = true;
            buffered = Vec::new();
            continue;
        }
        buffered.extend_from_slice(&chunk);
    }

    if overflowed {
        return Err(AppError::BodyTooLarge { limit });
    }
    Ok(Bytes::from(buffered))
}
