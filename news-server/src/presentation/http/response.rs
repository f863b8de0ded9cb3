use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use serde::Serialize;
use tracing::error;

const JSON_CONTENT_TYPE: &str = "application/json";
const PLAIN_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Writes `payload` as a JSON document followed by a newline, or an empty
/// plain-text body when there is no payload. Encoding failures are logged and
/// the status is still sent, with an empty body.
pub(crate) fn write_response<T>(payload: Option<&T>, status: StatusCode) -> Response
where
    T: Serialize + ?Sized,
{
    let Some(payload) = payload else {
        return write_empty(status);
    };

    let body = match serde_json::to_vec(payload) {
        Ok(mut body) => {
            body.push(b'\n');
            body
        }
        Err(err) => {
            error!(error = %err, %status, "error encoding response");
            Vec::new()
        }
    };

    let length = body.len();
    let mut response = build(status, JSON_CONTENT_TYPE, Body::from(body));
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    response
}

pub(crate) fn write_empty(status: StatusCode) -> Response {
    build(status, PLAIN_CONTENT_TYPE, Body::empty())
}

fn build(status: StatusCode, content_type: &'static str, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}
