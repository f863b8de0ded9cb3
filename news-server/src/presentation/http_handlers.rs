use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::any;
use axum::{Router, middleware};

use super::AppState;
use super::http::middleware::drain::drain_request_body;
use super::http::response::write_empty;
use super::http::routes::{ResourceRouter, posts};

pub(crate) fn routes(state: AppState, body_limit: usize) -> Router {
    let resources = ResourceRouter::new(state.span.clone())
        .with_resource(posts::POSTS_PATH, posts::resource(&state));

    Router::new()
        .route("/", any(ping))
        .fallback(dispatch)
        .with_state(Arc::new(resources))
        .layer(middleware::from_fn_with_state(body_limit, drain_request_body))
}

async fn ping() -> Response {
    write_empty(StatusCode::NO_CONTENT)
}

async fn dispatch(State(resources): State<Arc<ResourceRouter>>, request: Request) -> Response {
    resources.dispatch(request).await
}
