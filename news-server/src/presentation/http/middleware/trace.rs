use axum::Router;
use axum::extract::Request;
use tower_http::trace::TraceLayer;
use tracing::info_span;

pub(crate) fn apply_trace(router: Router) -> Router {
    router.layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
        info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
        )
    }))
}
