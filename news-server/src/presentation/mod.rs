use std::sync::Arc;

use tracing::Span;

use crate::data::post_repository::PostRepository;

pub(crate) mod http;
pub(crate) mod http_handlers;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) storage: Arc<dyn PostRepository>,
    /// Logging context every request is handled in.
    pub(crate) span: Span,
}

impl AppState {
    pub(crate) fn new(storage: Arc<dyn PostRepository>, span: Span) -> Self {
        Self { storage, span }
    }
}
