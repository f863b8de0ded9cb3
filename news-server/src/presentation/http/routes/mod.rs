use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;

use axum::extract::Request;
use axum::handler::Handler;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower::util::BoxCloneSyncService;
use tracing::{Instrument, Span, error};

use crate::presentation::AppState;
use crate::presentation::http::app_error::AppError;
use crate::presentation::http::response::write_empty;

pub(crate) mod posts;

pub(crate) type BoxedHandler = BoxCloneSyncService<Request, Response, Infallible>;

pub(crate) fn boxed<H, T>(handler: H, state: &AppState) -> BoxedHandler
where
    H: Handler<T, AppState>,
    T: 'static,
{
    BoxCloneSyncService::new(handler.with_state(state.clone()))
}

/// Methods accepted by one resource. Keys are method names, so iteration
/// yields them sorted. A `None` entry is a method that is allowed but was
/// never given a handler.
#[derive(Clone, Default)]
pub(crate) struct Resource {
    methods: BTreeMap<String, Option<BoxedHandler>>,
}

impl Resource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bind(mut self, method: Method, handler: Option<BoxedHandler>) -> Self {
        self.methods.insert(method.as_str().to_string(), handler);
        self
    }

    pub(crate) fn allowed_methods(&self) -> String {
        self.methods
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Static resource table, built once at startup.
pub(crate) struct ResourceRouter {
    resources: HashMap<&'static str, Resource>,
    span: Span,
}

impl ResourceRouter {
    pub(crate) fn new(span: Span) -> Self {
        Self {
            resources: HashMap::new(),
            span,
        }
    }

    pub(crate) fn with_resource(mut self, path: &'static str, resource: Resource) -> Self {
        self.resources.insert(path, resource);
        self
    }

    pub(crate) async fn dispatch(&self, request: Request) -> Response {
        self.route(request).instrument(self.span.clone()).await
    }

    async fn route(&self, request: Request) -> Response {
        let path = request.uri().path().to_string();
        let Some(resource) = self.resources.get(path.as_str()) else {
            return AppError::NotFound(path).into_response();
        };

        let method = request.method().clone();
        match resource.methods.get(method.as_str()) {
            Some(Some(handler)) => match handler.clone().oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            },
            Some(None) => AppError::MissingHandler { method, path }.into_response(),
            None if method == Method::OPTIONS => allow_response(resource),
            None => AppError::MethodNotAllowed { method, path }.into_response(),
        }
    }
}

fn allow_response(resource: &Resource) -> Response {
    let mut response = write_empty(StatusCode::OK);
    match HeaderValue::from_str(&resource.allowed_methods()) {
        Ok(allow) => {
            response.headers_mut().insert(header::ALLOW, allow);
        }
        Err(err) => error!(error = %err, "allowed methods do not form a valid header"),
    }
    response
}
