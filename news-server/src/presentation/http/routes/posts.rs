use axum::http::Method;

use super::{BoxedHandler, Resource, boxed};
use crate::presentation::AppState;
use crate::presentation::http::handlers::posts::{
    create_post, delete_post, list_posts, update_post,
};

pub(crate) const POSTS_PATH: &str = "/posts";

const POSTS_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

pub(crate) fn resource(state: &AppState) -> Resource {
    POSTS_METHODS.iter().fold(Resource::new(), |resource, method| {
        resource.bind(method.clone(), handler_for(method, state))
    })
}

fn handler_for(method: &Method, state: &AppState) -> Option<BoxedHandler> {
    match method.as_str() {
        "GET" => Some(boxed(list_posts, state)),
        "POST" => Some(boxed(create_post, state)),
        "PUT" => Some(boxed(update_post, state)),
        "DELETE" => Some(boxed(delete_post, state)),
        _ => None,
    }
}
