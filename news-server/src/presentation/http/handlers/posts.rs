use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;

use crate::domain::post::Post;
use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppError, AppResult};
use crate::presentation::http::response::{write_empty, write_response};

#[derive(Debug, Serialize)]
pub(crate) struct ListPostsResponse<'a> {
    pub(crate) data: &'a [Post],
}

pub(crate) async fn list_posts(State(state): State<AppState>) -> AppResult<Response> {
    let posts = state
        .storage
        .list_posts()
        .await
        .map_err(|source| AppError::storage("list", None, source))?;

    Ok(write_response(
        Some(&ListPostsResponse { data: &posts }),
        StatusCode::OK,
    ))
}

pub(crate) async fn create_post(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let post = decode_post(&body)?;
    state
        .storage
        .create_post(post.clone())
        .await
        .map_err(|source| AppError::storage("create", Some(post), source))?;

    Ok(write_empty(StatusCode::CREATED))
}

pub(crate) async fn update_post(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let post = decode_post(&body)?;
    state
        .storage
        .update_post(post.clone())
        .await
        .map_err(|source| AppError::storage("update", Some(post), source))?;

    Ok(write_empty(StatusCode::OK))
}

pub(crate) async fn delete_post(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let post = decode_post(&body)?;
    state
        .storage
        .delete_post(post.clone())
        .await
        .map_err(|source| AppError::storage("delete", Some(post), source))?;

    Ok(write_empty(StatusCode::OK))
}

/// Decodes the first JSON value of the body; anything after it is ignored.
fn decode_post(body: &[u8]) -> AppResult<Post> {
    serde_json::Deserializer::from_slice(body)
        .into_iter::<Post>()
        .next()
        .ok_or(AppError::EmptyBody)?
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, StatusCode, header};

    use super::{ListPostsResponse, decode_post};
    use crate::data::post_repository::PostRepository;
    use crate::data::repositories::memory::post_repository::MemoryPostRepository;
    use crate::data::repositories::memory::post_repository::fixtures::{new_post, seed_posts};
    use crate::domain::error::StorageError;
    use crate::domain::post::{Author, Post};
    use crate::presentation::http::app_error::AppError;
    use crate::presentation::test_support::{body_bytes, send, test_app};

    struct FailingPostRepo;

    #[async_trait]
    impl PostRepository for FailingPostRepo {
        async fn list_posts(&self) -> Result<Vec<Post>, StorageError> {
            Err(StorageError::Unexpected("connection refused".to_string()))
        }

        async fn create_post(&self, _post: Post) -> Result<(), StorageError> {
            Err(StorageError::Unexpected("connection refused".to_string()))
        }

        async fn update_post(&self, _post: Post) -> Result<(), StorageError> {
            Err(StorageError::Unexpected("connection refused".to_string()))
        }

        async fn delete_post(&self, _post: Post) -> Result<(), StorageError> {
            Err(StorageError::Unexpected("connection refused".to_string()))
        }

        async fn close(&self) {}
    }

    fn seeded() -> Arc<MemoryPostRepository> {
        Arc::new(MemoryPostRepository::with_posts(seed_posts()))
    }

    fn json_body(post: &Post) -> Body {
        Body::from(serde_json::to_vec(post).expect("post must serialize"))
    }

    #[tokio::test]
    async fn list_posts_returns_exact_encoding_of_seed() {
        let response = send(test_app(seeded()), Method::GET, "/posts", Body::empty()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let seed = seed_posts();
        let mut want = serde_json::to_vec(&ListPostsResponse { data: &seed })
            .expect("seed must serialize");
        want.push(b'\n');
        assert_eq!(body_bytes(response).await, want);
    }

    #[tokio::test]
    async fn list_posts_wraps_empty_store_in_empty_array() {
        let storage = Arc::new(MemoryPostRepository::new());
        let response = send(test_app(storage), Method::GET, "/posts", Body::empty()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body_bytes(response).await[..], b"{\"data\":[]}\n");
    }

    #[tokio::test]
    async fn create_post_returns_created_and_stores_post() {
        let storage = seeded();
        let response = send(
            test_app(storage.clone()),
            Method::POST,
            "/posts",
            json_body(&new_post()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert!(body_bytes(response).await.is_empty());

        let stored = storage.get_post(99).await.expect("post must be stored");
        assert_eq!(stored.title, "mem db post 99");
        assert_ne!(stored.author.id, 0);

        let listed = storage.list_posts().await.expect("list must succeed");
        assert!(listed.iter().any(|post| post.id == 99));
    }

    #[tokio::test]
    async fn undecodable_bodies_are_internal_errors_for_every_write() {
        let bodies = [r#"{"Id": 5, "Title": "#, "", "not json"];

        for method in [Method::POST, Method::PUT, Method::DELETE] {
            for raw in bodies {
                let storage = seeded();
                let response = send(
                    test_app(storage.clone()),
                    method.clone(),
                    "/posts",
                    Body::from(raw),
                )
                .await;

                assert_eq!(
                    response.status(),
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "{method} {raw:?}"
                );
                assert_eq!(
                    response.headers()[header::CONTENT_TYPE],
                    "text/plain; charset=utf-8"
                );
                assert!(body_bytes(response).await.is_empty(), "{method} {raw:?}");
                assert_eq!(
                    storage.list_posts().await.expect("list"),
                    seed_posts(),
                    "{method} must not touch storage"
                );
            }
        }
    }

    #[tokio::test]
    async fn create_post_with_duplicate_id_is_internal_error() {
        let duplicate = Post {
            id: 1,
            ..new_post()
        };
        let response = send(
            test_app(seeded()),
            Method::POST,
            "/posts",
            json_body(&duplicate),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn update_post_rewrites_existing_record() {
        let storage = seeded();
        let updated = Post {
            id: 1,
            author: Author {
                id: 2,
                name: "Author 2".to_string(),
            },
            title: "Updated title".to_string(),
            content: "Updated content".to_string(),
            created_at: 1_700_000_000,
        };

        let response = send(
            test_app(storage.clone()),
            Method::PUT,
            "/posts",
            json_body(&updated),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
        assert_eq!(storage.get_post(1).await.expect("post must exist"), updated);
    }

    #[tokio::test]
    async fn update_post_for_unknown_id_still_succeeds() {
        let response = send(
            test_app(seeded()),
            Method::PUT,
            "/posts",
            json_body(&new_post()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_post_removes_record() {
        let storage = seeded();
        let target = Post {
            id: 2,
            ..Post::default()
        };

        let response = send(
            test_app(storage.clone()),
            Method::DELETE,
            "/posts",
            json_body(&target),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let err = storage.get_post(2).await.expect_err("post must be gone");
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_post_for_unknown_id_still_succeeds() {
        let response = send(
            test_app(seeded()),
            Method::DELETE,
            "/posts",
            json_body(&new_post()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn storage_failures_become_empty_internal_errors() {
        let cases = [
            (Method::GET, Body::empty()),
            (Method::POST, json_body(&new_post())),
            (Method::PUT, json_body(&new_post())),
            (Method::DELETE, json_body(&new_post())),
        ];

        for (method, body) in cases {
            let response = send(test_app(Arc::new(FailingPostRepo)), method.clone(), "/posts", body).await;

            assert_eq!(
                response.status(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "{method} must fail with 500"
            );
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "text/plain; charset=utf-8"
            );
            assert!(body_bytes(response).await.is_empty(), "{method} must not leak details");
        }
    }

    #[test]
    fn decode_post_ignores_trailing_data() {
        let post = decode_post(br#"{"Id":3,"Title":"t"} {"Id":4}"#).expect("first value must decode");
        assert_eq!(post.id, 3);
        assert_eq!(post.title, "t");
    }

    #[test]
    fn decode_post_rejects_blank_body() {
        let err = decode_post(b"  \n").expect_err("blank body must fail");
        assert!(matches!(err, AppError::EmptyBody));
    }
}
