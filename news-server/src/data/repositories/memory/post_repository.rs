use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::data::post_repository::PostRepository;
use crate::domain::error::StorageError;
use crate::domain::post::Post;

#[derive(Debug, Default)]
pub(crate) struct MemoryPostRepository {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    posts: BTreeMap<i64, Post>,
    last_author_id: i64,
}

impl MemoryState {
    /// Keeps allocation ahead of every author id a caller supplied.
    fn observe_author(&mut self, author_id: i64) {
        self.last_author_id = self.last_author_id.max(author_id);
    }
}

impl MemoryPostRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, StorageError> {
        let state = self.state.read().await;
        Ok(state.posts.values().cloned().collect())
    }

    async fn create_post(&self, mut post: Post) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        if state.posts.contains_key(&post.id) {
            return Err(StorageError::AlreadyExists(format!("post id: {}", post.id)));
        }

        if post.author.is_unassigned() {
            state.last_author_id += 1;
            post.author.id = state.last_author_id;
        } else {
            state.observe_author(post.author.id);
        }

        state.posts.insert(post.id, post);
        Ok(())
    }

    async fn update_post(&self, post: Post) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        let author_id = post.author.id;
        if let Some(stored) = state.posts.get_mut(&post.id) {
            *stored = post;
            state.observe_author(author_id);
        }
        Ok(())
    }

    async fn delete_post(&self, post: Post) -> Result<(), StorageError> {
        self.state.write().await.posts.remove(&post.id);
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
impl MemoryPostRepository {
    pub(crate) fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let posts: BTreeMap<i64, Post> = posts.into_iter().map(|post| (post.id, post)).collect();
        let last_author_id = posts
            .values()
            .map(|post| post.author.id)
            .max()
            .unwrap_or(0);

        Self {
            state: RwLock::new(MemoryState {
                posts,
                last_author_id,
            }),
        }
    }

    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, StorageError> {
        self.state
            .read()
            .await
            .posts
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("post id: {id}")))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::post::{Author, Post};

    pub(crate) fn seed_posts() -> Vec<Post> {
        vec![
            Post {
                id: 1,
                author: Author {
                    id: 1,
                    name: "Author 1".to_string(),
                },
                title: "mem db post 1".to_string(),
                content: "Lorem ipsum".to_string(),
                created_at: 1_652_431_685,
            },
            Post {
                id: 2,
                author: Author {
                    id: 2,
                    name: "Author 2".to_string(),
                },
                title: "mem db post 2".to_string(),
                content: "Lorem ipsum".to_string(),
                created_at: 1_652_431_703,
            },
        ]
    }

    pub(crate) fn new_post() -> Post {
        Post {
            id: 99,
            author: Author::default(),
            title: "mem db post 99".to_string(),
            content: "Lorem ipsum".to_string(),
            created_at: 0,
        }
    }
}
