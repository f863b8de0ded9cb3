use async_trait::async_trait;

use crate::domain::error::StorageError;
use crate::domain::post::Post;

/// Persistence contract shared by every backend. Implementations own their
/// synchronization; callers hold no locks around these calls.
#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    /// Every stored post. Ordering is up to the backend.
    async fn list_posts(&self) -> Result<Vec<Post>, StorageError>;

    /// Stores a new post. When `post.author.id` is `0` the author is created
    /// first and the post is stored with the freshly assigned id; a non-zero
    /// author id is reused as is.
    async fn create_post(&self, post: Post) -> Result<(), StorageError>;

    /// Replaces the post with the same id. Whether an unknown id is reported
    /// is backend-defined.
    async fn update_post(&self, post: Post) -> Result<(), StorageError>;

    /// Removes the post with the same id. An unknown id is not an error.
    async fn delete_post(&self, post: Post) -> Result<(), StorageError>;

    /// Releases connections. Called once at shutdown.
    async fn close(&self);
}
