use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};

use crate::data::post_repository::PostRepository;
use crate::domain::error::StorageError;
use crate::domain::post::{Author, Post};

const COUNTERS_COLLECTION: &str = "counters";
const AUTHOR_COUNTER_ID: &str = "authors";

#[derive(Debug, Clone)]
pub(crate) struct MongoPostRepository {
    client: Client,
    database_name: String,
    collection_name: String,
}

impl MongoPostRepository {
    pub(crate) fn new(
        client: Client,
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            database_name: database_name.into(),
            collection_name: collection_name.into(),
        }
    }

    fn database(&self) -> Database {
        self.client.database(&self.database_name)
    }

    fn posts(&self) -> Collection<PostDocument> {
        self.database().collection(&self.collection_name)
    }

    async fn highest_author_id(&self) -> Result<i64, StorageError> {
        let newest = self
            .posts()
            .find_one(doc! {})
            .sort(doc! { "author._id": -1 })
            .await
            .map_err(map_mongo_error)?;

        Ok(newest.map_or(0, |document| document.author.id))
    }

    async fn next_author_id(&self) -> Result<i64, StorageError> {
        let counters = self
            .database()
            .collection::<CounterDocument>(COUNTERS_COLLECTION);

        // The counter may be missing or behind ids that callers supplied.
        counters
            .update_one(
                doc! { "_id": AUTHOR_COUNTER_ID },
                doc! { "$max": { "seq": self.highest_author_id().await? } },
            )
            .upsert(true)
            .await
            .map_err(map_mongo_error)?;

        let counter = counters
            .find_one_and_update(
                doc! { "_id": AUTHOR_COUNTER_ID },
                doc! { "$inc": { "seq": 1_i64 } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_mongo_error)?
            .ok_or_else(|| StorageError::Unexpected("author counter was not returned".to_string()))?;

        Ok(counter.seq)
    }

    async fn upsert(&self, post: Post) -> Result<(), StorageError> {
        let document = PostDocument::from(post);
        self.posts()
            .replace_one(doc! { "_id": document.id }, &document)
            .upsert(true)
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PostDocument {
    #[serde(rename = "_id")]
    id: i64,
    author: AuthorDocument,
    title: String,
    content: String,
    created_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthorDocument {
    #[serde(rename = "_id")]
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CounterDocument {
    seq: i64,
}

impl From<Post> for PostDocument {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author: AuthorDocument {
                id: post.author.id,
                name: post.author.name,
            },
            title: post.title,
            content: post.content,
            created_at: post.created_at,
        }
    }
}

impl From<PostDocument> for Post {
    fn from(document: PostDocument) -> Self {
        Self {
            id: document.id,
            author: Author {
                id: document.author.id,
                name: document.author.name,
            },
            title: document.title,
            content: document.content,
            created_at: document.created_at,
        }
    }
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, StorageError> {
        let mut cursor = self.posts().find(doc! {}).await.map_err(map_mongo_error)?;

        let mut posts = Vec::new();
        while cursor.advance().await.map_err(map_mongo_error)? {
            let document = cursor.deserialize_current().map_err(map_mongo_error)?;
            posts.push(Post::from(document));
        }
        Ok(posts)
    }

    // Posts are upserted: an existing id is overwritten rather than rejected.
    async fn create_post(&self, mut post: Post) -> Result<(), StorageError> {
        if post.author.is_unassigned() {
            post.author.id = self.next_author_id().await?;
        }
        self.upsert(post).await
    }

    async fn update_post(&self, post: Post) -> Result<(), StorageError> {
        self.upsert(post).await
    }

    async fn delete_post(&self, post: Post) -> Result<(), StorageError> {
        self.posts()
            .delete_one(doc! { "_id": post.id })
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}

fn map_mongo_error(err: mongodb::error::Error) -> StorageError {
    StorageError::Unexpected(err.to_string())
}

#[cfg(test)]
impl MongoPostRepository {
    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, StorageError> {
        self.posts()
            .find_one(doc! { "_id": id })
            .await
            .map_err(map_mongo_error)?
            .map(Post::from)
            .ok_or_else(|| StorageError::NotFound(format!("post id: {id}")))
    }

    pub(crate) async fn reset_fixtures(&self) -> Result<(), StorageError> {
        use mongodb::bson::Document;

        self.database().drop().await.map_err(map_mongo_error)?;

        let fixtures = [
            Post {
                id: 1,
                author: Author {
                    id: 1,
                    name: "Author 1".to_string(),
                },
                title: "mongo post 1".to_string(),
                content: "Lorem ipsum".to_string(),
                created_at: 1_652_431_685,
            },
            Post {
                id: 2,
                author: Author {
                    id: 2,
                    name: "Author 2".to_string(),
                },
                title: "mongo post 2".to_string(),
                content: "Lorem ipsum".to_string(),
                created_at: 1_652_431_703,
            },
        ];
        self.posts()
            .insert_many(fixtures.into_iter().map(PostDocument::from))
            .await
            .map_err(map_mongo_error)?;

        self.database()
            .collection::<Document>(COUNTERS_COLLECTION)
            .insert_one(doc! { "_id": AUTHOR_COUNTER_ID, "seq": 2_i64 })
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }
}
