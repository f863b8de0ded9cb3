use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::data::post_repository::PostRepository;
use crate::domain::error::StorageError;
use crate::domain::post::{Author, Post};

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    created_at: i64,
    author_id: i64,
    author_name: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author: Author {
                id: row.author_id,
                name: row.author_name,
            },
            title: row.title,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, StorageError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                p.id,
                p.title,
                p.content,
                p.created_at,
                a.id AS author_id,
                a.name AS author_name
            FROM posts AS p
            INNER JOIN authors AS a ON p.author_id = a.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn create_post(&self, mut post: Post) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(map_post_db_error)?;

        if post.author.is_unassigned() {
            post.author.id = insert_author(&mut tx, &post.author).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO posts (id, title, content, author_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.author.id)
        .bind(post.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_post_db_error)?;

        tx.commit().await.map_err(map_post_db_error)
    }

    async fn update_post(&self, post: Post) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            UPDATE posts
            SET title = $2,
                content = $3,
                author_id = $4,
                created_at = $5
            WHERE id = $1
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.author.id)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(())
    }

    async fn delete_post(&self, post: Post) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            "#,
        )
        .bind(post.id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

async fn insert_author(
    tx: &mut Transaction<'_, Postgres>,
    author: &Author,
) -> Result<i64, StorageError> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO authors (name)
        VALUES ($1)
        RETURNING id
        "#,
    )
    .bind(&author.name)
    .fetch_one(&mut **tx)
    .await
    .map_err(map_post_db_error)?;

    Ok(id)
}

fn map_post_db_error(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23503") => return StorageError::NotFound("author".to_string()),
            Some("23505") => return StorageError::AlreadyExists("post".to_string()),
            _ => {}
        }
    }
    StorageError::Unexpected(err.to_string())
}

#[cfg(test)]
impl PostgresPostRepository {
    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, StorageError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                p.id,
                p.title,
                p.content,
                p.created_at,
                a.id AS author_id,
                a.name AS author_name
            FROM posts AS p
            INNER JOIN authors AS a ON p.author_id = a.id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        row.map(Post::from)
            .ok_or_else(|| StorageError::NotFound(format!("post id: {id}")))
    }

    pub(crate) async fn reset_fixtures(&self) -> Result<(), StorageError> {
        sqlx::raw_sql(include_str!("../../../../testdata/postgres_reset.sql"))
            .execute(&self.pool)
            .await
            .map_err(map_post_db_error)?;
        Ok(())
    }
}
