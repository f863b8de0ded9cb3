use std::sync::Arc;

use anyhow::{Context, Result};
use mongodb::Client;
use mongodb::bson::doc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::data::post_repository::PostRepository;
use crate::data::repositories::memory::post_repository::MemoryPostRepository;
use crate::data::repositories::mongo::post_repository::MongoPostRepository;
use crate::data::repositories::postgres::post_repository::PostgresPostRepository;
use crate::infrastructure::settings::StorageSettings;

pub(crate) async fn create_pool(conn_string: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(conn_string)
        .await
        .context("failed to connect to PostgreSQL")
}

pub(crate) async fn connect_mongo(conn_string: &str) -> Result<Client> {
    let client = Client::with_uri_str(conn_string)
        .await
        .context("invalid MongoDB connection string")?;

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .context("failed to reach MongoDB")?;

    Ok(client)
}

pub(crate) async fn open_storage(settings: &StorageSettings) -> Result<Arc<dyn PostRepository>> {
    let storage: Arc<dyn PostRepository> = match settings {
        StorageSettings::Postgres {
            conn_string,
            max_connections,
        } => {
            let pool = create_pool(conn_string, *max_connections).await?;
            info!(max_connections, "using PostgreSQL storage");
            Arc::new(PostgresPostRepository::new(pool))
        }
        StorageSettings::Mongo {
            conn_string,
            database,
            collection,
        } => {
            let client = connect_mongo(conn_string).await?;
            info!(%database, %collection, "using MongoDB storage");
            Arc::new(MongoPostRepository::new(client, database, collection))
        }
        StorageSettings::Memory => {
            info!("using in-memory storage");
            Arc::new(MemoryPostRepository::new())
        }
    };

    Ok(storage)
}
