use anyhow::Result;
use tracing::info_span;

mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use infrastructure::database::open_storage;
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let storage = open_storage(&settings.storage).await?;
    let state = AppState::new(storage.clone(), info_span!("news_server"));

    let served = server::run_http(&settings, state).await;
    storage.close().await;

    served
}
