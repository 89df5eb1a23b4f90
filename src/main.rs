use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;

mod config;
mod infrastructure;
mod state;
mod transcode;
mod workers;

use crate::config::settings::AppConfig;
use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::infrastructure::status::http::StatusClient;
use crate::infrastructure::storage::s3::StorageService;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting transcoder worker...");

    let config = AppConfig::new().context("failed to load configuration from environment")?;

    let storage = StorageService::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_access_key,
        &config.s3_secret_key,
    )
    .await;
    let status = StatusClient::new(&config.status_service_url);
    let queue = RabbitMqService::new(&config.queue_url).await?;

    let state = AppState::new(config, queue, storage, status);

    workers::transcoder::start_transcoder_worker(state).await;

    Ok(())
}
