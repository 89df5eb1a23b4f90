use crate::state::AppState;
use crate::transcode::engine::FfmpegEngine;
use crate::transcode::pipeline::JobPipeline;
use futures_util::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

pub async fn start_transcoder_worker(state: AppState) {
    info!("🎥 Starting transcoder worker...");

    let channel = state.queue.get_channel().await;
    let channel_guard = channel.lock().await;

    let queue_name = state.config.queue_name.clone();

    channel_guard
        .queue_declare(
            &queue_name,
            QueueDeclareOptions {
                durable: true,
                ..QueueDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await
        .expect("Failed to declare queue");

    let mut consumer = channel_guard
        .basic_consume(
            &queue_name,
            "transcoder_worker",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .expect("Failed to create consumer");

    drop(channel_guard);

    let pipeline = JobPipeline::new(
        Arc::new(state.storage.clone()),
        Arc::new(FfmpegEngine::new(&state.config.ffmpeg_path)),
        Arc::new(state.status.clone()),
    );

    info!("🎥 Transcoder worker listening on '{}'", queue_name);

    // One message at a time: ffmpeg is CPU-bound, and jobs share no state.
    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(d) => d,
            Err(e) => {
                error!("Consumer error: {}", e);
                continue;
            }
        };

        // Attempt id distinguishes redeliveries of the same job in logs.
        let attempt = Uuid::new_v4();
        info!(%attempt, "📦 Received queue message");

        match pipeline.process(&delivery.data).await {
            Some(outcome) => {
                info!(%attempt, status = outcome.status_str(), "Job reached terminal state")
            }
            None => error!(%attempt, "Message dropped without a job id"),
        }

        // Ack regardless of outcome: the job is terminal either way, and
        // redelivery policy belongs to the broker, not this worker.
        if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
            error!(%attempt, "Failed to ack message: {}", e);
        }
    }
}
