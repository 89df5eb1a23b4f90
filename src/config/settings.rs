use crate::config::env::{self, EnvKey};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub queue_url: String,
    pub queue_name: String,
    pub status_service_url: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub ffmpeg_path: String,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            queue_url: env::get(EnvKey::QueueUrl)?,
            queue_name: env::get_or(EnvKey::QueueName, "transcoding_tasks"),
            status_service_url: env::get_or(
                EnvKey::StatusServiceUrl,
                "http://127.0.0.1:8000/video_status",
            ),
            s3_endpoint: env::get(EnvKey::S3Endpoint)?,
            s3_region: env::get_or(EnvKey::S3Region, "us-east-1"),
            s3_access_key: env::get(EnvKey::S3AccessKey)?,
            s3_secret_key: env::get(EnvKey::S3SecretKey)?,
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
        })
    }
}
