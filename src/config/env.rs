use std::env;

pub enum EnvKey {
    QueueUrl,
    QueueName,
    StatusServiceUrl,
    S3Endpoint,
    S3Region,
    S3AccessKey,
    S3SecretKey,
    FfmpegPath,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::QueueUrl => "RABBITMQ_URL",
            EnvKey::QueueName => "TRANSCODE_QUEUE",
            EnvKey::StatusServiceUrl => "STATUS_SERVICE_URL",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::S3Region => "AWS_REGION",
            EnvKey::S3AccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::S3SecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}
