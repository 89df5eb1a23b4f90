use thiserror::Error;

/// Per-job failure taxonomy. All variants are terminal for the job in
/// hand and collapse into one `failed` status on the wire; the kind tag
/// only reaches the operational logs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed job message: {0}")]
    Parse(serde_json::Error),
    #[error("failed to fetch source video: {0:#}")]
    Fetch(anyhow::Error),
    #[error("transcoding failed: {0:#}")]
    Encode(anyhow::Error),
    #[error("failed to upload transcoded video: {0:#}")]
    Upload(anyhow::Error),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Parse(_) => "parse",
            PipelineError::Fetch(_) => "fetch",
            PipelineError::Encode(_) => "encode",
            PipelineError::Upload(_) => "upload",
        }
    }
}
