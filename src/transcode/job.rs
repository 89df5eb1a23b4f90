use serde::Deserialize;

/// One transcoding request, parsed from a single queue message.
///
/// `video_id` is unique per upload but the broker only guarantees
/// at-least-once delivery, so the same job may be seen more than once.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscodeJob {
    pub video_id: String,
    pub s3_input_url: String,
    pub input_format: String,
    pub output_format: String,
    #[serde(default)]
    pub video_quality: Option<String>,
}

/// A message that failed to parse. If the payload was at least valid JSON
/// with a `video_id`, that id is salvaged so the failure can still be
/// reported upstream.
#[derive(Debug)]
pub struct ParseFailure {
    pub salvaged_id: Option<String>,
    pub source: serde_json::Error,
}

impl TranscodeJob {
    pub fn from_payload(payload: &[u8]) -> Result<Self, ParseFailure> {
        serde_json::from_slice::<TranscodeJob>(payload).map_err(|source| ParseFailure {
            salvaged_id: salvage_id(payload),
            source,
        })
    }

    /// Requested quality, with empty strings treated as absent.
    pub fn quality(&self) -> Option<&str> {
        self.video_quality
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// Local output file name: `transcoded_video[_<quality>].<format>`.
    pub fn output_file_name(&self) -> String {
        match self.quality() {
            Some(q) => format!("transcoded_video_{}.{}", q, self.output_format),
            None => format!("transcoded_video.{}", self.output_format),
        }
    }

    /// Object key the transcoded file is pushed under. Deterministic per
    /// (id, quality, format) so redeliveries overwrite rather than pile up.
    pub fn output_key(&self) -> String {
        match self.quality() {
            Some(q) => format!(
                "transcoded/{}_transcoded_{}.{}",
                self.video_id, q, self.output_format
            ),
            None => format!("transcoded/{}_transcoded.{}", self.video_id, self.output_format),
        }
    }
}

fn salvage_id(payload: &[u8]) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(payload)
        .ok()?
        .get("video_id")?
        .as_str()
        .map(str::to_string)
}

/// Lifecycle state reported to the status service. Every picked-up job
/// reports `InProgress` once and then exactly one terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    InProgress,
    Completed { output_locator: String },
    Failed { reason: String },
}

impl JobOutcome {
    pub fn status_str(&self) -> &'static str {
        match self {
            JobOutcome::InProgress => "in-progress",
            JobOutcome::Completed { .. } => "completed",
            JobOutcome::Failed { .. } => "failed",
        }
    }

    pub fn locator(&self) -> Option<&str> {
        match self {
            JobOutcome::Completed { output_locator } => Some(output_locator),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobOutcome::InProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(quality: Option<&str>) -> TranscodeJob {
        TranscodeJob {
            video_id: "v1".to_string(),
            s3_input_url: "https://videos.s3.amazonaws.com/v1_clip.mkv".to_string(),
            input_format: "mkv".to_string(),
            output_format: "mp4".to_string(),
            video_quality: quality.map(str::to_string),
        }
    }

    #[test]
    fn parses_complete_message() {
        let payload = br#"{
            "video_id": "abc",
            "s3_input_url": "https://videos.s3.amazonaws.com/abc.mp4",
            "input_format": "mp4",
            "output_format": "mkv",
            "video_quality": "720p"
        }"#;

        let job = TranscodeJob::from_payload(payload).expect("parse job");
        assert_eq!(job.video_id, "abc");
        assert_eq!(job.quality(), Some("720p"));
    }

    #[test]
    fn missing_field_salvages_video_id() {
        let payload = br#"{"video_id": "abc", "output_format": "mp4"}"#;
        let failure = TranscodeJob::from_payload(payload).expect_err("must fail");
        assert_eq!(failure.salvaged_id.as_deref(), Some("abc"));
    }

    #[test]
    fn garbage_payload_salvages_nothing() {
        let failure = TranscodeJob::from_payload(b"not json at all").expect_err("must fail");
        assert!(failure.salvaged_id.is_none());
    }

    #[test]
    fn output_names_include_quality_when_present() {
        let j = job(Some("480p"));
        assert_eq!(j.output_file_name(), "transcoded_video_480p.mp4");
        assert_eq!(j.output_key(), "transcoded/v1_transcoded_480p.mp4");
    }

    #[test]
    fn output_names_omit_quality_when_absent() {
        let j = job(None);
        assert_eq!(j.output_file_name(), "transcoded_video.mp4");
        assert_eq!(j.output_key(), "transcoded/v1_transcoded.mp4");
    }

    #[test]
    fn empty_quality_is_treated_as_absent() {
        assert_eq!(job(Some("")).quality(), None);
        assert_eq!(job(Some("  ")).quality(), None);
        assert_eq!(job(Some("")).output_file_name(), "transcoded_video.mp4");
    }
}
