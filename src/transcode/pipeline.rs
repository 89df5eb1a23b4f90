use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::infrastructure::storage::s3::ObjectLocation;
use crate::transcode::error::PipelineError;
use crate::transcode::job::{JobOutcome, TranscodeJob};
use crate::transcode::params::{self, EncodeSpec};

/// Blob storage seam: fetch a source object to a local path, push a local
/// file under a key. Implementations keep no filesystem state between calls.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn fetch(&self, location: &ObjectLocation, dest: &Path) -> Result<()>;
    async fn push(&self, local: &Path, location: &ObjectLocation) -> Result<String>;
}

/// External encoder seam: run one encode against local files.
#[async_trait]
pub trait EncodingEngine: Send + Sync {
    async fn run(&self, spec: &EncodeSpec, input: &Path, output: &Path) -> Result<()>;
}

/// Status service seam. Delivery is best-effort; callers log failures and
/// move on.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn notify(&self, job_id: &str, outcome: &JobOutcome) -> Result<()>;
}

/// Turns one queue message into one transcoding outcome.
///
/// Stages run strictly in order; the first failure short-circuits to a
/// `failed` report. Whatever happens, the per-job scratch directory is
/// deleted before control returns, and exactly one terminal status is
/// reported for any message that carried a job id.
pub struct JobPipeline {
    store: Arc<dyn ArtifactStore>,
    engine: Arc<dyn EncodingEngine>,
    reporter: Arc<dyn StatusReporter>,
}

impl JobPipeline {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        engine: Arc<dyn EncodingEngine>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            store,
            engine,
            reporter,
        }
    }

    /// Processes one raw queue payload to a terminal outcome. Returns
    /// `None` only when the message was unparseable and carried no
    /// salvageable job id, leaving nothing to report against.
    pub async fn process(&self, payload: &[u8]) -> Option<JobOutcome> {
        let job = match TranscodeJob::from_payload(payload) {
            Ok(job) => job,
            Err(failure) => {
                let err = PipelineError::Parse(failure.source);
                let Some(job_id) = failure.salvaged_id else {
                    error!("❌ Dropping job message without video_id: {err}");
                    return None;
                };
                error!(job_id = %job_id, kind = err.kind(), "❌ {err}");
                let outcome = JobOutcome::Failed {
                    reason: err.to_string(),
                };
                self.report(&job_id, &outcome).await;
                return Some(outcome);
            }
        };

        info!(
            job_id = %job.video_id,
            input = %job.input_format,
            target = %job.output_format,
            quality = job.quality(),
            "📦 Picked up transcoding job"
        );

        self.report(&job.video_id, &JobOutcome::InProgress).await;

        let outcome = match self.run_stages(&job).await {
            Ok(locator) => {
                info!(job_id = %job.video_id, locator = %locator, "✅ Transcoding completed");
                JobOutcome::Completed {
                    output_locator: locator,
                }
            }
            Err(err) => {
                error!(job_id = %job.video_id, kind = err.kind(), "❌ {err}");
                JobOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        self.report(&job.video_id, &outcome).await;
        Some(outcome)
    }

    async fn run_stages(&self, job: &TranscodeJob) -> Result<String, PipelineError> {
        let source =
            ObjectLocation::from_url(&job.s3_input_url).map_err(PipelineError::Fetch)?;

        // Per-job scratch dir, removed on drop on every exit path.
        let workdir = tempfile::Builder::new()
            .prefix(&format!("transcode-{}-", sanitize(&job.video_id)))
            .tempdir()
            .map_err(|e| PipelineError::Fetch(e.into()))?;

        let input_path = workdir.path().join(format!("input.{}", job.input_format));
        self.store
            .fetch(&source, &input_path)
            .await
            .map_err(PipelineError::Fetch)?;
        info!(job_id = %job.video_id, path = %input_path.display(), "⬇️ Downloaded source video");

        let spec = params::resolve(&job.input_format, &job.output_format, job.quality());
        let output_path = workdir.path().join(job.output_file_name());

        self.engine
            .run(&spec, &input_path, &output_path)
            .await
            .map_err(PipelineError::Encode)?;

        let dest = ObjectLocation::new(source.bucket.as_str(), job.output_key());
        let locator = self
            .store
            .push(&output_path, &dest)
            .await
            .map_err(PipelineError::Upload)?;

        Ok(locator)
    }

    async fn report(&self, job_id: &str, outcome: &JobOutcome) {
        // Status delivery never decides the job outcome.
        if let Err(err) = self.reporter.notify(job_id, outcome).await {
            warn!(job_id, status = outcome.status_str(), "Status report failed: {err:#}");
        }
    }
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        fail_fetch: bool,
        fetched: Mutex<Vec<PathBuf>>,
        pushed: Mutex<Vec<(PathBuf, ObjectLocation)>>,
    }

    #[async_trait]
    impl ArtifactStore for FakeStore {
        async fn fetch(&self, _location: &ObjectLocation, dest: &Path) -> Result<()> {
            if self.fail_fetch {
                anyhow::bail!("no such object");
            }
            fs::write(dest, b"source video bytes")?;
            self.fetched.lock().unwrap().push(dest.to_path_buf());
            Ok(())
        }

        async fn push(&self, local: &Path, location: &ObjectLocation) -> Result<String> {
            anyhow::ensure!(local.exists(), "output file missing");
            self.pushed
                .lock()
                .unwrap()
                .push((local.to_path_buf(), location.clone()));
            Ok(location.public_url())
        }
    }

    #[derive(Default)]
    struct FakeEngine {
        fail: bool,
        runs: Mutex<Vec<(PathBuf, PathBuf)>>,
    }

    #[async_trait]
    impl EncodingEngine for FakeEngine {
        async fn run(&self, _spec: &EncodeSpec, input: &Path, output: &Path) -> Result<()> {
            self.runs
                .lock()
                .unwrap()
                .push((input.to_path_buf(), output.to_path_buf()));
            if self.fail {
                anyhow::bail!("ffmpeg exited with exit status: 1");
            }
            fs::write(output, b"transcoded bytes")?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        fail: bool,
        reports: Mutex<Vec<(String, String, Option<String>)>>,
    }

    #[async_trait]
    impl StatusReporter for RecordingReporter {
        async fn notify(&self, job_id: &str, outcome: &JobOutcome) -> Result<()> {
            self.reports.lock().unwrap().push((
                job_id.to_string(),
                outcome.status_str().to_string(),
                outcome.locator().map(str::to_string),
            ));
            if self.fail {
                anyhow::bail!("status service returned 500");
            }
            Ok(())
        }
    }

    fn pipeline(
        store: &Arc<FakeStore>,
        engine: &Arc<FakeEngine>,
        reporter: &Arc<RecordingReporter>,
    ) -> JobPipeline {
        JobPipeline::new(store.clone(), engine.clone(), reporter.clone())
    }

    fn message() -> Vec<u8> {
        serde_json::json!({
            "video_id": "v1",
            "s3_input_url": "https://videos.s3.amazonaws.com/uploads/v1_source.mp4",
            "input_format": "mp4",
            "output_format": "mp4",
            "video_quality": "480p"
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn happy_path_reports_completed_with_locator() {
        let store = Arc::new(FakeStore::default());
        let engine = Arc::new(FakeEngine::default());
        let reporter = Arc::new(RecordingReporter::default());

        let outcome = pipeline(&store, &engine, &reporter)
            .process(&message())
            .await
            .expect("outcome");

        assert_eq!(
            outcome,
            JobOutcome::Completed {
                output_locator:
                    "https://videos.s3.amazonaws.com/transcoded/v1_transcoded_480p.mp4".to_string(),
            }
        );

        let reports = reporter.reports.lock().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].1, "in-progress");
        assert_eq!(reports[1].1, "completed");
        assert_eq!(
            reports[1].2.as_deref(),
            Some("https://videos.s3.amazonaws.com/transcoded/v1_transcoded_480p.mp4")
        );

        let pushed = store.pushed.lock().unwrap();
        assert_eq!(pushed[0].1.key, "transcoded/v1_transcoded_480p.mp4");
        assert_eq!(pushed[0].1.bucket, "videos");
        assert!(
            pushed[0]
                .0
                .file_name()
                .is_some_and(|n| n == "transcoded_video_480p.mp4")
        );
    }

    #[tokio::test]
    async fn temp_files_are_removed_after_success() {
        let store = Arc::new(FakeStore::default());
        let engine = Arc::new(FakeEngine::default());
        let reporter = Arc::new(RecordingReporter::default());

        pipeline(&store, &engine, &reporter)
            .process(&message())
            .await
            .expect("outcome");

        let fetched = store.fetched.lock().unwrap();
        let runs = engine.runs.lock().unwrap();
        assert!(!fetched[0].exists(), "input temp file left behind");
        assert!(!runs[0].1.exists(), "output temp file left behind");
    }

    #[tokio::test]
    async fn encode_failure_reports_failed_once_and_cleans_up() {
        let store = Arc::new(FakeStore::default());
        let engine = Arc::new(FakeEngine {
            fail: true,
            ..Default::default()
        });
        let reporter = Arc::new(RecordingReporter::default());

        let outcome = pipeline(&store, &engine, &reporter)
            .process(&message())
            .await
            .expect("outcome");
        assert!(matches!(outcome, JobOutcome::Failed { .. }));

        let reports = reporter.reports.lock().unwrap();
        let statuses: Vec<&str> = reports.iter().map(|(_, s, _)| s.as_str()).collect();
        assert_eq!(statuses, vec!["in-progress", "failed"]);
        assert_eq!(reports[1].2, None, "failed report must carry no locator");

        assert!(store.pushed.lock().unwrap().is_empty());
        assert!(!store.fetched.lock().unwrap()[0].exists());
    }

    #[tokio::test]
    async fn fetch_failure_reports_failed() {
        let store = Arc::new(FakeStore {
            fail_fetch: true,
            ..Default::default()
        });
        let engine = Arc::new(FakeEngine::default());
        let reporter = Arc::new(RecordingReporter::default());

        let outcome = pipeline(&store, &engine, &reporter)
            .process(&message())
            .await
            .expect("outcome");
        assert!(matches!(outcome, JobOutcome::Failed { .. }));
        assert!(engine.runs.lock().unwrap().is_empty(), "engine must not run");
    }

    #[tokio::test]
    async fn report_failure_does_not_change_outcome() {
        let store = Arc::new(FakeStore::default());
        let engine = Arc::new(FakeEngine::default());
        let reporter = Arc::new(RecordingReporter {
            fail: true,
            ..Default::default()
        });

        let outcome = pipeline(&store, &engine, &reporter)
            .process(&message())
            .await
            .expect("outcome");
        assert!(matches!(outcome, JobOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn redelivery_reaches_terminal_state_twice_without_leaks() {
        let store = Arc::new(FakeStore::default());
        let engine = Arc::new(FakeEngine::default());
        let reporter = Arc::new(RecordingReporter::default());
        let pipeline = pipeline(&store, &engine, &reporter);

        let first = pipeline.process(&message()).await.expect("first outcome");
        let second = pipeline.process(&message()).await.expect("second outcome");
        assert!(first.is_terminal());
        assert!(second.is_terminal());

        // Last-write-wins: the final observed status is the second terminal report.
        let reports = reporter.reports.lock().unwrap();
        assert_eq!(reports.len(), 4);
        assert_eq!(reports[3].1, second.status_str());

        // Both deliveries pushed the same deterministic key.
        let pushed = store.pushed.lock().unwrap();
        assert_eq!(pushed[0].1, pushed[1].1);

        for path in store.fetched.lock().unwrap().iter() {
            assert!(!path.exists(), "leaked temp file: {}", path.display());
        }
    }

    #[tokio::test]
    async fn malformed_message_with_id_reports_failed() {
        let store = Arc::new(FakeStore::default());
        let engine = Arc::new(FakeEngine::default());
        let reporter = Arc::new(RecordingReporter::default());

        let payload = br#"{"video_id": "v9", "output_format": "mp4"}"#;
        let outcome = pipeline(&store, &engine, &reporter)
            .process(payload)
            .await
            .expect("outcome");
        assert!(matches!(outcome, JobOutcome::Failed { .. }));

        let reports = reporter.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, "v9");
        assert_eq!(reports[0].1, "failed");
    }

    #[tokio::test]
    async fn unparseable_message_without_id_is_dropped() {
        let store = Arc::new(FakeStore::default());
        let engine = Arc::new(FakeEngine::default());
        let reporter = Arc::new(RecordingReporter::default());

        let outcome = pipeline(&store, &engine, &reporter).process(b"not json").await;
        assert!(outcome.is_none());
        assert!(reporter.reports.lock().unwrap().is_empty());
    }
}
