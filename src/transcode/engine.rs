use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

use crate::transcode::params::EncodeSpec;
use crate::transcode::pipeline::EncodingEngine;

/// Builds the full ffmpeg argument list for one job:
/// `-i <input> -c:v <codec> [-vf scale] -c:a <codec> [extra] [-b:v rate] [-f container] -y <output>`
pub fn build_args(spec: &EncodeSpec, input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-i".into(),
        input.as_os_str().to_os_string(),
        "-c:v".into(),
        spec.video_codec.into(),
    ];
    if let Some(filter) = &spec.scale_filter {
        args.push("-vf".into());
        args.push(filter.as_str().into());
    }
    args.push("-c:a".into());
    args.push(spec.audio_codec.into());
    for arg in &spec.extra_args {
        args.push((*arg).into());
    }
    if let Some(bitrate) = spec.bitrate {
        args.push("-b:v".into());
        args.push(bitrate.into());
    }
    if let Some(container) = spec.container_format {
        args.push("-f".into());
        args.push(container.into());
    }
    // Overwrite without prompting; a redelivered job writes the same name.
    args.push("-y".into());
    args.push(output.as_os_str().to_os_string());
    args
}

pub struct FfmpegEngine {
    binary: PathBuf,
}

impl FfmpegEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl EncodingEngine for FfmpegEngine {
    async fn run(&self, spec: &EncodeSpec, input: &Path, output: &Path) -> Result<()> {
        let args = build_args(spec, input, output);
        info!("Starting transcode: {} {:?}", self.binary.display(), args);

        // No internal timeout: encodes are CPU-bound and allowed to run long.
        let status = Command::new(&self.binary)
            .args(&args)
            .status()
            .await
            .with_context(|| format!("failed to spawn {}", self.binary.display()))?;

        if !status.success() {
            bail!("{} exited with {}", self.binary.display(), status);
        }

        Ok(())
    }
}
