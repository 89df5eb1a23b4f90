use tracing::warn;

/// Resolved encoder configuration for one job. Fully determined by
/// (input_format, output_format, quality) — resolving the same triple
/// twice always yields the same spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSpec {
    pub video_codec: &'static str,
    pub audio_codec: &'static str,
    pub extra_args: Vec<&'static str>,
    pub container_format: Option<&'static str>,
    pub bitrate: Option<&'static str>,
    pub scale_filter: Option<String>,
}

pub fn resolve(input_format: &str, output_format: &str, quality: Option<&str>) -> EncodeSpec {
    let input_format = input_format.to_lowercase();
    let output_format = output_format.to_lowercase();

    let (video_codec, audio_codec, extra_args, container_format) = match output_format.as_str() {
        "mp4" => ("libx264", "aac", vec!["-movflags", "faststart"], None),
        "mkv" => ("libx264", "aac", vec![], None),
        // ProRes is common for MOV files
        "mov" => ("prores_ks", "pcm_s16le", vec![], Some("mov")),
        "avi" => ("mpeg4", "mp3", vec![], None),
        _ => ("libx264", "aac", vec![], None),
    };

    let height = quality.and_then(|q| {
        let h = parse_height(q);
        if h.is_none() {
            warn!("Invalid quality value provided: {q}. Skipping quality adjustment.");
        }
        h
    });

    let bitrate = match (quality, height) {
        (Some(_), Some(h)) => Some(bitrate_for_height(h)),
        (Some(_), None) => None,
        // Legacy-codec re-encode cost hint; triggers only for HEVC inputs
        // going to mp4/mkv and only when no quality was requested.
        (None, _) if input_format == "hevc" && matches!(output_format.as_str(), "mp4" | "mkv") => {
            Some("1500k")
        }
        (None, _) => None,
    };

    // -2 keeps the width even while preserving aspect ratio.
    let scale_filter = height.map(|h| format!("scale=-2:{h}"));

    EncodeSpec {
        video_codec,
        audio_codec,
        extra_args,
        container_format,
        bitrate,
        scale_filter,
    }
}

/// Extracts the digit run from a quality token such as `"720p"`.
fn parse_height(quality: &str) -> Option<u32> {
    let digits: String = quality.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn bitrate_for_height(height: u32) -> &'static str {
    match height {
        0..=360 => "800k",
        361..=480 => "1200k",
        481..=720 => "2500k",
        721..=1080 => "5000k",
        _ => "8000k",
    }
}
