use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct ClipMediaInfo {
    pub duration_seconds: f64,
    pub has_video: bool,
}

impl ClipMediaInfo {
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        (self.duration_seconds * 1000.0).round() as u64
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    duration: Option<String>,
}

/// 使用 ffprobe 取得片段長度
pub fn get_clip_info(ffprobe: &Path, path: &Path) -> Result<ClipMediaInfo> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("Failed to run ffprobe on {}", path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffprobe failed: {}", stderr.trim());
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("Cannot read ffprobe output for {}", path.display()))
}

fn parse_probe_output(json: &str) -> Result<ClipMediaInfo> {
    let probe: FfprobeOutput = serde_json::from_str(json)?;

    let video_stream = probe.streams.as_ref().and_then(|streams| {
        streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    });

    // 優先使用 format 的長度，其次是視訊串流
    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or_else(|| video_stream.and_then(|s| s.duration.as_ref()))
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| *d > 0.0)
        .ok_or_else(|| anyhow::anyhow!("Clip duration is unknown"))?;

    Ok(ClipMediaInfo {
        duration_seconds,
        has_video: video_stream.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_duration() {
        let json = r#"{
            "streams": [{"codec_type": "video", "duration": "9.5"}, {"codec_type": "audio"}],
            "format": {"duration": "10.010000"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.duration_seconds - 10.01).abs() < 0.001);
        assert_eq!(info.duration_ms(), 10_010);
        assert!(info.has_video);
    }

    #[test]
    fn test_parse_falls_back_to_stream_duration() {
        let json = r#"{"streams": [{"codec_type": "video", "duration": "4.0"}], "format": {}}"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.duration_ms(), 4_000);
    }

    #[test]
    fn test_parse_missing_duration() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "N/A"}}"#;
        assert!(parse_probe_output(json).is_err());
    }
}
