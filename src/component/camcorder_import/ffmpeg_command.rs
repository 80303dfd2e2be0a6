use std::path::{Path, PathBuf};
use std::process::Command;

/// 將 AVCHD 片段轉為 H.264/AAC MP4 的固定品質 ffmpeg 指令
pub struct FfmpegCommand {
    source_path: PathBuf,
    partial_path: PathBuf,
}

impl FfmpegCommand {
    #[must_use]
    pub fn new(source_path: &Path, destination_path: &Path) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            partial_path: Self::generate_partial_path(destination_path),
        }
    }

    /// 轉檔中先寫入隱藏的暫存檔，成功後才改名為正式檔名
    fn generate_partial_path(destination_path: &Path) -> PathBuf {
        let file_name = destination_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output.mp4".to_string());
        destination_path.with_file_name(format!(".{file_name}.part"))
    }

    #[must_use]
    pub fn partial_path(&self) -> &Path {
        &self.partial_path
    }

    #[must_use]
    pub fn build_command(&self, ffmpeg: &Path) -> Command {
        let mut cmd = Command::new(ffmpeg);

        cmd.args([
            "-hide_banner",
            "-nostdin",
            "-nostats",
            "-loglevel", "error",
            "-progress", "pipe:1",
            "-y",
            "-fflags", "+genpts",
        ]);
        cmd.arg("-i").arg(&self.source_path);
        cmd.args([
            "-map", "0:v:0",
            "-map", "0:a:0?",
            "-sn", "-dn",
            "-map_metadata", "0",
            "-c:v", "libx264",
            "-preset", "slow",
            "-crf", "18",
            "-pix_fmt", "yuv420p",
            "-c:a", "aac",
            "-b:a", "192k",
            "-movflags", "+faststart",
            "-f", "mp4",
        ]);
        cmd.arg(&self.partial_path);

        cmd
    }
}
