use crate::cli::Cli;
use crate::config::types::{Config, DEFAULT_PROGRESS_INTERVAL};
use log::debug;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

impl Config {
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        let ffprobe_path = cli
            .ffprobe
            .clone()
            .unwrap_or_else(|| sibling_ffprobe(&cli.ffmpeg));
        let interactive = !cli.non_interactive && std::io::stdin().is_terminal();

        let config = Self {
            output_base: cli.output.clone(),
            ffmpeg_path: cli.ffmpeg.clone(),
            ffprobe_path,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            interactive,
            json_report: cli.json,
        };
        debug!("Config: {config:?}");
        config
    }
}

/// 與 ffmpeg 放在同一個資料夾的 ffprobe；ffmpeg 只給名稱時從 PATH 找
fn sibling_ffprobe(ffmpeg: &Path) -> PathBuf {
    let name = if cfg!(windows) { "ffprobe.exe" } else { "ffprobe" };
    match ffmpeg.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}
