use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 轉檔進度回報的間隔
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// 單次執行的設定，來源為命令列與環境變數，不寫入磁碟
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 取代系統圖片資料夾的輸出位置
    pub output_base: Option<PathBuf>,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub progress_interval: Duration,
    /// 可以向使用者提問
    pub interactive: bool,
    pub json_report: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_base: None,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            interactive: false,
            json_report: false,
        }
    }
}
