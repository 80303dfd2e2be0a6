//! AVCHD 攝影機匯入元件
//!
//! 從 SD 卡或資料夾找出 .MTS 片段，依序以 ffmpeg 轉為 MP4，
//! 存到「圖片/Camcorder Imports/<日期>」

mod ffmpeg_command;
mod import_state;
mod main;
mod orchestrator;
mod prompts;
mod report;
mod transcoder;

pub use ffmpeg_command::FfmpegCommand;
pub use import_state::{ConversionError, ImportState, overall_progress};
pub use main::{CamcorderImport, NO_ROOTS_MESSAGE};
pub use orchestrator::{
    FolderChooser, ImportOrchestrator, NO_CLIPS_MESSAGE, NO_OUTPUT_SELECTED_MESSAGE, Notifier,
};
pub use prompts::{ConsoleNotifier, PromptFolderChooser};
pub use report::{
    EXIT_ALL_CONVERTED, EXIT_BATCH_FAILED, EXIT_SOME_FAILED, ImportReport, exit_code_for,
};
pub use transcoder::{FfmpegTranscoder, Transcoder};
