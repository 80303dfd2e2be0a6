use super::import_state::{ConversionError, ImportState};
use serde::Serialize;
use std::path::PathBuf;

pub const EXIT_ALL_CONVERTED: u8 = 0;
pub const EXIT_SOME_FAILED: u8 = 1;
/// 整批失敗，或程式在產生報告前就出錯
pub const EXIT_BATCH_FAILED: u8 = 2;

/// 批次結束後輸出的結果，`--json` 時序列化到 stdout
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_folder: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<ConversionError>,
}

impl ImportReport {
    #[must_use]
    pub fn from_state(state: &ImportState) -> Self {
        match state {
            ImportState::Completed {
                output_folder,
                total_count,
                errors,
            } => Self {
                state: "completed",
                output_folder: Some(output_folder.clone()),
                message: state.completion_message(),
                total: *total_count,
                succeeded: state.success_count(),
                failed: errors.clone(),
            },
            ImportState::Failed { message } => Self::failed(message.clone()),
            // 批次結束時不會停在其他狀態
            other => Self::failed(format!("Import stopped while {}.", other.status_title())),
        }
    }

    fn failed(message: String) -> Self {
        Self {
            state: "failed",
            output_folder: None,
            message: Some(message),
            total: 0,
            succeeded: 0,
            failed: Vec::new(),
        }
    }

    /// 0：全部成功；1：有片段失敗；2：整批失敗
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match (self.state, self.failed.is_empty()) {
            ("completed", true) => EXIT_ALL_CONVERTED,
            ("completed", false) => EXIT_SOME_FAILED,
            _ => EXIT_BATCH_FAILED,
        }
    }
}

/// 程式結束碼；沒能產生報告的錯誤一律視為整批失敗
#[must_use]
pub fn exit_code_for(outcome: &anyhow::Result<ImportReport>) -> u8 {
    outcome
        .as_ref()
        .map_or(EXIT_BATCH_FAILED, ImportReport::exit_code)
}
