use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// 失敗清單最多預覽幾筆
const ERROR_PREVIEW_LIMIT: usize = 3;

/// 單一片段轉檔失敗的紀錄
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionError {
    pub clip: String,
    pub reason: String,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.clip, self.reason)
    }
}

/// 匯入流程的狀態機；同一時間只會有一個狀態
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ImportState {
    #[default]
    Idle,
    Scanning,
    Converting {
        processed_count: usize,
        total_count: usize,
        current_clip: String,
        clip_progress: f64,
    },
    Completed {
        output_folder: PathBuf,
        total_count: usize,
        errors: Vec<ConversionError>,
    },
    Failed {
        message: String,
    },
}

impl ImportState {
    /// 掃描或轉檔中不接受新的批次
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Scanning | Self::Converting { .. })
    }

    #[must_use]
    pub const fn can_reset(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// 整體進度 `(已處理 + 目前片段進度) / 總數`，限制在 0..=1
    #[must_use]
    pub fn overall_progress(&self) -> f64 {
        match self {
            Self::Converting {
                processed_count,
                total_count,
                clip_progress,
                ..
            } => overall_progress(*processed_count, *total_count, *clip_progress),
            Self::Completed { .. } => 1.0,
            _ => 0.0,
        }
    }

    /// 成功數量，不會小於 0
    #[must_use]
    pub fn success_count(&self) -> usize {
        match self {
            Self::Completed {
                total_count,
                errors,
                ..
            } => total_count.saturating_sub(errors.len()),
            _ => 0,
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[ConversionError] {
        match self {
            Self::Completed { errors, .. } => errors,
            _ => &[],
        }
    }

    #[must_use]
    pub const fn status_title(&self) -> &'static str {
        match self {
            Self::Idle => "Drop an SD card or folder",
            Self::Scanning => "Scanning for AVCHD clips",
            Self::Converting { .. } => "Converting to MP4",
            Self::Completed { .. } => "Import complete",
            Self::Failed { .. } => "Import failed",
        }
    }

    #[must_use]
    pub fn status_detail(&self) -> String {
        match self {
            Self::Idle => "We will look for PRIVATE/AVCHD/BDMV/STREAM/*.MTS and save MP4 files to your Pictures folder.".to_string(),
            Self::Scanning => "Looking for .MTS clips. Large cards may take a minute.".to_string(),
            Self::Converting {
                processed_count,
                total_count,
                current_clip,
                ..
            } => {
                if *total_count == 0 {
                    return "Preparing export session...".to_string();
                }
                let clip_index = (processed_count + 1).min(*total_count);
                format!("Clip {clip_index} of {total_count} - {current_clip}")
            }
            Self::Completed {
                output_folder,
                total_count,
                errors,
            } => {
                let success_count = self.success_count();
                let location = short_location(output_folder);
                if errors.is_empty() {
                    format!("{success_count} clips saved to {location}.")
                } else {
                    format!("{success_count} of {total_count} clips saved to {location}.")
                }
            }
            Self::Failed { message } => message.clone(),
        }
    }

    /// 轉檔中的單行進度描述，其他狀態為空字串
    #[must_use]
    pub fn progress_detail(&self) -> String {
        match self {
            Self::Converting {
                processed_count,
                total_count,
                current_clip,
                clip_progress,
            } if *total_count > 0 => {
                let clip_index = (processed_count + 1).min(*total_count);
                let percent = (clip_progress * 100.0) as u32;
                format!("Clip {clip_index} of {total_count} - {current_clip} ({percent}%)")
            }
            _ => String::new(),
        }
    }

    /// 失敗片段的摘要，只列出前幾筆
    #[must_use]
    pub fn error_summary(&self) -> Option<String> {
        let errors = self.errors();
        if errors.is_empty() {
            return None;
        }

        let sample: Vec<String> = errors
            .iter()
            .take(ERROR_PREVIEW_LIMIT)
            .map(ToString::to_string)
            .collect();
        let mut summary = format!("Some clips failed:\n{}", sample.join("\n"));
        if errors.len() > sample.len() {
            summary.push_str(&format!("\n...and {} more.", errors.len() - sample.len()));
        }
        Some(summary)
    }

    /// 批次完成時的通知文字
    #[must_use]
    pub fn completion_message(&self) -> Option<String> {
        match self {
            Self::Completed {
                output_folder,
                total_count,
                errors,
            } => {
                let success_count = self.success_count();
                Some(if errors.is_empty() {
                    format!(
                        "{success_count} clips are ready in {}.",
                        output_folder.display()
                    )
                } else {
                    format!("{success_count} of {total_count} clips exported. Some files failed.")
                })
            }
            _ => None,
        }
    }
}

#[must_use]
pub fn overall_progress(processed_count: usize, total_count: usize, clip_progress: f64) -> f64 {
    if total_count == 0 {
        return 0.0;
    }
    ((processed_count as f64 + clip_progress) / total_count as f64).clamp(0.0, 1.0)
}

/// 顯示為「上層/資料夾」
fn short_location(folder: &Path) -> String {
    let name = |p: Option<&Path>| {
        p.and_then(Path::file_name)
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    };
    format!("{}/{}", name(folder.parent()), name(Some(folder)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(clip: &str) -> ConversionError {
        ConversionError {
            clip: clip.to_string(),
            reason: "boom".to_string(),
        }
    }

    fn completed(total_count: usize, errors: Vec<ConversionError>) -> ImportState {
        ImportState::Completed {
            output_folder: PathBuf::from("/home/me/Pictures/Camcorder Imports/2025-12-23"),
            total_count,
            errors,
        }
    }

    #[test]
    fn test_busy_and_reset_flags() {
        assert!(!ImportState::Idle.is_busy());
        assert!(ImportState::Scanning.is_busy());
        assert!(!ImportState::Scanning.can_reset());
        assert!(completed(1, vec![]).can_reset());
        assert!(
            ImportState::Failed {
                message: "x".to_string()
            }
            .can_reset()
        );
    }

    #[test]
    fn test_overall_progress_is_clamped() {
        assert!((overall_progress(1, 4, 0.5) - 0.375).abs() < f64::EPSILON);
        assert!((overall_progress(4, 4, 0.9) - 1.0).abs() < f64::EPSILON);
        assert!(overall_progress(0, 0, 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_count_never_negative() {
        let state = completed(1, vec![error("a"), error("b")]);
        assert_eq!(state.success_count(), 0);
        assert_eq!(completed(3, vec![error("a")]).success_count(), 2);
    }

    #[test]
    fn test_completed_detail() {
        assert_eq!(
            completed(2, vec![]).status_detail(),
            "2 clips saved to Camcorder Imports/2025-12-23."
        );
        assert_eq!(
            completed(3, vec![error("a")]).status_detail(),
            "2 of 3 clips saved to Camcorder Imports/2025-12-23."
        );
    }

    #[test]
    fn test_progress_detail() {
        let state = ImportState::Converting {
            processed_count: 1,
            total_count: 3,
            current_clip: "00002.MTS".to_string(),
            clip_progress: 0.425,
        };
        assert_eq!(state.progress_detail(), "Clip 2 of 3 - 00002.MTS (42%)");
        assert_eq!(state.status_detail(), "Clip 2 of 3 - 00002.MTS");
        assert!(ImportState::Idle.progress_detail().is_empty());
    }

    #[test]
    fn test_error_summary_is_capped() {
        assert_eq!(completed(2, vec![]).error_summary(), None);

        let state = completed(
            5,
            vec![error("a"), error("b"), error("c"), error("d"), error("e")],
        );
        assert_eq!(
            state.error_summary().unwrap(),
            "Some clips failed:\na: boom\nb: boom\nc: boom\n...and 2 more."
        );
    }

    #[test]
    fn test_completion_message() {
        assert_eq!(
            completed(3, vec![error("a")]).completion_message().unwrap(),
            "2 of 3 clips exported. Some files failed."
        );
        assert!(ImportState::Scanning.completion_message().is_none());
    }
}
