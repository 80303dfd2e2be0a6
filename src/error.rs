//! 匯入流程的錯誤分類
//!
//! 只有掃描與輸出資料夾層級的錯誤會讓整批失敗；
//! 單一片段的轉檔錯誤一律記錄後繼續處理下一個片段。

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 輸入根目錄無法讀取
#[derive(Error, Debug)]
#[error("Unable to read {}: {source}", root.display())]
pub struct ScanError {
    pub root: PathBuf,
    #[source]
    pub source: io::Error,
}

impl ScanError {
    #[must_use]
    pub const fn new(root: PathBuf, source: io::Error) -> Self {
        Self { root, source }
    }
}

#[derive(Error, Debug)]
pub enum OutputError {
    /// 沒有指定輸出位置，且找不到系統預設的圖片資料夾
    #[error("The Pictures folder could not be located.")]
    CannotLocateDefaultBase,

    #[error("You don't have permission to write to {}.", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OutputError {
    /// 依 io 錯誤種類分類，權限不足會另外標記
    #[must_use]
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path, source }
        } else {
            Self::Io { path, source }
        }
    }

    /// 是否可以改請使用者挑選其他輸出位置後重試
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CannotLocateDefaultBase | Self::PermissionDenied { .. }
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    #[error("{reason}")]
    Failed { reason: String },

    #[error("The export was cancelled.")]
    Cancelled,

    #[error("MP4 export is not supported for this clip.")]
    UnsupportedOutput,
}

impl TranscodeError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// 已經有一批匯入在掃描或轉檔中
    #[error("An import is already in progress.")]
    AlreadyRunning,
}
