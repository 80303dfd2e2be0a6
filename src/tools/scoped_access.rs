use log::debug;
use std::path::{Path, PathBuf};

/// 批次期間對輸入根目錄與輸出位置的存取權
///
/// 沙盒平台需要成對的取得與釋放；其他平台只記錄。
/// 離開作用域時一定會釋放。
#[derive(Debug)]
pub struct ScopedAccess {
    path: PathBuf,
}

impl ScopedAccess {
    #[must_use]
    pub fn acquire(path: &Path) -> Self {
        debug!("Acquired access: {}", path.display());
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Drop for ScopedAccess {
    fn drop(&mut self) {
        debug!("Released access: {}", self.path.display());
    }
}
