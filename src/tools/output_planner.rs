use crate::error::OutputError;
use chrono::NaiveDate;
use directories::UserDirs;
use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// 所有輸出都放在此資料夾底下
pub const OUTPUT_FOLDER_NAME: &str = "Camcorder Imports";
pub const OUTPUT_EXTENSION: &str = "mp4";
const DATE_FOLDER_FORMAT: &str = "%Y-%m-%d";

/// 決定輸出資料夾與每個片段的輸出檔名
#[derive(Debug, Clone)]
pub struct OutputPlanner {
    default_base: Option<PathBuf>,
}

impl Default for OutputPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPlanner {
    /// 以使用者的圖片資料夾作為預設位置
    #[must_use]
    pub fn new() -> Self {
        let default_base = UserDirs::new()
            .and_then(|dirs| dirs.picture_dir().map(Path::to_path_buf));
        Self::with_default_base(default_base)
    }

    #[must_use]
    pub const fn with_default_base(default_base: Option<PathBuf>) -> Self {
        Self { default_base }
    }

    /// 建立 `<base>/Camcorder Imports/<YYYY-MM-DD>`，已存在時直接回傳
    pub fn ensure_output_directory(
        &self,
        base_override: Option<&Path>,
        as_of: NaiveDate,
    ) -> Result<PathBuf, OutputError> {
        let root = match base_override {
            Some(base) => import_root(base),
            None => {
                let base = self
                    .default_base
                    .as_deref()
                    .ok_or(OutputError::CannotLocateDefaultBase)?;
                base.join(OUTPUT_FOLDER_NAME)
            }
        };

        let output = root.join(as_of.format(DATE_FOLDER_FORMAT).to_string());
        fs::create_dir_all(&output).map_err(|e| OutputError::from_io(output.clone(), e))?;

        info!("Output folder: {}", output.display());
        Ok(output)
    }
}

/// 使用者指定的位置若已經是輸出資料夾本身，就不再重複加一層
fn import_root(base: &Path) -> PathBuf {
    if base.file_name().is_some_and(|name| name == OUTPUT_FOLDER_NAME) {
        base.to_path_buf()
    } else {
        base.join(OUTPUT_FOLDER_NAME)
    }
}

/// 產生不會覆蓋既有檔案的輸出路徑：`name.mp4`、`name-1.mp4`、`name-2.mp4`…
///
/// 必須在轉檔前一刻才呼叫，因為同一批稍早的片段可能剛寫入同名檔案。
/// `issued` 記錄這一批已經分配過的路徑；失敗的片段不會留下檔案，
/// 但它的路徑仍不可再分配給下一個同名片段。
pub fn plan_destination(
    source: &Path,
    output_directory: &Path,
    issued: &mut HashSet<PathBuf>,
) -> PathBuf {
    let file_stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "clip".to_string());

    let mut candidate = output_directory.join(format!("{file_stem}.{OUTPUT_EXTENSION}"));
    let mut index = 1;
    while is_taken(&candidate, issued) {
        candidate = output_directory.join(format!("{file_stem}-{index}.{OUTPUT_EXTENSION}"));
        index += 1;
    }

    debug!("Planned destination: {}", candidate.display());
    issued.insert(candidate.clone());
    candidate
}

/// 不跟隨符號連結：失效的連結也算已佔用
fn is_taken(candidate: &Path, issued: &HashSet<PathBuf>) -> bool {
    issued.contains(candidate) || fs::symlink_metadata(candidate).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 23).unwrap()
    }

    #[test]
    fn test_default_base_layout() {
        let temp_dir = TempDir::new().unwrap();
        let planner = OutputPlanner::with_default_base(Some(temp_dir.path().to_path_buf()));

        let output = planner.ensure_output_directory(None, date()).unwrap();
        assert_eq!(
            output,
            temp_dir.path().join("Camcorder Imports").join("2025-12-23")
        );
        assert!(output.is_dir());
    }

    #[test]
    fn test_missing_default_base() {
        let planner = OutputPlanner::with_default_base(None);
        let err = planner.ensure_output_directory(None, date()).unwrap_err();
        assert!(matches!(err, OutputError::CannotLocateDefaultBase));
    }

    #[test]
    fn test_override_does_not_duplicate_folder_name() {
        let temp_dir = TempDir::new().unwrap();
        let planner = OutputPlanner::with_default_base(None);

        let base = temp_dir.path().join("Camcorder Imports");
        let output = planner.ensure_output_directory(Some(&base), date()).unwrap();
        assert_eq!(output, base.join("2025-12-23"));

        let other = temp_dir.path().join("Videos");
        let output = planner.ensure_output_directory(Some(&other), date()).unwrap();
        assert_eq!(output, other.join("Camcorder Imports").join("2025-12-23"));
    }

    #[test]
    fn test_ensure_output_directory_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let planner = OutputPlanner::with_default_base(Some(temp_dir.path().to_path_buf()));

        let first = planner.ensure_output_directory(None, date()).unwrap();
        let second = planner.ensure_output_directory(None, date()).unwrap();
        assert_eq!(first, second);

        let entries = fs::read_dir(temp_dir.path().join("Camcorder Imports"))
            .unwrap()
            .count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_plan_destination_without_collision() {
        let temp_dir = TempDir::new().unwrap();
        let mut issued = HashSet::new();
        let destination = plan_destination(
            Path::new("/card/STREAM/00001.MTS"),
            temp_dir.path(),
            &mut issued,
        );
        assert_eq!(destination, temp_dir.path().join("00001.mp4"));
        assert!(issued.contains(&destination));
    }

    #[test]
    fn test_plan_destination_skips_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("00001.mp4"), b"x").unwrap();
        fs::write(temp_dir.path().join("00001-1.mp4"), b"x").unwrap();
        fs::write(temp_dir.path().join("00001-2.mp4"), b"x").unwrap();

        let destination = plan_destination(
            Path::new("/card/STREAM/00001.MTS"),
            temp_dir.path(),
            &mut HashSet::new(),
        );
        assert_eq!(destination, temp_dir.path().join("00001-3.mp4"));
    }

    #[test]
    fn test_plan_destination_never_reissues_a_path() {
        let temp_dir = TempDir::new().unwrap();
        let mut issued = HashSet::new();

        // 第一張卡的片段失敗，沒有留下檔案
        let first = plan_destination(
            Path::new("/cardA/STREAM/00000.MTS"),
            temp_dir.path(),
            &mut issued,
        );
        let second = plan_destination(
            Path::new("/cardB/STREAM/00000.MTS"),
            temp_dir.path(),
            &mut issued,
        );

        assert_eq!(first, temp_dir.path().join("00000.mp4"));
        assert_eq!(second, temp_dir.path().join("00000-1.mp4"));
    }

    #[cfg(unix)]
    #[test]
    fn test_plan_destination_treats_dangling_symlink_as_taken() {
        let temp_dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(
            temp_dir.path().join("gone.mp4"),
            temp_dir.path().join("00001.mp4"),
        )
        .unwrap();

        let destination = plan_destination(
            Path::new("/card/STREAM/00001.MTS"),
            temp_dir.path(),
            &mut HashSet::new(),
        );
        assert_eq!(destination, temp_dir.path().join("00001-1.mp4"));
    }
}
