use crate::error::ScanError;
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

/// AVCHD 原始串流的副檔名
pub const CLIP_EXTENSION: &str = "mts";
/// 片段必須位於 AVCHD/BDMV/STREAM 底下
pub const STREAM_MARKERS: [&str; 3] = ["avchd", "bdmv", "stream"];
/// 小於此大小的 .MTS 多半是縮圖或索引，不是真正的影片
pub const MIN_CLIP_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClipInfo {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl ClipInfo {
    /// 顯示用的檔名
    #[must_use]
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClipScanner {
    min_size: u64,
}

impl Default for ClipScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipScanner {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min_size: MIN_CLIP_SIZE,
        }
    }

    /// 掃描所有輸入根目錄，回傳去重並依時間排序的片段清單
    ///
    /// 單一根目錄無法讀取只會略過該目錄；只有全部根目錄都失敗時才回傳錯誤。
    pub fn scan(&self, roots: &[PathBuf]) -> Result<Vec<ClipInfo>, ScanError> {
        let mut clips = Vec::new();
        let mut seen = HashSet::new();
        let mut last_error = None;
        let mut readable_roots = 0;

        for root in roots {
            match self.scan_root(root, &mut seen, &mut clips) {
                Ok(()) => readable_roots += 1,
                Err(e) => {
                    warn!("Skipping unreadable root: {e}");
                    last_error = Some(e);
                }
            }
        }

        if readable_roots == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        sort_clips(&mut clips);
        info!(
            "Found {} clip(s) across {} root(s)",
            clips.len(),
            readable_roots
        );
        Ok(clips)
    }

    fn scan_root(
        &self,
        root: &Path,
        seen: &mut HashSet<PathBuf>,
        clips: &mut Vec<ClipInfo>,
    ) -> Result<(), ScanError> {
        let metadata =
            fs::metadata(root).map_err(|e| ScanError::new(root.to_path_buf(), e))?;

        if !metadata.is_dir() {
            if let Some(clip) = self.evaluate(root, &metadata) {
                push_unique(clip, seen, clips);
            }
            return Ok(());
        }

        // 先確認根目錄本身可以列舉，walkdir 之後的錯誤一律略過
        fs::read_dir(root).map_err(|e| ScanError::new(root.to_path_buf(), e))?;

        let entries = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped_entry(entry))
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file());

        for entry in entries {
            let Ok(metadata) = entry.metadata() else {
                debug!("Cannot read metadata: {}", entry.path().display());
                continue;
            };
            if let Some(clip) = self.evaluate(entry.path(), &metadata) {
                push_unique(clip, seen, clips);
            }
        }

        Ok(())
    }

    fn evaluate(&self, path: &Path, metadata: &Metadata) -> Option<ClipInfo> {
        if !metadata.is_file() || !has_clip_extension(path) {
            return None;
        }

        // 相對路徑或符號連結必須先解析，才看得到完整的 AVCHD/BDMV/STREAM 鏈
        let path = absolute_path(path);
        if !is_in_stream_folder(&path) {
            return None;
        }

        let size = metadata.len();
        if size < self.min_size {
            debug!("Too small to be footage ({size} bytes): {}", path.display());
            return None;
        }

        Some(ClipInfo {
            path,
            size,
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }
}

fn push_unique(clip: ClipInfo, seen: &mut HashSet<PathBuf>, clips: &mut Vec<ClipInfo>) {
    if seen.insert(identity_key(&clip.path)) {
        clips.push(clip);
    } else {
        debug!("Duplicate clip ignored: {}", clip.path.display());
    }
}

/// 依修改時間排序，時間相同時以不分大小寫的檔名排序
pub fn sort_clips(clips: &mut [ClipInfo]) {
    clips.sort_by(|a, b| {
        a.modified
            .cmp(&b.modified)
            .then_with(|| compare_names(&a.path, &b.path))
    });
}

fn compare_names(a: &Path, b: &Path) -> Ordering {
    let name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    };
    name(a).cmp(&name(b)).then_with(|| a.cmp(b))
}

#[must_use]
pub fn has_clip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CLIP_EXTENSION))
}

/// 路徑中是否連續出現 AVCHD / BDMV / STREAM 三層目錄（不分大小寫）
#[must_use]
pub fn is_in_stream_folder(path: &Path) -> bool {
    let components: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
        .collect();

    components
        .windows(STREAM_MARKERS.len())
        .any(|window| window.iter().zip(STREAM_MARKERS).all(|(c, m)| c == m))
}

fn is_skipped_entry(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && is_package_boundary(entry.path()))
}

/// macOS 的套件目錄（.app、.photoslibrary 等）不往下掃描
#[cfg(target_os = "macos")]
fn is_package_boundary(path: &Path) -> bool {
    const PACKAGE_EXTENSIONS: [&str; 5] = ["app", "bundle", "framework", "photoslibrary", "pkg"];
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            PACKAGE_EXTENSIONS
                .iter()
                .any(|p| ext.eq_ignore_ascii_case(p))
        })
}

#[cfg(not(target_os = "macos"))]
const fn is_package_boundary(_path: &Path) -> bool {
    false
}

fn absolute_path(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// 去重用的鍵；大小寫不敏感的檔案系統上統一轉小寫
fn identity_key(path: &Path) -> PathBuf {
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        PathBuf::from(path.to_string_lossy().to_lowercase())
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn make_clip(dir: &Path, name: &str, size: u64, age_secs: u64) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_len(size).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 - age_secs))
            .unwrap();
        path
    }

    #[test]
    fn test_stream_marker_detection() {
        assert!(is_in_stream_folder(Path::new(
            "/Volumes/CAM/PRIVATE/AVCHD/BDMV/STREAM/00001.MTS"
        )));
        assert!(is_in_stream_folder(Path::new("/card/avchd/Bdmv/stream/a.mts")));
        assert!(!is_in_stream_folder(Path::new("/card/AVCHD/STREAM/00001.MTS")));
        assert!(!is_in_stream_folder(Path::new("/card/AVCHD/BDMV/CLIPINF/00001.MTS")));
        assert!(!is_in_stream_folder(Path::new("/AVCHD/x/BDMV/STREAM/a.mts")));
    }

    #[test]
    fn test_clip_extension_is_case_insensitive() {
        assert!(has_clip_extension(Path::new("a.MTS")));
        assert!(has_clip_extension(Path::new("a.mts")));
        assert!(!has_clip_extension(Path::new("a.m2ts")));
        assert!(!has_clip_extension(Path::new("mts")));
    }

    #[test]
    fn test_scan_filters_by_size_and_location() {
        let temp_dir = TempDir::new().unwrap();
        let stream = temp_dir.path().join("PRIVATE/AVCHD/BDMV/STREAM");
        make_clip(&stream, "00001.MTS", 20 * 1024 * 1024, 20);
        make_clip(&stream, "00002.MTS", 30 * 1024 * 1024, 10);
        make_clip(&stream, "00003.MTS", 2 * 1024 * 1024, 5);
        make_clip(&temp_dir.path().join("other"), "00004.MTS", 20 * 1024 * 1024, 1);

        let clips = ClipScanner::new()
            .scan(&[temp_dir.path().to_path_buf()])
            .unwrap();

        let names: Vec<String> = clips.iter().map(ClipInfo::display_name).collect();
        assert_eq!(names, vec!["00001.MTS", "00002.MTS"]);
    }

    #[test]
    fn test_scan_skips_hidden_entries() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".Trashes/AVCHD/BDMV/STREAM");
        make_clip(&hidden, "00001.MTS", MIN_CLIP_SIZE, 0);
        let stream = temp_dir.path().join("AVCHD/BDMV/STREAM");
        make_clip(&stream, "._00002.MTS", MIN_CLIP_SIZE, 0);

        let clips = ClipScanner::new()
            .scan(&[temp_dir.path().to_path_buf()])
            .unwrap();
        assert!(clips.is_empty());
    }

    #[test]
    fn test_scan_deduplicates_overlapping_roots() {
        let temp_dir = TempDir::new().unwrap();
        let stream = temp_dir.path().join("AVCHD/BDMV/STREAM");
        let clip = make_clip(&stream, "00001.MTS", MIN_CLIP_SIZE, 0);

        let clips = ClipScanner::new()
            .scan(&[temp_dir.path().to_path_buf(), stream.clone(), clip])
            .unwrap();
        assert_eq!(clips.len(), 1);
    }

    #[test]
    fn test_scan_orders_by_time_then_name() {
        let temp_dir = TempDir::new().unwrap();
        let stream = temp_dir.path().join("AVCHD/BDMV/STREAM");
        make_clip(&stream, "b.MTS", MIN_CLIP_SIZE, 100);
        make_clip(&stream, "A.MTS", MIN_CLIP_SIZE, 100);
        make_clip(&stream, "c.MTS", MIN_CLIP_SIZE, 200);

        let clips = ClipScanner::new()
            .scan(&[temp_dir.path().to_path_buf()])
            .unwrap();
        let names: Vec<String> = clips.iter().map(ClipInfo::display_name).collect();
        assert_eq!(names, vec!["c.MTS", "A.MTS", "b.MTS"]);
    }

    #[test]
    fn test_scan_single_file_root() {
        let temp_dir = TempDir::new().unwrap();
        let stream = temp_dir.path().join("AVCHD/BDMV/STREAM");
        let clip = make_clip(&stream, "00001.MTS", MIN_CLIP_SIZE, 0);

        let clips = ClipScanner::new().scan(&[clip]).unwrap();
        assert_eq!(clips.len(), 1);
        assert!(clips[0].path.is_absolute());
        assert_eq!(clips[0].size, MIN_CLIP_SIZE);
    }

    #[test]
    fn test_scan_bad_root_alongside_good_root() {
        let temp_dir = TempDir::new().unwrap();
        let stream = temp_dir.path().join("AVCHD/BDMV/STREAM");
        make_clip(&stream, "00001.MTS", MIN_CLIP_SIZE, 0);

        let clips = ClipScanner::new()
            .scan(&[
                temp_dir.path().join("missing"),
                temp_dir.path().to_path_buf(),
            ])
            .unwrap();
        assert_eq!(clips.len(), 1);
    }

    #[test]
    fn test_scan_only_bad_roots_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let err = ClipScanner::new().scan(&[missing.clone()]).unwrap_err();
        assert_eq!(err.root, missing);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_through_symlinked_root() {
        let temp_dir = TempDir::new().unwrap();
        let stream = temp_dir.path().join("card/PRIVATE/AVCHD/BDMV/STREAM");
        make_clip(&stream, "00001.MTS", MIN_CLIP_SIZE, 0);
        let link = temp_dir.path().join("mounted");
        std::os::unix::fs::symlink(&stream, &link).unwrap();

        let clips = ClipScanner::new().scan(&[link]).unwrap();
        assert_eq!(clips.len(), 1);
        assert!(is_in_stream_folder(&clips[0].path));
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let clips = ClipScanner::new()
            .scan(&[temp_dir.path().to_path_buf()])
            .unwrap();
        assert!(clips.is_empty());
    }
}
