//! 相對路徑輸入測試
//!
//! 會切換工作目錄，因此獨立成一個測試執行檔，且只放一個測試

use std::env;
use std::fs::{self, File};
use std::path::PathBuf;

use camcorder_import::tools::{ClipScanner, MIN_CLIP_SIZE};
use tempfile::TempDir;

#[test]
fn test_relative_roots_inside_stream_folder() {
    let card = TempDir::new().unwrap();
    let stream = card.path().join("PRIVATE/AVCHD/BDMV/STREAM");
    fs::create_dir_all(&stream).unwrap();
    File::create(stream.join("00001.MTS"))
        .unwrap()
        .set_len(MIN_CLIP_SIZE)
        .unwrap();

    let previous = env::current_dir().unwrap();
    env::set_current_dir(&stream).unwrap();

    let scanner = ClipScanner::new();
    let from_dot = scanner.scan(&[PathBuf::from(".")]);
    let from_file = scanner.scan(&[PathBuf::from("00001.MTS")]);
    let from_card = scanner.scan(&[PathBuf::from("../../../..")]);

    env::set_current_dir(previous).unwrap();

    for clips in [from_dot.unwrap(), from_file.unwrap(), from_card.unwrap()] {
        assert_eq!(clips.len(), 1);
        assert!(clips[0].path.is_absolute());
        assert!(clips[0].path.ends_with("AVCHD/BDMV/STREAM/00001.MTS"));
    }
}
