/*!
 * Tests for file and folder utilities
 */

use kbp2ass::file_utils::FileManager;
use crate::common;

/// Test writing and reading a file round-trip
#[test]
fn test_read_write_withRoundTrip_shouldPreserveContent() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("nested").join("out.ass");

    FileManager::write_to_file(&path, "[Script Info]\n").unwrap();
    assert!(FileManager::file_exists(&path));
    assert_eq!(FileManager::read_to_string(&path).unwrap(), "[Script Info]\n");
}

/// Test reading a regular path through the input reader
#[test]
fn test_read_input_withFilePath_shouldReadContent() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "song.kbp",
        common::minimal_project(),
    )
    .unwrap();
    assert_eq!(
        FileManager::read_input(&path).unwrap(),
        common::minimal_project()
    );
}

/// Test extension-filtered file discovery, case-insensitive
#[test]
fn test_find_files_withMixedExtensions_shouldFilterByExtension() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dir = temp_dir.path().to_path_buf();
    common::create_test_file(&dir, "a.kbp", "x").unwrap();
    common::create_test_file(&dir, "b.KBP", "x").unwrap();
    common::create_test_file(&dir, "c.ass", "x").unwrap();

    let mut found = FileManager::find_files(&dir, "kbp").unwrap();
    found.sort();
    let names: Vec<String> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.kbp", "b.KBP"]);

    assert!(FileManager::find_files(&dir, "srt").unwrap().is_empty());
}
