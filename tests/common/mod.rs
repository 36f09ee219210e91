/*!
 * Common test utilities for the kbp2ass test suite
 */

use std::fs;
use std::path::PathBuf;
use anyhow::Result;
use tempfile::TempDir;
use kbp2ass::{Sentence, Syllable};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A minimal but complete project file: palette, one style, one page with
/// one positioned line holding a single syllable
pub fn minimal_project() -> &'static str {
    "'Palette Colours\n\
     FFF,000,F00,00F\n\
     \n\
     Style00,Default,2,3,1,0,0\n\
     \x20 Arial,12,,0\n\
     \x20 1,0,0,0,1,0,0,L\n\
     \n\
     PAGEV2\n\
     C/A/100/300/0/0\n\
     HI/100/200/0\n\
     \n"
}

/// A project file with two pages, two styles (one all-caps), lowercase
/// fixed-style usage and an explicit wipe default
pub fn full_project() -> &'static str {
    "'Margins\n\
     2,2,7,12\n\
     'Other\n\
     0,5,0\n\
     'Palette Colours\n\
     FFF,000,F00,00F,0F0\n\
     \n\
     Style00,Default,2,3,1,0,0\n\
     \x20 Arial,12,B,0\n\
     \x20 1,0,0,0,1,0,0,L\n\
     Style01,Shout,2,3,4,0,0\n\
     \x20 Arial,14,,0\n\
     \x20 2,0,0,0,0,0,0,U\n\
     \n\
     PAGEV2\n\
     C/A/100/300/0/0\n\
     HEL/100/150/0\n\
     LO/150/200/0\n\
     \n\
     L/B/350/500/10/0\n\
     world/350/450/2\n\
     \n\
     PAGEV2\n\
     C/a/600/800/0/0\n\
     (instrumental)/600/700/0\n\
     \n"
}

/// Builds a syllable with its duration derived from the timing pair
pub fn syllable(text: &str, start_ms: u64, end_ms: u64, wipe_progressive: bool) -> Syllable {
    Syllable {
        text: text.to_string(),
        start_ms,
        end_ms,
        duration_ms: end_ms - start_ms,
        wipe_progressive,
    }
}

/// Builds a sentence around the given syllables with neutral positioning
pub fn sentence(syllables: Vec<Syllable>) -> Sentence {
    let start_ms = syllables.first().map(|s| s.start_ms).unwrap_or(0);
    let end_ms = syllables.last().map(|s| s.end_ms).unwrap_or(0);
    Sentence {
        id: 1,
        start_ms,
        end_ms,
        duration_ms: end_ms - start_ms,
        style_name: "Default".to_string(),
        vpos: 0,
        hpos: 0,
        alignment: 0,
        rotation: 0,
        syllables,
    }
}
