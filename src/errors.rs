/*!
 * Error types for the kbp2ass application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors raised while parsing a Karaoke Builder project file
#[derive(Error, Debug)]
pub enum KbpError {
    /// The input contains no syllable-shaped line at all
    #[error("not a recognized Karaoke Builder project file (no syllable lines found)")]
    NotAProjectFile,

    /// A directive announced a data line that never arrived
    #[error("line {line}: {directive} directive is missing its data line")]
    TruncatedDirective {
        /// 1-based line number of the directive
        line: usize,
        /// Directive name as written in the file
        directive: String,
    },

    /// A 3-line style record ended early
    #[error("line {line}: style record Style{index:02} is truncated")]
    TruncatedStyle {
        /// 1-based line number of the style header
        line: usize,
        /// Two-digit style index
        index: usize,
    },

    /// A numeric field did not parse
    #[error("line {line}: invalid numeric field '{field}'")]
    InvalidNumber {
        /// 1-based line number
        line: usize,
        /// The offending field text
        field: String,
    },

    /// A data line carried fewer comma- or slash-separated fields than required
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    TooFewFields {
        /// 1-based line number
        line: usize,
        /// Minimum number of fields the record needs
        expected: usize,
        /// Number of fields actually present
        found: usize,
    },

    /// A style record appeared before any palette directive
    #[error("line {line}: style record found before any 'Palette Colours directive")]
    MissingPalette {
        /// 1-based line number of the style header
        line: usize,
    },

    /// A style referenced a colour index past the end of the palette
    #[error("line {line}: palette index {index} is out of range ({len} colours defined)")]
    PaletteIndexOutOfRange {
        /// 1-based line number
        line: usize,
        /// Requested palette index
        index: usize,
        /// Number of colours in the palette
        len: usize,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from parsing the project file
    #[error("Parse error: {0}")]
    Parse(#[from] KbpError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
