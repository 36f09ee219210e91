/*!
 * # kbp2ass
 *
 * A Rust library for converting Karaoke Builder Studio project files
 * (.kbp) into SubStation Alpha karaoke subtitles (.ass).
 *
 * ## Features
 *
 * - Syllable-level wipe timing, including progressive vs. word-by-word
 *   wipe selection and inter-syllable gap tags
 * - Per-style colours, font, outline/shadow and alignment, with the
 *   derived fixed (non-wiping) style variants
 * - Page-relative positioning and rotation from the project file
 * - CDG-compatible virtual resolution, border and transparency modes
 * - Global timing offset with clamping, display lead-in and removal
 *   trailing times
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `kbp_parser`: Stateful line scanner producing sentences and styles
 * - `ass_generator`: Per-sentence Dialogue/Comment event generation
 * - `ass_document`: Typed output sections and the flat-text serializer
 * - `app_controller`: Conversion driver
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod ass_document;
pub mod ass_generator;
pub mod errors;
pub mod file_utils;
pub mod kbp_parser;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use ass_document::{AssDocument, AssEvent, AssStyle, EventKind};
pub use ass_generator::{GeneratedLine, generate_line, format_ass_time};
pub use errors::{AppError, KbpError};
pub use kbp_parser::{KbpParser, KbpStyle, ParseOutput, Sentence, Syllable};
