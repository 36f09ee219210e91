use anyhow::{anyhow, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;

/// Application configuration module
/// This module handles the conversion settings consumed by the parser and
/// the event generator, including loading from a JSON file, validating,
/// and the helpers that turn CLI shorthand (fade pairs, display/remove
/// pairs) into the canonical shape.
/// Represents the conversion configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Threshold in milliseconds below which a syllable never gets a progressive wipe
    #[serde(default = "default_minimum_progression_duration")]
    pub minimum_progression_duration: u64,

    /// Honor the per-syllable wipe flags from the project file
    #[serde(default)]
    pub wipe: bool,

    /// Emit \pos and \frz tags from the project's position data
    #[serde(default)]
    pub position: bool,

    /// Apply the default CDG border offsets (12 virtual pixels from the top)
    #[serde(default)]
    pub border: bool,

    /// Use the CDG virtual resolution so positioning works as in KBS
    #[serde(default)]
    pub cdg: bool,

    /// Treat palette colour 0 as fully transparent
    #[serde(default)]
    pub transparency: bool,

    /// Override of the virtual horizontal resolution
    #[serde(default)]
    pub width: Option<u32>,

    /// Global time shift in seconds, may be negative
    #[serde(default)]
    pub offset: f64,

    /// Display lead-in in milliseconds before the first wipe; -1 uses the file timing
    #[serde(default = "default_display")]
    pub display: i64,

    /// Trailing display time in milliseconds after the last wipe; -1 uses the file timing
    #[serde(default = "default_remove")]
    pub remove: i64,

    /// Fixed override-tag prefix added to every dialogue line (e.g. a fade effect)
    #[serde(default = "default_dialogue_script")]
    pub dialogue_script: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Log level configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_minimum_progression_duration() -> u64 {
    1000
}

fn default_display() -> i64 {
    1000
}

fn default_remove() -> i64 {
    100
}

fn default_dialogue_script() -> String {
    dialogue_script_from_fade(300, 200)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            minimum_progression_duration: default_minimum_progression_duration(),
            wipe: false,
            position: false,
            border: false,
            cdg: false,
            transparency: false,
            width: None,
            offset: 0.0,
            display: default_display(),
            remove: default_remove(),
            dialogue_script: default_dialogue_script(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(width) = self.width {
            if width == 0 {
                return Err(anyhow!("width must be a positive integer"));
            }
        }

        if self.display < -1 {
            return Err(anyhow!(
                "display must be a non-negative duration in milliseconds, or -1"
            ));
        }

        if self.remove < -1 {
            return Err(anyhow!(
                "remove must be a non-negative duration in milliseconds, or -1"
            ));
        }

        Ok(())
    }

    /// Enable every project-file feature: wipe flags, positioning, border,
    /// CDG resolution, transparency, and the file's own display timings.
    pub fn apply_full_mode(&mut self) {
        self.wipe = true;
        self.position = true;
        self.border = true;
        self.cdg = true;
        self.transparency = true;
        self.display = -1;
        self.remove = -1;
    }
}

/// Build the fixed dialogue prefix from a fade-in/fade-out pair.
/// A 0,0 pair disables the fade effect entirely.
pub fn dialogue_script_from_fade(fade_in: u32, fade_out: u32) -> String {
    if fade_in == 0 && fade_out == 0 {
        String::new()
    } else {
        format!("\\fad({},{})", fade_in, fade_out)
    }
}

/// Parse a "300,200" style pair; a single value is used for both halves
pub fn parse_pair(value: &str) -> Result<(i64, i64)> {
    let mut parts = value.split(',');
    let first: i64 = parts
        .next()
        .unwrap_or("")
        .trim()
        .parse()
        .map_err(|_| anyhow!("'{}' is not a valid duration pair", value))?;
    let second: i64 = match parts.next() {
        Some(part) => part
            .trim()
            .parse()
            .map_err(|_| anyhow!("'{}' is not a valid duration pair", value))?,
        None => first,
    };
    if parts.next().is_some() {
        return Err(anyhow!("'{}' has more than two values", value));
    }
    Ok((first, second))
}

// KBS stores its studio offset as centiseconds in an ini-style settings file
static SETOFFSET_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^setoffset\s+(\S+)").unwrap());

/// Path of the Karaoke Builder Studio settings file, if the platform has one
fn kbs_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("Karaoke Builder").join("data_studio.ini"))
}

/// Read the offset configured in KBS Studio Settings, in seconds.
/// Returns None when the settings file is absent or unreadable.
pub fn kbs_configured_offset() -> Option<f64> {
    let path = kbs_settings_path()?;
    let settings = std::fs::read_to_string(&path).ok()?;
    let raw = SETOFFSET_REGEX.captures(&settings)?.get(1)?.as_str();
    let offset = raw.parse::<f64>().ok()? / 100.0;
    debug!("Using offset {}s from KBS settings at {:?}", offset, path);
    Some(offset)
}
