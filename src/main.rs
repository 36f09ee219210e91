// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use clap::{Args, Parser, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::app_config::{Config, LogLevel};
use crate::app_controller::Controller;

mod app_config;
mod app_controller;
mod ass_document;
mod ass_generator;
mod errors;
mod file_utils;
mod kbp_parser;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, clap::ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a project file to an ASS subtitle (default command)
    Convert(ConvertArgs),

    /// Generate shell completions for kbp2ass
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct ConvertArgs {
    /// Input file in .kbp format, or a directory of them ('-' reads stdin)
    #[arg(value_name = "INPUT", default_value = "-")]
    input: PathBuf,

    /// Output file in .ass format (stdout if not specified)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Threshold of syllable display time in milliseconds before using the
    /// progressive wipe effect
    #[arg(short = 'm', long, alias = "wipe-threshold")]
    minimum_progression_duration: Option<u64>,

    /// Use the wipe setting from the project file (progressive wipe unless
    /// wiping is set to word by word). Sets -m to 0 if not otherwise set
    #[arg(short, long)]
    wipe: bool,

    /// Use position data from the project file, including alignment and
    /// vertical/horizontal offsets. Strongly recommended together with -c
    #[arg(short, long)]
    position: bool,

    /// Use the default CDG border (12 pixels from the top of the screen)
    #[arg(short, long)]
    border: bool,

    /// Set the virtual resolution of the destination file to that of CDG
    /// graphics, so positioning and font size work as they do in KBS
    #[arg(short, long)]
    cdg: bool,

    /// Always treat palette colour 0 as transparent, as KBS does when
    /// generating a CDG
    #[arg(short, long)]
    transparency: bool,

    /// Override the width of the virtual resolution (only meaningful with -c)
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Seconds to shift all timings by; may be negative. Defaults to the
    /// offset configured in KBS Studio Settings when one can be found
    #[arg(short, long, allow_hyphen_values = true)]
    offset: Option<f64>,

    /// Fade-in/out duration pair for line display in milliseconds; one value
    /// is used for both, and 0 disables the fade effect entirely.
    /// Defaults to 300,200
    #[arg(short = 'F', long)]
    fade: Option<String>,

    /// Display/remove timing pair in milliseconds; one value is used for
    /// both, and -1 selects the timings from the project file.
    /// Defaults to 1000,100
    #[arg(short = 'D', long, allow_hyphen_values = true)]
    displayremove: Option<String>,

    /// Enable processing of all positional and style information in the
    /// project file (-w, -p, -b, -c, -t, -D -1)
    #[arg(short = 'f', long)]
    full_mode: bool,

    /// Force overwrite of existing output files
    #[arg(long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short = 'C', long, default_value = "kbp2ass.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// kbp2ass - Karaoke Builder Studio project to ASS subtitle converter
///
/// Converts .kbp project files into tag-decorated .ass karaoke subtitles,
/// preserving syllable wipe timing, styles and positioning.
#[derive(Parser, Debug)]
#[command(name = "kbp2ass")]
#[command(version = "1.0.0")]
#[command(about = "Convert Karaoke Builder Studio project files to ASS subtitles")]
#[command(long_about = "kbp2ass converts Karaoke Builder Studio project files (.kbp) into \
SubStation Alpha karaoke subtitles (.ass), synthesizing the wipe timing tags.

EXAMPLES:
    kbp2ass song.kbp song.ass              # Convert one file
    kbp2ass song.kbp > song.ass            # Same, via stdout
    kbp2ass - < song.kbp                   # Read the project from stdin
    kbp2ass -f song.kbp song.ass           # Full mode: wipe, position, border, CDG, transparency
    kbp2ass -w -m 500 song.kbp             # Honor file wipe flags above a 500ms threshold
    kbp2ass -o -0.2 song.kbp               # Shift all timings 200ms earlier
    kbp2ass /library/projects/             # Convert every .kbp in a directory tree
    kbp2ass completions bash               # Generate bash completions

CONFIGURATION:
    Defaults can be stored in kbp2ass.json (or the file given with --config-path);
    command-line options override it. When no offset is configured anywhere, the
    offset from the KBS data_studio.ini is used if it can be found.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    convert: ConvertArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour code for log level
    fn colour_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let colour = Self::colour_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} [{}] {}\x1B[0m",
                colour,
                now,
                record.level().as_str().to_lowercase(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info).map_err(|e| anyhow!("Failed to set logger: {}", e))?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "kbp2ass", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Convert(args)) => run_convert(args),
        // Default behavior - use top-level args for backwards compatibility
        None => run_convert(cli.convert),
    }
}

fn run_convert(options: ConvertArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    // Load the configuration file when one exists
    let config_path = Path::new(&options.config_path);
    let (mut config, from_file) = if config_path.exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", options.config_path))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", options.config_path))?;
        (config, true)
    } else {
        (Config::default(), false)
    };

    // Override config with CLI options if provided
    if options.full_mode {
        config.apply_full_mode();
    }
    if options.wipe {
        config.wipe = true;
        // honoring file wipe flags implies no threshold unless one is given
        if options.minimum_progression_duration.is_none() {
            config.minimum_progression_duration = 0;
        }
    }
    if let Some(threshold) = options.minimum_progression_duration {
        config.minimum_progression_duration = threshold;
    }
    if options.position {
        config.position = true;
    }
    if options.border {
        config.border = true;
    }
    if options.cdg {
        config.cdg = true;
    }
    if options.transparency {
        config.transparency = true;
    }
    if let Some(width) = options.width {
        config.width = Some(width);
    }

    match options.offset {
        Some(offset) => config.offset = offset,
        // fall back to the offset from KBS Studio Settings, if any
        None if !from_file => config.offset = app_config::kbs_configured_offset().unwrap_or(0.0),
        None => {}
    }

    // clap's own defaults cannot be used here: full mode and the config
    // file must only be overridden when the user actually set the option
    if let Some(fade) = &options.fade {
        let (fade_in, fade_out) = app_config::parse_pair(fade)
            .context("--fade must have 1-2 non-negative integer fade durations")?;
        if fade_in < 0 || fade_out < 0 {
            return Err(anyhow!("--fade must have 1-2 non-negative integer fade durations"));
        }
        config.dialogue_script =
            app_config::dialogue_script_from_fade(fade_in as u32, fade_out as u32);
    }

    if let Some(displayremove) = &options.displayremove {
        let (display, remove) = app_config::parse_pair(displayremove)
            .context("--displayremove must have 1-2 integer display durations (or -1)")?;
        config.display = display;
        config.remove = remove;
    }

    if let Some(log_level) = options.log_level {
        config.log_level = log_level.into();
    }
    log::set_max_level(level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;

    let input = &options.input;
    if input.as_os_str() == "-" || input.is_file() {
        controller.run(input, options.output.as_deref(), options.force_overwrite)
    } else if input.is_dir() {
        if options.output.is_some() {
            warn!("OUTPUT is ignored when INPUT is a directory");
        }
        controller.run_folder(input, options.force_overwrite)
    } else {
        Err(anyhow!("Input path does not exist: {:?}", input))
    }
}
