use anyhow::{Result, Context};
use log::{error, warn, info, debug};
use std::path::Path;
use crate::app_config::Config;
use crate::ass_document::{AssDocument, AssEvent, AssStyle};
use crate::ass_generator::generate_line;
use crate::file_utils::FileManager;
use crate::kbp_parser::KbpParser;

// @module: Conversion driver orchestrating parser, generator and serializer

/// Main application controller for the KBP to ASS conversion
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    /// Convert buffered project-file text into complete ASS text.
    ///
    /// The whole input is required up front: directives anywhere in the
    /// file govern later lines, and events are emitted in parse order.
    pub fn convert_str(&self, input: &str) -> Result<String> {
        let parsed = KbpParser::new(&self.config)
            .parse(input)
            .context("Failed to parse project file")?;

        let styles: Vec<AssStyle> = parsed.styles().map(AssStyle::from).collect();
        let styles = if styles.is_empty() {
            debug!("Project file defines no styles, emitting the default style");
            vec![AssStyle::default()]
        } else {
            styles
        };

        // all karaoke comments first, then the visible dialogue lines,
        // each group in parse order
        let mut comments = Vec::with_capacity(parsed.sentences.len() + 1);
        let mut dialogues = Vec::with_capacity(parsed.sentences.len());
        comments.push(AssEvent::scripting_comment());
        for sentence in &parsed.sentences {
            let generated = generate_line(sentence, &self.config);
            comments.push(generated.comment);
            dialogues.push(generated.dialogue);
        }
        let mut events = comments;
        events.append(&mut dialogues);

        let play_res = if self.config.cdg {
            Some(if self.config.border {
                (self.config.width.unwrap_or(300), 216)
            } else {
                (self.config.width.unwrap_or(288), 192)
            })
        } else {
            None
        };

        let document = AssDocument { play_res, styles, events };
        Ok(document.render())
    }

    /// Convert a single file (or stdin via `-`) and write the result to the
    /// output path (or stdout when none is given). Nothing is written when
    /// the conversion fails.
    pub fn run(&self, input: &Path, output: Option<&Path>, force_overwrite: bool) -> Result<()> {
        if let Some(output) = output {
            if FileManager::file_exists(output) && !force_overwrite {
                warn!(
                    "Skipping {:?}, output already exists (use --force-overwrite)",
                    output
                );
                return Ok(());
            }
        }

        let content = FileManager::read_input(input)?;
        let ass = self.convert_str(&content)?;

        match output {
            Some(path) => {
                FileManager::write_to_file(path, &ass)?;
                info!("Wrote {:?}", path);
            }
            None => print!("{}", ass),
        }
        Ok(())
    }

    /// Convert every .kbp file under a directory to a sibling .ass file
    pub fn run_folder(&self, input_dir: &Path, force_overwrite: bool) -> Result<()> {
        info!("Converting project files under {:?}", input_dir);

        let files = FileManager::find_files(input_dir, "kbp")?;
        if files.is_empty() {
            warn!("No .kbp files found under {:?}", input_dir);
            return Ok(());
        }

        let mut converted = 0;
        for file in &files {
            let output = file.with_extension("ass");
            match self.run(file, Some(&output), force_overwrite) {
                Ok(()) => converted += 1,
                Err(e) => error!("Failed to convert {:?}: {:#}", file, e),
            }
        }

        info!("Finished converting {} of {} file(s)", converted, files.len());
        Ok(())
    }
}
