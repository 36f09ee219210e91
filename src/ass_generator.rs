use std::fmt::Write;
use once_cell::sync::Lazy;
use regex::Regex;
use crate::app_config::Config;
use crate::ass_document::{AssEvent, EventKind, FX_EFFECT, KARAOKE_EFFECT};
use crate::kbp_parser::{Sentence, Syllable};

// @module: Per-sentence ASS event and wipe-tag generation

// \n, \h and \N are the format's own escape names; a literal backslash
// followed by one of them cannot be written directly
static ESCAPE_NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\([nhN])").unwrap());

/// The paired events generated for one sentence: the visible Dialogue line
/// and the karaoke Comment that keeps the exact per-syllable timing
/// inspectable and retimeable on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedLine {
    pub dialogue: AssEvent,
    pub comment: AssEvent,
}

/// Format milliseconds as the `H:MM:SS.CC` ASS timestamp. Hours are not
/// padded; centiseconds are truncated, never rounded.
pub fn format_ass_time(ms: u64) -> String {
    let centiseconds = (ms / 10) % 100;
    let seconds = (ms / 1_000) % 60;
    let minutes = (ms / 60_000) % 60;
    let hours = ms / 3_600_000;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centiseconds)
}

/// Escape rendered text so none of it reads as control syntax.
///
/// `{~}` is how KBP encodes a literal `/`, the end-of-syllable character.
/// Braces must be backslash-escaped or they open an override block. A
/// backslash before n/h/N gets a zero-width space inserted after it, since
/// the format has no direct way to express that pair literally. On the
/// first syllable of a line a single leading space becomes the explicit
/// hard-space marker; renderers strip a plain one.
pub fn escape_ass(text: &str, first: bool) -> String {
    let mut escaped = text.replace("{~}", "/");
    escaped = escaped.replace('{', "\\{").replace('}', "\\}");
    escaped = ESCAPE_NAME_REGEX
        .replace_all(&escaped, "\\\u{200B}${1}")
        .into_owned();
    if first {
        if let Some(rest) = escaped.strip_prefix(' ') {
            escaped = format!("\\h{}", rest);
        }
    }
    escaped
}

/// A syllable wipes progressively only when its duration clears the
/// threshold (compared in whole centiseconds); below that, progressive
/// wiping is impossible regardless of the project-file setting. Above it,
/// the file's own per-syllable flag wins when the wipe option honors it.
fn wipe_is_progressive(syllable: &Syllable, config: &Config) -> bool {
    if syllable.duration_ms / 10 > config.minimum_progression_duration / 10 {
        !(config.wipe && !syllable.wipe_progressive)
    } else {
        false
    }
}

fn clamp_ms(value: i64) -> u64 {
    value.max(0) as u64
}

/// Generate the Dialogue/Comment pair for one sentence. Pure; the only
/// output is the two event records.
pub fn generate_line(sentence: &Sentence, config: &Config) -> GeneratedLine {
    let mut karaoke = String::new();
    let mut first_start: Option<u64> = None;
    let mut last_end: Option<u64> = None;

    for syllable in &sentence.syllables {
        // idle time between syllables gets its own invisible wipe tag
        if let Some(previous_end) = last_end {
            let gap_ms = syllable.start_ms.saturating_sub(previous_end);
            if gap_ms > 10 {
                let _ = write!(karaoke, "{{\\k{}}}", gap_ms / 10);
            }
        }
        let tag = if wipe_is_progressive(syllable, config) { "\\kf" } else { "\\k" };
        let _ = write!(
            karaoke,
            "{{{}{}}}{}",
            tag,
            syllable.duration_ms / 10,
            escape_ass(&syllable.text, first_start.is_none())
        );
        if first_start.is_none() {
            first_start = Some(syllable.start_ms);
        }
        last_end = Some(syllable.end_ms);
    }

    let first_start = first_start.unwrap_or(sentence.start_ms);
    let last_end = last_end.unwrap_or(sentence.end_ms);

    let end_ms = if config.remove == -1 {
        sentence.end_ms
    } else {
        clamp_ms(last_end as i64 + config.remove)
    };
    let start_ms = if config.display == -1 {
        sentence.start_ms
    } else {
        clamp_ms(first_start as i64 - config.display)
    };

    // the comment starts exactly with the syllables to allow for retiming
    let comment = AssEvent {
        kind: EventKind::Comment,
        layer: 0,
        start_ms: first_start,
        end_ms,
        style: sentence.style_name.clone(),
        name: String::new(),
        margin_l: 0,
        margin_r: 0,
        margin_v: 0,
        effect: KARAOKE_EFFECT.to_string(),
        text: karaoke.clone(),
    };

    // a horizontal offset only makes sense when there is a set number of
    // pixels to center across
    let horizontal = if config.cdg || sentence.alignment == 0 || sentence.alignment == 8 {
        sentence.hpos
    } else {
        0
    };
    let mut overrides = String::new();
    if sentence.alignment != 0 {
        let _ = write!(overrides, "\\an{}", sentence.alignment);
    }
    if config.position {
        let _ = write!(overrides, "\\pos({},{})", horizontal, sentence.vpos);
        if sentence.rotation != 0 {
            let _ = write!(overrides, "\\frz{}", sentence.rotation);
        }
    }

    // cover the stretch between display start and the first wipe
    let lead_in_cs = first_start.saturating_sub(start_ms) / 10;
    let text = format!(
        "{{{}\\k{}{}}}{}",
        overrides, lead_in_cs, config.dialogue_script, karaoke
    );

    let dialogue = AssEvent {
        kind: EventKind::Dialogue,
        layer: 0,
        start_ms,
        end_ms,
        style: sentence.style_name.clone(),
        name: String::new(),
        margin_l: 0,
        margin_r: 0,
        margin_v: 0,
        effect: FX_EFFECT.to_string(),
        text,
    };

    GeneratedLine { dialogue, comment }
}
