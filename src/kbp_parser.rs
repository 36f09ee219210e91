use std::collections::BTreeMap;
use std::str::FromStr;
use regex::Regex;
use once_cell::sync::Lazy;
use log::{warn, debug};
use crate::app_config::Config;
use crate::errors::KbpError;

// @module: Karaoke Builder project file parsing

// KBS renders lines with 19 extra pixels of leading over the spacing value
// stored in the file (measured against Arial 12 bold, Arial 13, Arial 13 bold)
const LINE_SPACING_CORRECTION: i32 = 19;
// CDG output reserves a 12-pixel border at the top of the screen
const BORDER_TOP_OFFSET: i32 = 12;
// and 6 virtual pixels on either side
const BORDER_SIDE_ADJUST: i32 = 6;
// KBP font sizes are cap heights; ASS sizes are line heights
const CAP_HEIGHT_TO_LINE_HEIGHT: f64 = 1.4;

// @const: Syllable line regex, `TEXT/START/END/WIPE` with optional padding
// around the numeric fields
static SYLLABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*)/\s*([0-9]+)\s*/\s*([0-9]+)\s*/\s*([0-9]+)$").unwrap()
});

// @const: Style header regex, two-digit index 00-19
static STYLE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*Style([0-1][0-9])").unwrap());

// @const: Position line prefix, `L|C|R / style letter /`
static POSITION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[LCR]/[A-Za-z]/").unwrap());

// @struct: Single timed text fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Syllable {
    // @field: Fragment text
    pub text: String,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Wipe duration in ms
    pub duration_ms: u64,

    // @field: Whether the wipe sweeps continuously instead of per word
    pub wipe_progressive: bool,
}

// @struct: One displayed line, an ordered run of syllables
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    // @field: Sequence number, from 1, in file order
    pub id: usize,

    // @field: Ordered syllables
    pub syllables: Vec<Syllable>,

    // @field: Display start in ms
    pub start_ms: u64,

    // @field: Display end in ms
    pub end_ms: u64,

    // @field: Display duration in ms
    pub duration_ms: u64,

    // @field: Name of the resolved style
    pub style_name: String,

    // @field: Vertical position on the virtual canvas
    pub vpos: i32,

    // @field: Horizontal position on the virtual canvas
    pub hpos: i32,

    // @field: Alignment override code (7/8/9), or 0 to use the style's own
    pub alignment: u8,

    // @field: Rotation in degrees
    pub rotation: i32,
}

/// Visual attributes of one `StyleNN` record, colours already resolved
/// through the palette into ASS `&HAABBGGRR` form.
#[derive(Debug, Clone, PartialEq)]
pub struct KbpStyle {
    pub name: String,
    pub primary_colour: String,
    pub secondary_colour: String,
    pub outline_colour: String,
    pub back_colour: String,
    pub font_name: String,
    pub font_size: f64,
    pub bold: i8,
    pub italic: i8,
    pub underline: i8,
    pub strike_out: i8,
    pub encoding: i32,
    pub outline: i32,
    pub shadow: i32,
    pub all_caps: bool,
    /// Fixed by the first position line that uses the style; later uses never change it
    pub alignment: Option<u8>,
}

/// Everything a parse run produces: sentences in file order plus the style
/// table and the derived fixed-style cache, both keyed by two-digit index.
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub sentences: Vec<Sentence>,
    pub styles: BTreeMap<usize, KbpStyle>,
    pub fixed_styles: BTreeMap<usize, KbpStyle>,
}

impl ParseOutput {
    /// All styles in serialization order: regular styles first, then the
    /// fixed variants, each in index order. Events reference both kinds, so
    /// both are written to the output style table.
    pub fn styles(&self) -> impl Iterator<Item = &KbpStyle> {
        self.styles.values().chain(self.fixed_styles.values())
    }
}

/// Which style table the current line's style letter selected
#[derive(Debug, Clone, Copy, PartialEq)]
enum StyleRef {
    Normal(usize),
    Fixed(usize),
}

/// One classified input line. Classification happens exactly once per line,
/// before any state is touched, so each case can be handled (and tested) in
/// isolation.
#[derive(Debug, PartialEq)]
enum LineKind<'a> {
    PageStart,
    Margins,
    DefaultWipe,
    Palette,
    StyleHeader(usize),
    Position,
    Separator,
    Blank,
    Syllable {
        text: &'a str,
        start: &'a str,
        end: &'a str,
        wipe: &'a str,
    },
    Unrecognized,
}

fn classify(line: &str) -> LineKind<'_> {
    if line == "PAGEV2" {
        return LineKind::PageStart;
    }
    if line.starts_with("'Margins") {
        return LineKind::Margins;
    }
    if line.starts_with("'Other") {
        return LineKind::DefaultWipe;
    }
    if line.starts_with("'Palette Colours") {
        return LineKind::Palette;
    }
    if let Some(captures) = STYLE_REGEX.captures(line) {
        // the two-digit capture cannot fail to parse
        let index = captures[1].parse().unwrap_or(0);
        return LineKind::StyleHeader(index);
    }
    if POSITION_REGEX.is_match(line) {
        return LineKind::Position;
    }
    if line.starts_with("--------") || line.starts_with("FX/") || line == "MODS" {
        return LineKind::Separator;
    }
    if line.chars().all(char::is_whitespace) {
        return LineKind::Blank;
    }
    if let Some(captures) = SYLLABLE_REGEX.captures(line) {
        let field = |i| captures.get(i).map_or("", |m| m.as_str());
        return LineKind::Syllable {
            text: field(1),
            start: field(2),
            end: field(3),
            wipe: field(4),
        };
    }
    LineKind::Unrecognized
}

/// Map an alignment letter to its ASS numeric code; centered when unknown
fn alignment_code(letter: &str) -> u8 {
    match letter {
        "L" => 7,
        "R" => 9,
        _ => 8,
    }
}

fn parse_num<T: FromStr>(field: &str, line: usize) -> Result<T, KbpError> {
    field.trim().parse().map_err(|_| KbpError::InvalidNumber {
        line,
        field: field.trim().to_string(),
    })
}

// @struct: Mutable scan state, owned by exactly one parse call
struct ParseState {
    // rendering context carried across lines
    block_count: u32,
    left_margin: i32,
    right_margin: i32,
    top_margin: i32,
    line_spacing: i32,
    palette: Vec<String>,
    default_wipe_progressive: Option<bool>,

    // per-displayed-line context from the most recent position line
    cursor: i32,
    line_offset: i32,
    horizontal_pos: i32,
    alignment: u8,
    rotation: i32,
    line_start_ms: Option<u64>,
    line_end_ms: Option<u64>,
    current_style: Option<StyleRef>,

    // accumulator for the sentence being built
    syllables: Vec<Syllable>,
    sentence_id: usize,
    track_id: u32,

    // results
    sentences: Vec<Sentence>,
    styles: BTreeMap<usize, KbpStyle>,
    fixed_styles: BTreeMap<usize, KbpStyle>,

    // settings snapshot
    border: bool,
    transparency: bool,
    total_width: i32,
    offset_ms: i64,
}

impl ParseState {
    fn new(config: &Config) -> Self {
        Self {
            block_count: 0,
            // KBS defaults, replaced when a 'Margins directive appears
            left_margin: 2,
            right_margin: 2,
            top_margin: 7 + if config.border { BORDER_TOP_OFFSET } else { 0 },
            line_spacing: 12 + LINE_SPACING_CORRECTION,
            palette: Vec::new(),
            default_wipe_progressive: None,
            cursor: 0,
            line_offset: 0,
            horizontal_pos: 0,
            alignment: 8,
            rotation: 0,
            line_start_ms: None,
            line_end_ms: None,
            current_style: None,
            syllables: Vec::new(),
            sentence_id: 1,
            track_id: 1,
            sentences: Vec::new(),
            styles: BTreeMap::new(),
            fixed_styles: BTreeMap::new(),
            border: config.border,
            transparency: config.transparency,
            total_width: config
                .width
                .map(|w| w as i32)
                .unwrap_or(if config.border { 300 } else { 288 }),
            offset_ms: (config.offset * 1000.0).floor() as i64,
        }
    }

    /// Centiseconds to milliseconds with the global offset applied,
    /// clamped so no stored time is ever negative
    fn clamp_time(&self, centiseconds: i64) -> u64 {
        (centiseconds * 10 + self.offset_ms).max(0) as u64
    }

    /// Resolve a raw palette colour to ASS `&HAABGR` doubled-digit form.
    /// Palette colour 0 is the background and goes fully transparent when
    /// transparency mode is on.
    fn palette_colour(&self, index: usize, line: usize) -> Result<String, KbpError> {
        let raw = self.palette.get(index).ok_or(KbpError::PaletteIndexOutOfRange {
            line,
            index,
            len: self.palette.len(),
        })?;
        let alpha = if index == 0 && self.transparency { "FF" } else { "00" };
        let mut colour = String::with_capacity(2 + 2 + raw.len() * 2);
        colour.push_str("&H");
        colour.push_str(alpha);
        for digit in raw.chars().rev() {
            colour.push(digit);
            colour.push(digit);
        }
        Ok(colour)
    }

    /// Select the style a position line refers to. Lowercase letters pick
    /// the fixed (non-wiping) variant, created on first use; uppercase pick
    /// the regular style. Unresolved indices fall back to style 0.
    fn resolve_style(&mut self, letter: char, alignment: u8, line: usize) {
        let resolved = if letter.is_ascii_lowercase() {
            let mut index = (letter as u8 - b'a') as usize;
            if !self.styles.contains_key(&index) {
                index = 0;
            }
            match self.styles.get(&index) {
                Some(base) => {
                    if !self.fixed_styles.contains_key(&index) {
                        let mut fixed = base.clone();
                        fixed.name = format!("{}_Fixed", base.name);
                        // fixed text keeps the pre-wipe colour
                        fixed.primary_colour = base.secondary_colour.clone();
                        fixed.alignment = None;
                        self.fixed_styles.insert(index, fixed);
                    }
                    Some(StyleRef::Fixed(index))
                }
                None => None,
            }
        } else {
            let mut index = (letter as u8 - b'A') as usize;
            if !self.styles.contains_key(&index) {
                index = 0;
            }
            if self.styles.contains_key(&index) {
                Some(StyleRef::Normal(index))
            } else {
                None
            }
        };

        match resolved {
            Some(StyleRef::Normal(index)) => {
                if let Some(style) = self.styles.get_mut(&index) {
                    style.alignment.get_or_insert(alignment);
                }
            }
            Some(StyleRef::Fixed(index)) => {
                if let Some(style) = self.fixed_styles.get_mut(&index) {
                    style.alignment.get_or_insert(alignment);
                }
            }
            None => {
                warn!(
                    "line {}: style letter '{}' has no matching style record, using defaults",
                    line, letter
                );
            }
        }
        self.current_style = resolved;
    }

    /// Alignment recorded on the currently resolved style, if any
    fn current_style_alignment(&self) -> Option<u8> {
        match self.current_style {
            Some(StyleRef::Normal(index)) => self.styles.get(&index)?.alignment,
            Some(StyleRef::Fixed(index)) => self.fixed_styles.get(&index)?.alignment,
            None => None,
        }
    }

    fn current_style_all_caps(&self) -> bool {
        match self.current_style {
            Some(StyleRef::Normal(index)) => {
                self.styles.get(&index).is_some_and(|s| s.all_caps)
            }
            Some(StyleRef::Fixed(index)) => {
                self.fixed_styles.get(&index).is_some_and(|s| s.all_caps)
            }
            None => false,
        }
    }

    fn current_style_name(&self) -> String {
        let name = match self.current_style {
            Some(StyleRef::Normal(index)) => self.styles.get(&index).map(|s| s.name.clone()),
            Some(StyleRef::Fixed(index)) => self.fixed_styles.get(&index).map(|s| s.name.clone()),
            None => None,
        };
        name.or_else(|| self.styles.get(&0).map(|s| s.name.clone()))
            .unwrap_or_else(|| {
                warn!("sentence {} has no resolvable style, using Default", self.sentence_id);
                "Default".to_string()
            })
    }

    /// Handle a position line: advance the vertical cursor, compute the
    /// horizontal position from alignment/margins/border, resolve the style
    /// when the line carries an explicit timing pair, and record that pair.
    fn handle_position(&mut self, line: &str, line_no: usize) -> Result<(), KbpError> {
        let fields: Vec<&str> = line.split('/').collect();
        if fields.len() < 6 {
            return Err(KbpError::TooFewFields {
                line: line_no,
                expected: 6,
                found: fields.len(),
            });
        }

        // the cursor is advanced before the line's syllables are read
        self.cursor += self.line_spacing;

        let offset: i32 = parse_num(fields[4], line_no)?;
        let rotation: i32 = parse_num(fields[5], line_no)?;
        let alignment = alignment_code(fields[0]);

        let side_margin = if alignment == 7 { self.left_margin } else { self.right_margin };
        let border_adjust = if self.border { BORDER_SIDE_ADJUST } else { 0 };
        self.horizontal_pos = (i32::from(alignment) - 7) * self.total_width / 2
            + offset
            + (8 - i32::from(alignment)) * (side_margin + border_adjust);

        self.line_offset = offset;
        self.rotation = rotation;
        self.alignment = alignment;

        let start_field = fields[2].trim();
        let end_field = fields[3].trim();
        if start_field != "0" && end_field != "0" {
            // only a real timing pair fixes the style for the line
            let letter = fields[1].chars().next().unwrap_or('A');
            self.resolve_style(letter, alignment, line_no);
        }

        self.line_start_ms = Some(self.clamp_time(parse_num(start_field, line_no)?));
        self.line_end_ms = Some(self.clamp_time(parse_num(end_field, line_no)?));
        Ok(())
    }

    fn push_syllable(&mut self, text: &str, start: &str, end: &str, wipe: &str, line_no: usize) -> Result<(), KbpError> {
        let start_ms = self.clamp_time(parse_num(start, line_no)?);
        let end_ms = self.clamp_time(parse_num(end, line_no)?);
        if start_ms == 0 && end_ms == 0 {
            // zero/zero entries are placeholders, not real syllables
            return Ok(());
        }

        let wipe_code: u32 = parse_num(wipe, line_no)?;
        let wipe_progressive = match wipe_code {
            0 => self.default_wipe_progressive.unwrap_or(false),
            1..=4 => true,
            _ => false,
        };

        let mut text = text.to_string();
        if self.current_style_all_caps() {
            text = text.to_uppercase();
        }

        self.syllables.push(Syllable {
            text,
            start_ms,
            end_ms,
            duration_ms: end_ms.saturating_sub(start_ms),
            wipe_progressive,
        });
        Ok(())
    }

    /// Sentence boundary: turn the accumulated syllables into a Sentence.
    /// Timing comes from the position line's explicit pair when present,
    /// otherwise from the first/last syllable, widened so the sentence
    /// always covers its syllables.
    fn flush_sentence(&mut self) {
        if self.syllables.is_empty() {
            return;
        }
        let syllables = std::mem::take(&mut self.syllables);
        let first_start = syllables[0].start_ms;
        let last_end = syllables[syllables.len() - 1].end_ms;
        let start_ms = self.line_start_ms.take().unwrap_or(first_start).min(first_start);
        let end_ms = self.line_end_ms.take().unwrap_or(last_end).max(last_end);

        let style_alignment = self.current_style_alignment();
        let alignment = if style_alignment == Some(self.alignment) {
            // matches the style's own alignment, no override needed
            0
        } else {
            self.alignment
        };

        let sentence = Sentence {
            id: self.sentence_id,
            start_ms,
            end_ms,
            duration_ms: end_ms.saturating_sub(start_ms),
            style_name: self.current_style_name(),
            vpos: self.cursor + self.line_offset,
            hpos: self.horizontal_pos,
            alignment,
            rotation: self.rotation,
            syllables,
        };

        if self.track_id == 1 {
            self.sentences.push(sentence);
        }
        self.sentence_id += 1;
    }
}

// @struct: Single-pass KBP parser
pub struct KbpParser<'a> {
    config: &'a Config,
}

impl<'a> KbpParser<'a> {
    pub fn new(config: &'a Config) -> Self {
        KbpParser { config }
    }

    /// Parse a whole project file into sentences and styles.
    ///
    /// The input must be fully buffered: directives anywhere in the file
    /// govern rendering decisions for lines that follow them, and output
    /// order is parse order, never time order.
    pub fn parse(&self, input: &str) -> Result<ParseOutput, KbpError> {
        if !input
            .lines()
            .any(|line| SYLLABLE_REGEX.is_match(line.trim_end()))
        {
            return Err(KbpError::NotAProjectFile);
        }

        let lines: Vec<&str> = input.lines().map(str::trim_end).collect();
        let mut state = ParseState::new(self.config);

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let line_no = i + 1;
            match classify(line) {
                LineKind::PageStart => {
                    state.block_count += 1;
                    // the cursor advances before the first line of the page
                    // is read, so start one spacing above the top margin
                    state.cursor = state.top_margin - state.line_spacing;
                }
                LineKind::Margins => {
                    let data = next_data_line(&lines, i, "'Margins")?;
                    let fields: Vec<&str> = data.trim().split(',').collect();
                    if fields.len() < 4 {
                        return Err(KbpError::TooFewFields {
                            line: line_no + 1,
                            expected: 4,
                            found: fields.len(),
                        });
                    }
                    state.left_margin = parse_num(fields[0], line_no + 1)?;
                    state.right_margin = parse_num(fields[1], line_no + 1)?;
                    state.top_margin = parse_num::<i32>(fields[2], line_no + 1)?
                        + if state.border { BORDER_TOP_OFFSET } else { 0 };
                    state.line_spacing =
                        parse_num::<i32>(fields[3], line_no + 1)? + LINE_SPACING_CORRECTION;
                    i += 1;
                }
                LineKind::DefaultWipe => {
                    let data = next_data_line(&lines, i, "'Other")?;
                    // the second field holds the wipe style; 5 is word by word
                    state.default_wipe_progressive = Some(
                        data.trim()
                            .split(',')
                            .nth(1)
                            .map(|v| v.trim() != "5")
                            .unwrap_or(true),
                    );
                    i += 1;
                }
                LineKind::Palette => {
                    let data = next_data_line(&lines, i, "'Palette Colours")?;
                    state.palette = data.trim().split(',').map(|c| c.trim().to_string()).collect();
                    i += 1;
                }
                LineKind::StyleHeader(index) => {
                    self.parse_style_record(&lines, i, index, &mut state)?;
                    i += 2;
                }
                // everything below only means something inside a page
                LineKind::Position if state.block_count > 0 => {
                    state.handle_position(line, line_no)?;
                }
                LineKind::Blank if state.block_count > 0 => state.flush_sentence(),
                LineKind::Syllable { text, start, end, wipe } if state.block_count > 0 => {
                    state.push_syllable(text, start, end, wipe, line_no)?;
                }
                _ => {}
            }
            i += 1;
        }

        // a final sentence is not required to be followed by a blank line
        state.flush_sentence();

        debug!(
            "Parsed {} sentences, {} styles ({} fixed)",
            state.sentences.len(),
            state.styles.len(),
            state.fixed_styles.len()
        );

        Ok(ParseOutput {
            sentences: state.sentences,
            styles: state.styles,
            fixed_styles: state.fixed_styles,
        })
    }

    /// Parse the 3-line `StyleNN` record starting at `i`.
    ///
    /// The colour field order is deliberately cross-wired: the record stores
    /// secondary, outline, primary, back at fields 2..=5.
    fn parse_style_record(
        &self,
        lines: &[&str],
        i: usize,
        index: usize,
        state: &mut ParseState,
    ) -> Result<(), KbpError> {
        let header_no = i + 1;
        if state.palette.is_empty() {
            return Err(KbpError::MissingPalette { line: header_no });
        }

        let fields: Vec<&str> = lines[i].trim_start().split(',').collect();
        if fields.len() < 6 {
            return Err(KbpError::TooFewFields {
                line: header_no,
                expected: 6,
                found: fields.len(),
            });
        }
        let name = format!("{}_{}", fields[0], fields[1]);
        let secondary_colour = state.palette_colour(parse_num(fields[2], header_no)?, header_no)?;
        let outline_colour = state.palette_colour(parse_num(fields[3], header_no)?, header_no)?;
        let primary_colour = state.palette_colour(parse_num(fields[4], header_no)?, header_no)?;
        let back_colour = state.palette_colour(parse_num(fields[5], header_no)?, header_no)?;

        let font_line = lines
            .get(i + 1)
            .ok_or(KbpError::TruncatedStyle { line: header_no, index })?;
        let fields: Vec<&str> = font_line.trim().split(',').collect();
        if fields.len() < 4 {
            return Err(KbpError::TooFewFields {
                line: header_no + 1,
                expected: 4,
                found: fields.len(),
            });
        }
        let font_name = fields[0].to_string();
        let cap_height: f64 = parse_num(fields[1], header_no + 1)?;
        // empty when no attributes are applied, otherwise any of B, I, S, U
        let attributes = fields[2];
        let bold = if attributes.contains('B') { -1 } else { 0 };
        let italic = if attributes.contains('I') { -1 } else { 0 };
        let strike_out = if attributes.contains('S') { -1 } else { 0 };
        let underline = if attributes.contains('U') { -1 } else { 0 };
        let encoding: i32 = parse_num(fields[3], header_no + 1)?;

        let geometry_line = lines
            .get(i + 2)
            .ok_or(KbpError::TruncatedStyle { line: header_no, index })?;
        let fields: Vec<&str> = geometry_line.trim().split(',').collect();
        if fields.len() < 8 {
            return Err(KbpError::TooFewFields {
                line: header_no + 2,
                expected: 8,
                found: fields.len(),
            });
        }
        // fields 0-3 are left/right/top/bottom outline, 4-5 right/down shadow,
        // 6 the wiped part (text, outline, both)
        let outline: i32 = parse_num(fields[0], header_no + 2)?;
        let shadow: i32 = parse_num(fields[4], header_no + 2)?;
        let all_caps = fields[7].trim() == "U";

        state.styles.insert(
            index,
            KbpStyle {
                name,
                primary_colour,
                secondary_colour,
                outline_colour,
                back_colour,
                font_name,
                font_size: cap_height * CAP_HEIGHT_TO_LINE_HEIGHT,
                bold,
                italic,
                underline,
                strike_out,
                encoding,
                outline,
                shadow,
                all_caps,
                alignment: None,
            },
        );
        Ok(())
    }
}

/// The data line that must follow a directive; running off the end of the
/// input here means the file is structurally corrupt
fn next_data_line<'b>(lines: &[&'b str], i: usize, directive: &str) -> Result<&'b str, KbpError> {
    lines.get(i + 1).copied().ok_or_else(|| KbpError::TruncatedDirective {
        line: i + 1,
        directive: directive.to_string(),
    })
}
