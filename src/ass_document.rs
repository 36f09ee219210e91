use std::fmt;
use crate::ass_generator::format_ass_time;
use crate::kbp_parser::KbpStyle;

// @module: Typed ASS sections and the flat-text serializer

/// Effect marker on the karaoke Comment events carrying the raw wipe timing
pub const KARAOKE_EFFECT: &str = "karaoke";

/// Effect marker on the visible Dialogue events
pub const FX_EFFECT: &str = "fx";

/// Field order of every Style line
pub const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

/// Field order of every Dialogue/Comment line
pub const EVENT_FORMAT: &str = "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// One style record in the [V4+ Styles] section, full V4+ field set.
/// Fields not encoded in a KBP style record keep these defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AssStyle {
    pub name: String,
    pub font_name: String,
    pub font_size: f64,
    pub primary_colour: String,
    pub secondary_colour: String,
    pub outline_colour: String,
    pub back_colour: String,
    pub bold: i8,
    pub italic: i8,
    pub underline: i8,
    pub strike_out: i8,
    pub scale_x: u32,
    pub scale_y: u32,
    pub spacing: i32,
    pub angle: i32,
    pub border_style: u8,
    pub outline: i32,
    pub shadow: i32,
    pub alignment: u8,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub encoding: i32,
}

impl Default for AssStyle {
    fn default() -> Self {
        AssStyle {
            name: "Default".to_string(),
            font_name: "Arial".to_string(),
            font_size: 16.8,
            primary_colour: "&H00FFFFFF".to_string(),
            secondary_colour: "&H000000FF".to_string(),
            outline_colour: "&H00000000".to_string(),
            back_colour: "&H00000000".to_string(),
            bold: 0,
            italic: 0,
            underline: 0,
            strike_out: 0,
            scale_x: 100,
            scale_y: 100,
            spacing: 0,
            angle: 0,
            border_style: 1,
            outline: 1,
            shadow: 1,
            // KBS centers text at the top of the page
            alignment: 8,
            margin_l: 0,
            margin_r: 0,
            margin_v: 0,
            encoding: 1,
        }
    }
}

impl From<&KbpStyle> for AssStyle {
    fn from(style: &KbpStyle) -> Self {
        AssStyle {
            name: style.name.clone(),
            font_name: style.font_name.clone(),
            font_size: style.font_size,
            primary_colour: style.primary_colour.clone(),
            secondary_colour: style.secondary_colour.clone(),
            outline_colour: style.outline_colour.clone(),
            back_colour: style.back_colour.clone(),
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            strike_out: style.strike_out,
            outline: style.outline,
            shadow: style.shadow,
            alignment: style.alignment.unwrap_or(8),
            encoding: style.encoding,
            ..AssStyle::default()
        }
    }
}

impl fmt::Display for AssStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Style: {},{},{:.2},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.name,
            self.font_name,
            self.font_size,
            self.primary_colour,
            self.secondary_colour,
            self.outline_colour,
            self.back_colour,
            self.bold,
            self.italic,
            self.underline,
            self.strike_out,
            self.scale_x,
            self.scale_y,
            self.spacing,
            self.angle,
            self.border_style,
            self.outline,
            self.shadow,
            self.alignment,
            self.margin_l,
            self.margin_r,
            self.margin_v,
            self.encoding
        )
    }
}

/// Whether an event is rendered or kept as an inert record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    Dialogue,
    Comment,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventKind::Dialogue => write!(f, "Dialogue"),
            EventKind::Comment => write!(f, "Comment"),
        }
    }
}

// @struct: One line of the [Events] section
#[derive(Debug, Clone, PartialEq)]
pub struct AssEvent {
    // @field: Dialogue or Comment
    pub kind: EventKind,

    // @field: Layer number
    pub layer: u32,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Referenced style name
    pub style: String,

    // @field: Speaker name, unused here
    pub name: String,

    // @field: Margin overrides, 0 keeps the style margins
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,

    // @field: Effect marker
    pub effect: String,

    // @field: Tag-decorated event text
    pub text: String,
}

impl AssEvent {
    /// The fixed Comment event leading the [Events] section
    pub fn scripting_comment() -> Self {
        AssEvent {
            kind: EventKind::Comment,
            layer: 0,
            start_ms: 0,
            end_ms: 0,
            style: "Default".to_string(),
            name: String::new(),
            margin_l: 0,
            margin_r: 0,
            margin_v: 0,
            effect: "scripting".to_string(),
            text: "The karaoke Comment events below carry the raw syllable timing; \
                   Dialogue lines add lead-in, fade and positioning on top of it."
                .to_string(),
        }
    }
}

impl fmt::Display for AssEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {},{},{},{},{},{},{},{},{},{}",
            self.kind,
            self.layer,
            format_ass_time(self.start_ms),
            format_ass_time(self.end_ms),
            self.style,
            self.name,
            self.margin_l,
            self.margin_r,
            self.margin_v,
            self.effect,
            self.text
        )
    }
}

/// The assembled output document: script metadata, style table, events.
/// Events stay in the order they were pushed; page/line order in the source
/// encodes implicit layering, so they are never re-sorted.
#[derive(Debug, Default)]
pub struct AssDocument {
    /// Virtual resolution, only set in CDG compatibility mode
    pub play_res: Option<(u32, u32)>,
    pub styles: Vec<AssStyle>,
    pub events: Vec<AssEvent>,
}

impl AssDocument {
    /// Serialize the sections into flat ASS text
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.events.len() * 120 + 1024);

        out.push_str("[Script Info]\n");
        out.push_str("; Script generated by kbp2ass\n");
        out.push_str("ScriptType: v4.00+\n");
        out.push_str("Collisions: Normal\n");
        out.push_str("WrapStyle: 0\n");
        out.push_str("ScaledBorderAndShadow: yes\n");
        if let Some((x, y)) = self.play_res {
            out.push_str(&format!("PlayResX: {}\n", x));
            out.push_str(&format!("PlayResY: {}\n", y));
        }
        out.push('\n');

        out.push_str("[V4+ Styles]\n");
        out.push_str(STYLE_FORMAT);
        out.push('\n');
        for style in &self.styles {
            out.push_str(&style.to_string());
            out.push('\n');
        }
        out.push('\n');

        out.push_str("[Events]\n");
        out.push_str(EVENT_FORMAT);
        out.push('\n');
        for event in &self.events {
            out.push_str(&event.to_string());
            out.push('\n');
        }

        out
    }
}
