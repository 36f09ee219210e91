/*!
 * Tests for output document serialization
 */

use kbp2ass::{AssDocument, AssEvent, AssStyle, EventKind, KbpStyle};

fn sample_event() -> AssEvent {
    AssEvent {
        kind: EventKind::Dialogue,
        layer: 0,
        start_ms: 1234,
        end_ms: 5678,
        style: "Style00_Default".to_string(),
        name: String::new(),
        margin_l: 0,
        margin_r: 0,
        margin_v: 0,
        effect: "fx".to_string(),
        text: "{\\k10}hi".to_string(),
    }
}

/// Test style line rendering: field order and two-decimal font size
#[test]
fn test_style_display_withDefaultStyle_shouldRenderAllFields() {
    let style = AssStyle::default();
    let rendered = style.to_string();

    assert!(rendered.starts_with("Style: Default,Arial,16.80,&H00FFFFFF,&H000000FF,"));
    // the payload must match the Format line's 23 fields
    let payload = rendered.strip_prefix("Style: ").unwrap();
    assert_eq!(payload.split(',').count(), 23);
}

/// Test conversion from a parsed KBP style into the output record
#[test]
fn test_style_from_kbp_withParsedStyle_shouldCarryAttributes() {
    let kbp = KbpStyle {
        name: "Style03_Big".to_string(),
        primary_colour: "&H00000000".to_string(),
        secondary_colour: "&H000000FF".to_string(),
        outline_colour: "&H00FF0000".to_string(),
        back_colour: "&H00FFFFFF".to_string(),
        font_name: "Tahoma".to_string(),
        font_size: 19.6,
        bold: -1,
        italic: 0,
        underline: 0,
        strike_out: -1,
        encoding: 0,
        outline: 2,
        shadow: 1,
        all_caps: true,
        alignment: Some(9),
    };
    let style = AssStyle::from(&kbp);

    assert_eq!(style.name, "Style03_Big");
    assert_eq!(style.font_name, "Tahoma");
    assert_eq!(style.bold, -1);
    assert_eq!(style.strike_out, -1);
    assert_eq!(style.alignment, 9);
    let rendered = style.to_string();
    assert!(rendered.starts_with("Style: Style03_Big,Tahoma,19.60,"));
}

/// Test that an unset alignment serializes as the KBS default
#[test]
fn test_style_from_kbp_withUnsetAlignment_shouldDefaultToTopCenter() {
    let kbp = KbpStyle {
        name: "S".to_string(),
        primary_colour: String::new(),
        secondary_colour: String::new(),
        outline_colour: String::new(),
        back_colour: String::new(),
        font_name: "Arial".to_string(),
        font_size: 16.8,
        bold: 0,
        italic: 0,
        underline: 0,
        strike_out: 0,
        encoding: 0,
        outline: 1,
        shadow: 1,
        all_caps: false,
        alignment: None,
    };
    assert_eq!(AssStyle::from(&kbp).alignment, 8);
}

/// Test event line rendering with formatted timestamps
#[test]
fn test_event_display_withDialogue_shouldRenderTimestamps() {
    let rendered = sample_event().to_string();
    assert_eq!(
        rendered,
        "Dialogue: 0,0:00:01.23,0:00:05.67,Style00_Default,,0,0,0,fx,{\\k10}hi"
    );
}

/// Test document rendering: section order, Format lines, optional PlayRes
#[test]
fn test_document_render_withEvents_shouldEmitSectionsInOrder() {
    let document = AssDocument {
        play_res: None,
        styles: vec![AssStyle::default()],
        events: vec![AssEvent::scripting_comment(), sample_event()],
    };
    let rendered = document.render();

    let script_info = rendered.find("[Script Info]").unwrap();
    let styles = rendered.find("[V4+ Styles]").unwrap();
    let events = rendered.find("[Events]").unwrap();
    assert!(script_info < styles && styles < events);

    assert!(rendered.contains("ScriptType: v4.00+"));
    assert!(rendered.contains("Format: Name, Fontname, Fontsize,"));
    assert!(rendered.contains("Format: Layer, Start, End, Style,"));
    assert!(rendered.contains("Comment: 0,0:00:00.00,0:00:00.00,Default,,0,0,0,scripting,"));
    assert!(!rendered.contains("PlayResX"));
}

/// Test that the virtual resolution appears only when set
#[test]
fn test_document_render_withPlayRes_shouldEmitResolution() {
    let document = AssDocument {
        play_res: Some((300, 216)),
        styles: vec![AssStyle::default()],
        events: Vec::new(),
    };
    let rendered = document.render();
    assert!(rendered.contains("PlayResX: 300\n"));
    assert!(rendered.contains("PlayResY: 216\n"));
}
