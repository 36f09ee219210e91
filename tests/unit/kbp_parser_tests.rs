/*!
 * Tests for Karaoke Builder project file parsing
 */

use kbp2ass::{Config, KbpError, KbpParser};
use crate::common;

/// Test the minimal end-to-end parse: one block, one style, one positioned
/// line with a single syllable
#[test]
fn test_parse_withMinimalProject_shouldProduceSingleSentence() {
    let config = Config::default();
    let parsed = KbpParser::new(&config).parse(common::minimal_project()).unwrap();

    assert_eq!(parsed.sentences.len(), 1);
    let sentence = &parsed.sentences[0];
    assert_eq!(sentence.id, 1);
    assert_eq!(sentence.syllables.len(), 1);

    let syllable = &sentence.syllables[0];
    assert_eq!(syllable.text, "HI");
    assert_eq!(syllable.start_ms, 1000);
    assert_eq!(syllable.end_ms, 2000);
    assert_eq!(syllable.duration_ms, 1000);

    // the position line's timing pair wins over the syllable span
    assert_eq!(sentence.start_ms, 1000);
    assert_eq!(sentence.end_ms, 3000);
    assert_eq!(sentence.duration_ms, 2000);
    assert_eq!(sentence.style_name, "Style00_Default");

    // C resolved to 8 and pushed into the style on first use, so the
    // sentence itself carries no override
    assert_eq!(parsed.styles[&0].alignment, Some(8));
    assert_eq!(sentence.alignment, 0);
}

/// Test that input without any syllable-shaped line is rejected outright
#[test]
fn test_parse_withNoSyllableLines_shouldFail() {
    let config = Config::default();
    let result = KbpParser::new(&config).parse("just some text\nPAGEV2\nnothing timed\n");
    assert!(matches!(result, Err(KbpError::NotAProjectFile)));
}

/// Test style attribute decoding, colour cross-wiring and palette lookups
#[test]
fn test_parse_withStyleRecord_shouldResolveColours() {
    let config = Config::default();
    let parsed = KbpParser::new(&config).parse(common::minimal_project()).unwrap();

    let style = &parsed.styles[&0];
    assert_eq!(style.name, "Style00_Default");
    // field 4 -> primary, field 2 -> secondary, field 3 -> outline, field 5 -> back
    assert_eq!(style.primary_colour, "&H00000000"); // palette 1 = 000
    assert_eq!(style.secondary_colour, "&H000000FF"); // palette 2 = F00
    assert_eq!(style.outline_colour, "&H00FF0000"); // palette 3 = 00F
    assert_eq!(style.back_colour, "&H00FFFFFF"); // palette 0 = FFF
    assert_eq!(style.font_name, "Arial");
    // cap height 12 scaled to line height
    assert!((style.font_size - 16.8).abs() < 1e-9);
    assert_eq!(style.bold, 0);
    assert_eq!(style.outline, 1);
    assert_eq!(style.shadow, 1);
    assert!(!style.all_caps);
}

/// Test that transparency mode makes palette colour 0 fully transparent
#[test]
fn test_parse_withTransparency_shouldHideBackgroundColour() {
    let config = Config { transparency: true, ..Config::default() };
    let parsed = KbpParser::new(&config).parse(common::minimal_project()).unwrap();

    // back colour of the style comes from palette index 0
    assert_eq!(parsed.styles[&0].back_colour, "&HFFFFFFFF");
    // other indices keep the opaque alpha
    assert_eq!(parsed.styles[&0].secondary_colour, "&H000000FF");
}

/// Test the fixed-style variant selected by a lowercase style letter
#[test]
fn test_parse_withLowercaseStyleLetter_shouldDeriveFixedStyle() {
    let config = Config::default();
    let parsed = KbpParser::new(&config).parse(common::full_project()).unwrap();

    let normal = &parsed.styles[&0];
    let fixed = &parsed.fixed_styles[&0];
    assert_eq!(fixed.name, "Style00_Default_Fixed");
    // fixed text keeps the pre-wipe colour
    assert_eq!(fixed.primary_colour, normal.secondary_colour);

    let fixed_sentence = parsed
        .sentences
        .iter()
        .find(|s| s.style_name.ends_with("_Fixed"))
        .expect("a sentence should use the fixed variant");
    assert_ne!(fixed_sentence.style_name, normal.name);

    // serialization order is regular styles then fixed styles
    let names: Vec<&str> = parsed.styles().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Style00_Default", "Style01_Shout", "Style00_Default_Fixed"]
    );
}

/// Test all-caps styles upper-casing their syllables
#[test]
fn test_parse_withAllCapsStyle_shouldUppercaseText() {
    let config = Config::default();
    let parsed = KbpParser::new(&config).parse(common::full_project()).unwrap();

    let shout = parsed
        .sentences
        .iter()
        .find(|s| s.style_name == "Style01_Shout")
        .expect("the second line uses Style01");
    assert_eq!(shout.syllables[0].text, "WORLD");
}

/// Test wipe-code handling: 0 inherits the file default, 1-4 are
/// progressive, 5 and above are word by word
#[test]
fn test_parse_withWipeCodes_shouldResolveProgressiveFlags() {
    let config = Config::default();
    let input = "'Other\n\
                 0,5,0\n\
                 PAGEV2\n\
                 C/A/100/600/0/0\n\
                 inherit/100/200/0\n\
                 sweep/200/300/2\n\
                 word/300/400/6\n\
                 \n";
    let parsed = KbpParser::new(&config).parse(input).unwrap();

    let syllables = &parsed.sentences[0].syllables;
    // the 'Other directive selected word-by-word as the file default
    assert!(!syllables[0].wipe_progressive);
    assert!(syllables[1].wipe_progressive);
    assert!(!syllables[2].wipe_progressive);
}

/// Test that a negative global offset clamps every stored time at zero
#[test]
fn test_parse_withNegativeOffset_shouldClampTimesToZero() {
    let config = Config { offset: -1.5, ..Config::default() };
    let parsed = KbpParser::new(&config).parse(common::minimal_project()).unwrap();

    let sentence = &parsed.sentences[0];
    assert_eq!(sentence.start_ms, 0);
    assert_eq!(sentence.end_ms, 1500);
    assert_eq!(sentence.syllables[0].start_ms, 0);
    assert_eq!(sentence.syllables[0].end_ms, 500);
}

/// Test that a syllable whose clamped times are both zero is a placeholder
/// and never enters the sentence
#[test]
fn test_parse_withZeroTimedSyllable_shouldDiscardIt() {
    let config = Config::default();
    let input = "PAGEV2\n\
                 C/A/100/300/0/0\n\
                 X/0/0/0\n\
                 HI/100/200/0\n\
                 \n";
    let parsed = KbpParser::new(&config).parse(input).unwrap();

    assert_eq!(parsed.sentences.len(), 1);
    assert_eq!(parsed.sentences[0].syllables.len(), 1);
    assert_eq!(parsed.sentences[0].syllables[0].text, "HI");
}

/// Test margin and cursor arithmetic for a left-aligned positioned line
#[test]
fn test_parse_withMarginsAndLeftAlignment_shouldComputePositions() {
    let config = Config::default();
    let input = "'Margins\n\
                 4,6,10,12\n\
                 PAGEV2\n\
                 L/A/100/300/5/0\n\
                 HI/100/200/0\n\
                 \n";
    let parsed = KbpParser::new(&config).parse(input).unwrap();

    let sentence = &parsed.sentences[0];
    // no style table: left alignment stays as an explicit override
    assert_eq!(sentence.alignment, 7);
    // hpos = (7-7)*288/2 + 5 + (8-7)*(left margin 4) = 9
    assert_eq!(sentence.hpos, 9);
    // cursor starts at top - corrected spacing, advances once: vpos = 10 + 5
    assert_eq!(sentence.vpos, 15);
    assert_eq!(sentence.rotation, 0);
}

/// Test the border option's fixed margin adjustments
#[test]
fn test_parse_withBorder_shouldApplyFixedOffsets() {
    let config = Config { border: true, ..Config::default() };
    let input = "'Margins\n\
                 4,6,10,12\n\
                 PAGEV2\n\
                 L/A/100/300/0/0\n\
                 HI/100/200/0\n\
                 \n";
    let parsed = KbpParser::new(&config).parse(input).unwrap();

    let sentence = &parsed.sentences[0];
    // left margin gains the 6 virtual pixels of CDG border
    assert_eq!(sentence.hpos, 10);
    // top margin gains the 12-pixel top border
    assert_eq!(sentence.vpos, 22);
}

/// Test that a style header without its two data lines is a structural fault
#[test]
fn test_parse_withTruncatedStyleRecord_shouldFail() {
    let config = Config::default();
    let input = "'Palette Colours\n\
                 FFF,000\n\
                 PAGEV2\n\
                 C/A/100/300/0/0\n\
                 HI/100/200/0\n\
                 \n\
                 Style01,Broken,0,0,0,0\n";
    let result = KbpParser::new(&config).parse(input);
    assert!(matches!(result, Err(KbpError::TruncatedStyle { index: 1, .. })));
}

/// Test that a directive announcing a data line that never comes fails
#[test]
fn test_parse_withTruncatedDirective_shouldFail() {
    let config = Config::default();
    let input = "PAGEV2\n\
                 C/A/100/300/0/0\n\
                 HI/100/200/0\n\
                 \n\
                 'Palette Colours";
    let result = KbpParser::new(&config).parse(input);
    assert!(matches!(result, Err(KbpError::TruncatedDirective { .. })));
}

/// Test that a style record before any palette cannot resolve colours
#[test]
fn test_parse_withStyleBeforePalette_shouldFail() {
    let config = Config::default();
    let input = "Style00,Default,2,3,1,0,0\n\
                 \x20 Arial,12,,0\n\
                 \x20 1,0,0,0,1,0,0,L\n\
                 PAGEV2\n\
                 C/A/100/300/0/0\n\
                 HI/100/200/0\n\
                 \n";
    let result = KbpParser::new(&config).parse(input);
    assert!(matches!(result, Err(KbpError::MissingPalette { .. })));
}

/// Test that lines before the first page marker are ignored apart from the
/// directives, and that sentences keep file order
#[test]
fn test_parse_withTwoPages_shouldKeepFileOrder() {
    let config = Config::default();
    let parsed = KbpParser::new(&config).parse(common::full_project()).unwrap();

    assert_eq!(parsed.sentences.len(), 3);
    let ids: Vec<usize> = parsed.sentences.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(parsed.sentences[0].syllables[0].text, "HEL");
    assert_eq!(parsed.sentences[2].syllables[0].text, "(instrumental)");
}

/// Test that a trailing sentence without a final blank line still flushes
#[test]
fn test_parse_withMissingFinalBlankLine_shouldFlushLastSentence() {
    let config = Config::default();
    let input = "PAGEV2\n\
                 C/A/100/300/0/0\n\
                 HI/100/200/0";
    let parsed = KbpParser::new(&config).parse(input).unwrap();
    assert_eq!(parsed.sentences.len(), 1);
}

/// Test that an unresolvable style letter falls back to index 0
#[test]
fn test_parse_withUnknownStyleLetter_shouldFallBackToStyleZero() {
    let config = Config::default();
    let input = "'Palette Colours\n\
                 FFF,000,F00,00F\n\
                 Style00,Default,2,3,1,0,0\n\
                 \x20 Arial,12,,0\n\
                 \x20 1,0,0,0,1,0,0,L\n\
                 PAGEV2\n\
                 C/Q/100/300/0/0\n\
                 HI/100/200/0\n\
                 \n";
    let parsed = KbpParser::new(&config).parse(input).unwrap();
    assert_eq!(parsed.sentences[0].style_name, "Style00_Default");
}
