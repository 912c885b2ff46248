/*!
 * Tests for subtitle processing functionality
 */

use anyhow::Result;
use std::fs;
use subtrans::errors::SubtitleError;
use subtrans::subtitle_processor::{SubtitleCollection, SubtitleEncoding, SubtitleEntry};

use crate::common;

/// Test timestamp parsing and formatting
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let ms = SubtitleEntry::parse_timestamp(ts).unwrap();
    assert_eq!(ms, 5_025_678);
    assert_eq!(SubtitleEntry::format_timestamp(ms), ts);

    // Dot separator is accepted on input
    assert_eq!(SubtitleEntry::parse_timestamp("00:00:01.500"), Some(1500));
}

#[test]
fn test_timestamp_parsing_withOutOfRangeFields_shouldReject() {
    assert_eq!(SubtitleEntry::parse_timestamp("00:60:00,000"), None);
    assert_eq!(SubtitleEntry::parse_timestamp("00:00:61,000"), None);
    assert_eq!(SubtitleEntry::parse_timestamp("00:00:01,5"), None);
    assert_eq!(SubtitleEntry::parse_timestamp("garbage"), None);
}

/// Test subtitle entry display formatting
#[test]
fn test_subtitle_entry_display_withMultilineText_shouldWriteSrtBlock() {
    let entry = SubtitleEntry::new(7, 61_234, 65_432, "Hello\nWorld".to_string());
    assert_eq!(entry.to_string(), "7\n00:01:01,234 --> 00:01:05,432\nHello\nWorld\n\n");
}

#[test]
fn test_parse_srt_string_withValidContent_shouldKeepOrderAndIndices() {
    let content = "5\n00:00:01,000 --> 00:00:02,000\nFirst\n\n2\n00:00:03,000 --> 00:00:04,000\nSecond\nline two\n";
    let entries = SubtitleCollection::parse_srt_string(content).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq_num, 5);
    assert_eq!(entries[1].seq_num, 2);
    assert_eq!(entries[1].text, "Second\nline two");
}

#[test]
fn test_parse_srt_string_withBomCrlfAndCoordinates_shouldParse() {
    let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000 X1:100 X2:200\r\nHello\r\n\r\n";
    let entries = SubtitleCollection::parse_srt_string(content).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].start_time_ms, 1000);
    assert_eq!(entries[0].text, "Hello");
}

#[test]
fn test_parse_srt_string_withEmptyTextAndEmptyInput_shouldAccept() {
    let entries = SubtitleCollection::parse_srt_string("1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nText\n").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "");

    assert!(SubtitleCollection::parse_srt_string("").unwrap().is_empty());
    assert!(SubtitleCollection::parse_srt_string("\n\n").unwrap().is_empty());
}

#[test]
fn test_parse_srt_string_withMalformedInput_shouldReturnTypedError() {
    let bad_index = SubtitleCollection::parse_srt_string("one\n00:00:01,000 --> 00:00:02,000\nText\n");
    assert!(matches!(bad_index, Err(SubtitleError::MalformedBlock { line: 1, .. })));

    let bad_timestamp = SubtitleCollection::parse_srt_string("1\n00:00:01,000 --> 00:99:02,000\nText\n");
    assert!(matches!(bad_timestamp, Err(SubtitleError::InvalidTimestamp { line: 2, .. })));

    let reversed = SubtitleCollection::parse_srt_string("3\n00:00:05,000 --> 00:00:02,000\nText\n");
    assert!(matches!(reversed, Err(SubtitleError::InvalidTimeRange { index: 3, .. })));

    let missing_timing = SubtitleCollection::parse_srt_string("1\n");
    assert!(matches!(missing_timing, Err(SubtitleError::MalformedBlock { .. })));
}

#[test]
fn test_load_withMissingFile_shouldReturnUnreadable() {
    let result = SubtitleCollection::load("/nonexistent/dir/missing.srt");
    assert!(matches!(result, Err(SubtitleError::Unreadable { .. })));
}

/// Load -> save -> load keeps every cue unchanged
#[test]
fn test_save_then_load_withSampleFile_shouldPreserveCues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "sample.srt")?;
    let output = temp_dir.path().join("nested").join("copy.srt");

    let original = SubtitleCollection::load(&input)?;
    original.save(&output, SubtitleEncoding::Utf8)?;
    let reloaded = SubtitleCollection::load(&output)?;

    assert_eq!(reloaded.entries(), original.entries());
    assert_eq!(reloaded.len(), 3);
    Ok(())
}

#[test]
fn test_save_withBomEncoding_shouldPrefixByteOrderMark() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "sample.srt")?;
    let output = temp_dir.path().join("bom.srt");

    SubtitleCollection::load(&input)?.save(&output, SubtitleEncoding::Utf8Bom)?;

    let bytes = fs::read(&output)?;
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    assert_eq!(SubtitleCollection::load(&output)?.len(), 3);
    Ok(())
}

#[test]
fn test_set_text_withValidAndInvalidPosition_shouldOnlyChangeText() {
    let entries = SubtitleCollection::parse_srt_string(common::HELLO_WORLD_SRT).unwrap();
    let mut collection = SubtitleCollection::from_entries("sample.srt".into(), entries);

    assert_eq!(collection.set_text(1, "Monde".to_string()), Some("World".to_string()));
    assert_eq!(collection.set_text(3, "ignored".to_string()), None);

    let cue = &collection.entries()[1];
    assert_eq!(cue.text, "Monde");
    assert_eq!(cue.seq_num, 2);
    assert_eq!((cue.start_time_ms, cue.end_time_ms), (3000, 4000));
}
