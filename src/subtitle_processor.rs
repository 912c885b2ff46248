use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use log::debug;

use crate::errors::{PersistenceError, SubtitleError};
use crate::file_utils::FileManager;

// @module: Subtitle document model and SRT codec

// @const: SRT timing line, trailing coordinates allowed
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{1,3}:\d{2}:\d{2}[,.]\d{3})(?:\s.*)?$").unwrap()
});

const UTF8_BOM: char = '\u{feff}';

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Sequence number as written in the file
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text, lines joined with '\n'
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Option<u64> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();
        if parts.len() != 4 {
            return None;
        }

        let hours: u64 = parts[0].parse().ok()?;
        let minutes: u64 = parts[1].parse().ok()?;
        let seconds: u64 = parts[2].parse().ok()?;
        let millis: u64 = parts[3].parse().ok()?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 || parts[3].len() != 3 {
            return None;
        }

        Some(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Text encoding used when saving a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubtitleEncoding {
    /// Plain UTF-8
    #[default]
    Utf8,
    /// UTF-8 prefixed with a byte order mark, for players that need it
    Utf8Bom,
}

/// Ordered subtitle entries loaded from one file.
///
/// Entries can only be read or have their text replaced; the sequence
/// itself is fixed once the collection is built.
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// Source filename
    source_file: PathBuf,

    /// List of subtitle entries
    entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Build a collection from already parsed entries
    pub fn from_entries(source_file: PathBuf, entries: Vec<SubtitleEntry>) -> Self {
        SubtitleCollection {
            source_file,
            entries,
        }
    }

    /// Load and parse an SRT file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SubtitleError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let entries = Self::parse_srt_string(&content)?;
        debug!("Loaded {} subtitle entries from {}", entries.len(), path.display());

        Ok(Self::from_entries(path.to_path_buf(), entries))
    }

    /// Write the collection to an SRT file, replacing any existing file
    pub fn save<P: AsRef<Path>>(&self, path: P, encoding: SubtitleEncoding) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let mut content = String::new();
        if encoding == SubtitleEncoding::Utf8Bom {
            content.push(UTF8_BOM);
        }
        content.push_str(&self.to_srt_string());

        FileManager::write_atomic(path, content.as_bytes())
    }

    /// Serialize all entries in SRT format
    pub fn to_srt_string(&self) -> String {
        self.entries.iter().map(|entry| entry.to_string()).collect()
    }

    /// Path the collection was loaded from
    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    /// Entries in document order
    pub fn entries(&self) -> &[SubtitleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the text of the entry at `position` (0-based), returning the previous text.
    /// Returns `None` when the position is out of range.
    pub fn set_text(&mut self, position: usize, text: String) -> Option<String> {
        self.entries
            .get_mut(position)
            .map(|entry| std::mem::replace(&mut entry.text, text))
    }

    /// Parse SRT format string into subtitle entries.
    ///
    /// Blocks are `index`, `start --> end`, zero or more text lines, then a
    /// blank line or end of input. Entries keep the order and indices found
    /// in the content.
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
        let mut entries = Vec::new();
        let mut lines = content.lines().enumerate().peekable();

        loop {
            // Skip blank lines between blocks
            while lines.peek().is_some_and(|(_, line)| line.trim().is_empty()) {
                lines.next();
            }

            let Some((index_line_no, index_line)) = lines.next() else {
                break;
            };

            let seq_num = index_line.trim().parse::<usize>().map_err(|_| SubtitleError::MalformedBlock {
                line: index_line_no + 1,
                reason: format!("expected cue index, found '{}'", index_line.trim()),
            })?;

            let (timing_line_no, timing_line) = lines.next().ok_or_else(|| SubtitleError::MalformedBlock {
                line: index_line_no + 2,
                reason: format!("cue {} has no timing line", seq_num),
            })?;
            let (start_time_ms, end_time_ms) = Self::parse_timing_line(timing_line, timing_line_no + 1)?;

            if start_time_ms > end_time_ms {
                return Err(SubtitleError::InvalidTimeRange {
                    index: seq_num,
                    start_ms: start_time_ms,
                    end_ms: end_time_ms,
                });
            }

            let mut text_lines = Vec::new();
            while let Some((_, line)) = lines.peek() {
                if line.trim().is_empty() {
                    break;
                }
                text_lines.push(*line);
                lines.next();
            }

            entries.push(SubtitleEntry::new(seq_num, start_time_ms, end_time_ms, text_lines.join("\n")));
        }

        Ok(entries)
    }

    /// Parse a `start --> end` line into milliseconds
    fn parse_timing_line(line: &str, line_no: usize) -> Result<(u64, u64), SubtitleError> {
        let trimmed = line.trim();
        let invalid = || SubtitleError::InvalidTimestamp {
            line: line_no,
            value: trimmed.to_string(),
        };

        if !trimmed.contains("-->") {
            return Err(SubtitleError::MalformedBlock {
                line: line_no,
                reason: format!("expected timing line, found '{}'", trimmed),
            });
        }

        let caps = TIMING_REGEX.captures(trimmed).ok_or_else(invalid)?;
        let start = SubtitleEntry::parse_timestamp(&caps[1]).ok_or_else(invalid)?;
        let end = SubtitleEntry::parse_timestamp(&caps[2]).ok_or_else(invalid)?;

        Ok((start, end))
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
