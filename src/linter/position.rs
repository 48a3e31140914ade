//! Tab-aware column correction.
//!
//! ShellCheck reports columns as display columns where a tab always counts as
//! eight. Editors address characters, so every tab before the reported column
//! is worth seven columns too many.

use super::diagnostics::{Position, Range};

const TAB_WIDTH: u32 = 8;

/// Convert a zero-based display column on `line_text` to a character offset.
///
/// Columns past the end of the line are carried over one-to-one, so a
/// zero-width marker after the last character stays where ShellCheck put it.
pub fn correct_character(line_text: &str, reported: u32) -> u32 {
    let mut display = 0u32;
    let mut offset = 0u32;

    for ch in line_text.chars() {
        if display >= reported {
            return offset;
        }
        display += if ch == '\t' { TAB_WIDTH } else { 1 };
        offset += 1;
    }

    offset + reported.saturating_sub(display)
}

/// Text of the zero-based `line`, without its line terminator.
pub fn line_text(text: &str, line: u32) -> &str {
    text.lines().nth(line as usize).unwrap_or("")
}

pub fn correct_position(text: &str, position: Position) -> Position {
    Position {
        line: position.line,
        character: correct_character(line_text(text, position.line), position.character),
    }
}

/// Correct both ends of a range. A collapsed range is corrected once so the
/// two ends cannot drift apart.
pub fn correct_range(text: &str, range: Range) -> Range {
    let start = correct_position(text, range.start);
    if range.start == range.end {
        return Range::new(start, start);
    }
    Range::new(start, correct_position(text, range.end))
}
