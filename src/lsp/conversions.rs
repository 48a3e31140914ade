use tower_lsp_server::ls_types::*;

use crate::linter;
use crate::linter::diagnostics::{DiagnosticTag as LintTag, Severity as LintSeverity};
use crate::linter::position::line_text;

/// Rule documentation, one page per code.
const WIKI_URL: &str = "https://www.shellcheck.net/wiki/";

/// LSP UTF-16 position to byte offset. Line breaks may be `\n` or `\r\n`.
pub(crate) fn position_to_offset(text: &str, position: Position) -> Option<usize> {
    let mut offset = 0;

    for (current_line, raw_line) in text.split_inclusive('\n').enumerate() {
        if current_line as u32 == position.line {
            let line = raw_line.trim_end_matches(['\n', '\r']);
            let mut utf16_offset = 0;
            for (byte_idx, ch) in line.char_indices() {
                if utf16_offset >= position.character as usize {
                    return Some(offset + byte_idx);
                }
                utf16_offset += ch.len_utf16();
            }
            return Some(offset + line.len());
        }
        offset += raw_line.len();
    }

    // Only the empty line after a trailing newline (or an empty text) remains
    let line_count = text.split_inclusive('\n').count();
    let at_end = text.is_empty() || text.ends_with('\n');
    (at_end && position.line as usize == line_count).then_some(offset)
}

/// Character column to UTF-16 column on `line`. Columns past the end of the
/// line keep their excess.
pub(crate) fn char_to_utf16(line: &str, character: u32) -> u32 {
    let mut chars = 0;
    let mut utf16 = 0;
    for ch in line.chars() {
        if chars == character {
            return utf16;
        }
        chars += 1;
        utf16 += ch.len_utf16() as u32;
    }
    utf16 + character.saturating_sub(chars)
}

fn convert_position(text: &str, position: linter::Position) -> Position {
    Position {
        line: position.line,
        character: char_to_utf16(line_text(text, position.line), position.character),
    }
}

fn wiki_link(code: &str) -> Option<CodeDescription> {
    let href = format!("{WIKI_URL}{code}").parse().ok()?;
    Some(CodeDescription { href })
}

/// Lint diagnostic to LSP diagnostic, with columns in UTF-16 units of `text`.
pub(crate) fn convert_diagnostic(diag: &linter::Diagnostic, text: &str) -> Diagnostic {
    let severity = match diag.severity {
        LintSeverity::Error => DiagnosticSeverity::ERROR,
        LintSeverity::Warning => DiagnosticSeverity::WARNING,
        LintSeverity::Info => DiagnosticSeverity::INFORMATION,
    };

    let tags: Vec<DiagnosticTag> = diag
        .tags
        .iter()
        .map(|tag| match tag {
            LintTag::Unnecessary => DiagnosticTag::UNNECESSARY,
        })
        .collect();

    Diagnostic {
        range: Range {
            start: convert_position(text, diag.range.start),
            end: convert_position(text, diag.range.end),
        },
        severity: Some(severity),
        code: Some(NumberOrString::String(diag.code.clone())),
        code_description: diag.rule_number().and_then(|_| wiki_link(&diag.code)),
        source: Some(diag.source.to_string()),
        message: diag.message.clone(),
        tags: (!tags.is_empty()).then_some(tags),
        ..Default::default()
    }
}

/// Apply a single content change to text
pub(crate) fn apply_content_change(text: &str, change: &TextDocumentContentChangeEvent) -> String {
    match &change.range {
        Some(range) => {
            let start_offset = position_to_offset(text, range.start).unwrap_or(text.len());
            let end_offset = position_to_offset(text, range.end)
                .unwrap_or(text.len())
                .max(start_offset);

            let mut result =
                String::with_capacity(text.len() - (end_offset - start_offset) + change.text.len());
            result.push_str(&text[..start_offset]);
            result.push_str(&change.text);
            result.push_str(&text[end_offset..]);
            result
        }
        None => change.text.clone(),
    }
}
