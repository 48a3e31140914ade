//! Translation of ShellCheck's JSON findings into diagnostics.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::diagnostics::{
    Diagnostic, DiagnosticTag, Position, Range, Severity, UNUSED_VARIABLE_CODE, rule_code,
};
use super::invocation::LinterError;
use super::position::correct_range;

/// One finding as emitted by `shellcheck -f json`.
///
/// Positions are 1-based. Every field is read leniently: a missing or oddly
/// typed field falls back to a default instead of failing the whole run, and
/// nonsensical positions clamp to the start of the document.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RawIssue {
    #[serde(deserialize_with = "lenient_string")]
    pub file: String,
    #[serde(deserialize_with = "lenient_int")]
    pub line: i64,
    #[serde(deserialize_with = "lenient_opt_int")]
    pub end_line: Option<i64>,
    #[serde(deserialize_with = "lenient_int")]
    pub column: i64,
    #[serde(deserialize_with = "lenient_opt_int")]
    pub end_column: Option<i64>,
    #[serde(deserialize_with = "lenient_string")]
    pub level: String,
    #[serde(deserialize_with = "lenient_code")]
    pub code: u32,
    #[serde(deserialize_with = "lenient_string")]
    pub message: String,
}

/// `-f json` prints a bare list, `-f json1` wraps it in `comments`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ShellcheckOutput {
    List(Vec<Value>),
    Wrapped { comments: Vec<Value> },
}

/// Integral view of a JSON number. Floats truncate and saturate, numeric
/// strings are accepted.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(integer(&Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(integer(&Value::deserialize(deserializer)?))
}

fn lenient_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let code = integer(&Value::deserialize(deserializer)?);
    Ok(code.and_then(|n| u32::try_from(n).ok()).unwrap_or_default())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn zero_based(value: i64) -> u32 {
    value.saturating_sub(1).clamp(0, i64::from(u32::MAX)) as u32
}

/// Parse ShellCheck's standard output. Empty output means no findings.
///
/// Only output that is not a list of findings is malformed. Entries that are
/// not objects are skipped.
pub fn parse_output(stdout: &str) -> Result<Vec<RawIssue>, LinterError> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries = match serde_json::from_str(stdout).map_err(LinterError::MalformedOutput)? {
        ShellcheckOutput::List(entries) => entries,
        ShellcheckOutput::Wrapped { comments } => comments,
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            if !entry.is_object() {
                log::debug!("Skipping unexpected shellcheck entry: {}", entry);
                return None;
            }
            RawIssue::deserialize(entry)
                .inspect_err(|e| log::debug!("Skipping unreadable shellcheck entry: {}", e))
                .ok()
        })
        .collect())
}

/// Convert one finding into a diagnostic positioned in `text`.
///
/// Findings without an end position collapse to a zero-width range at the
/// start.
pub fn to_diagnostic(issue: &RawIssue, text: &str) -> Diagnostic {
    let start = Position::new(zero_based(issue.line), zero_based(issue.column));
    let end = Position::new(
        issue.end_line.map_or(start.line, zero_based),
        issue.end_column.map_or(start.character, zero_based),
    );
    let range = correct_range(text, Range::new(start, end));

    let diagnostic = Diagnostic::new(
        range,
        Severity::from_level(&issue.level),
        rule_code(issue.code),
        issue.message.clone(),
    );

    if issue.code == UNUSED_VARIABLE_CODE {
        diagnostic.with_tag(DiagnosticTag::Unnecessary)
    } else {
        diagnostic
    }
}

/// Parse and convert a complete ShellCheck run.
pub fn map_output(stdout: &str, text: &str) -> Result<Vec<Diagnostic>, LinterError> {
    let issues = parse_output(stdout)?;
    Ok(issues.iter().map(|issue| to_diagnostic(issue, text)).collect())
}
