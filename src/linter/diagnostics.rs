use std::fmt;

/// Label attached to every diagnostic this crate produces.
pub const SOURCE: &str = "shellcheck";

/// ShellCheck's "variable appears unused" rule.
pub const UNUSED_VARIABLE_CODE: u32 = 2034;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Map a ShellCheck `level` string. Unrecognized levels become warnings.
    pub fn from_level(level: &str) -> Self {
        match level {
            "error" => Severity::Error,
            "style" | "info" => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
            Severity::Info => f.write_str("info"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticTag {
    /// Code that can be removed, rendered faded by most editors
    Unnecessary,
}

/// Zero-based line and character position. `character` counts Unicode
/// scalar values, not bytes or UTF-16 units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Half-open range: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub message: String,
    /// Stable rule identifier, always `SC<digits>`
    pub code: String,
    pub tags: Vec<DiagnosticTag>,
    pub source: &'static str,
}

impl Diagnostic {
    pub fn new(
        range: Range,
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            range,
            severity,
            message: message.into(),
            code: code.into(),
            tags: Vec::new(),
            source: SOURCE,
        }
    }

    pub fn with_tag(mut self, tag: DiagnosticTag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Numeric rule code, e.g. `2034` for `SC2034`.
    pub fn rule_number(&self) -> Option<u32> {
        self.code.strip_prefix("SC")?.parse().ok()
    }
}

/// Format a numeric ShellCheck rule as its stable string code.
pub fn rule_code(code: u32) -> String {
    format!("SC{code}")
}
