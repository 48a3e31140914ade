pub mod config;
pub mod host;
pub mod linter;

#[cfg(feature = "lsp")]
pub mod lsp;

pub use config::Settings;
pub use host::{Document, Host};
pub use linter::{Diagnostic, LintOrchestrator, lint_document};
