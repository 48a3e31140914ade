//! The editor as seen by the lint engine.
//!
//! The orchestrator never talks to an editor directly. Everything it needs
//! (open documents, configuration, publishing diagnostics, notifications) goes
//! through [`Host`], so the engine can be driven by the language server or by
//! an in-memory host in tests.

use std::future::Future;
use std::path::PathBuf;

use crate::config::Settings;
use crate::linter::Diagnostic;
use crate::linter::invocation::dialect_for;

/// Language id editors use for shell scripts.
pub const SHELL_LANGUAGE_ID: &str = "shellscript";

/// Snapshot of an open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub uri: String,
    pub language_id: String,
    pub text: String,
    /// Location on disk, absent for untitled or virtual documents
    pub path: Option<PathBuf>,
}

impl Document {
    pub fn new(
        uri: impl Into<String>,
        language_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            language_id: language_id.into(),
            text: text.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// URI scheme, e.g. `file`, `untitled` or `git`.
    pub fn scheme(&self) -> &str {
        self.uri.split_once(':').map_or("", |(scheme, _)| scheme)
    }

    pub fn file_name(&self) -> Option<&str> {
        match &self.path {
            Some(path) => path.file_name().and_then(|name| name.to_str()),
            None => self.uri.rsplit('/').next().filter(|name| !name.is_empty()),
        }
    }

    pub fn dialect(&self) -> Option<&'static str> {
        self.file_name().and_then(dialect_for)
    }

    pub fn is_shell_script(&self) -> bool {
        self.language_id == SHELL_LANGUAGE_ID
    }
}

/// Capabilities the editor provides to the lint engine.
pub trait Host: Send + Sync + 'static {
    /// Current configuration snapshot.
    fn settings(&self) -> impl Future<Output = Settings> + Send;

    fn workspace_root(&self) -> impl Future<Output = Option<PathBuf>> + Send;

    fn open_documents(&self) -> impl Future<Output = Vec<Document>> + Send;

    /// Latest contents of an open document, `None` once it is closed.
    fn document(&self, uri: &str) -> impl Future<Output = Option<Document>> + Send;

    /// Replace everything shown for `uri` with `diagnostics`. Their ranges
    /// refer to `text`, the contents that were linted, which may already be
    /// behind the editor's buffer.
    fn publish_diagnostics(
        &self,
        uri: &str,
        diagnostics: &[Diagnostic],
        text: &str,
    ) -> impl Future<Output = ()> + Send;

    fn show_error(&self, message: &str) -> impl Future<Output = ()> + Send;

    /// Non-blocking suggestion. Resolves to the chosen action, if any.
    fn show_suggestion(
        &self,
        message: &str,
        actions: &[&str],
    ) -> impl Future<Output = Option<String>> + Send;

    fn open_external(&self, url: &str) -> impl Future<Output = ()> + Send;

    /// Remember that the version advisory should not be shown again.
    fn disable_version_check(&self) -> impl Future<Output = ()> + Send;
}
