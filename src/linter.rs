pub mod delayer;
pub mod diagnostics;
pub mod exclusion;
pub mod invocation;
pub mod mapper;
pub mod orchestrator;
pub mod position;
pub mod version;

pub use delayer::{DelayerState, ThrottledDelayer};
pub use diagnostics::{Diagnostic, DiagnosticTag, Position, Range, Severity};
pub use exclusion::FileMatcher;
pub use invocation::{Invocation, LinterError};
pub use orchestrator::{LintOrchestrator, Skip, Trigger};

use std::path::Path;

use crate::config::Settings;
use crate::host::Document;

/// Lint a single document once, without throttling. Used by the CLI.
pub async fn lint_document(
    settings: &Settings,
    document: &Document,
    workspace_root: Option<&Path>,
) -> Result<Vec<Diagnostic>, LinterError> {
    if settings.use_wsl && !invocation::wsl_available() {
        return Err(LinterError::WslUnavailable);
    }
    Invocation::for_document(settings, document, workspace_root)
        .run(&document.text)
        .await
}
