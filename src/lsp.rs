use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_lsp_server::{Client, LspService, Server};

use crate::host::Document;
use crate::linter::LintOrchestrator;

mod conversions;
mod documents;
mod host;
mod server;

mod handlers {
    pub(crate) mod code_actions;
}

pub use host::LspHost;

/// Command that lints a document immediately. Takes the document URI as its
/// only argument; without arguments every open document is linted.
pub const RUN_LINT_COMMAND: &str = "shellcheck.runLint";

/// Server-side copy of an open document.
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub text: String,
    pub language_id: String,
    pub path: Option<PathBuf>,
}

impl DocumentState {
    pub(crate) fn to_document(&self, uri: &str) -> Document {
        Document {
            uri: uri.to_string(),
            language_id: self.language_id.clone(),
            text: self.text.clone(),
            path: self.path.clone(),
        }
    }
}

// Use String keys since Uri doesn't implement Send
pub type DocumentMap = Arc<Mutex<HashMap<String, DocumentState>>>;

pub struct ShellcheckLsp {
    client: Client,
    orchestrator: Arc<LintOrchestrator<LspHost>>,
}

impl ShellcheckLsp {
    pub fn new(client: Client) -> Self {
        let host = LspHost::new(client.clone());
        Self {
            client,
            orchestrator: LintOrchestrator::new(host),
        }
    }

    pub fn orchestrator(&self) -> &Arc<LintOrchestrator<LspHost>> {
        &self.orchestrator
    }

    /// Open documents, exposed for tests.
    pub fn document_map(&self) -> DocumentMap {
        Arc::clone(self.orchestrator.host().documents())
    }
}

pub async fn run() -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(ShellcheckLsp::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
