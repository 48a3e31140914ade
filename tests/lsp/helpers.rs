//! Test helpers for LSP integration testing
//!
//! This module provides utilities to test LSP functionality in-memory
//! without spawning the binary or dealing with stdio protocol.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower_lsp_server::ls_types::*;
use tower_lsp_server::{LanguageServer, LspService};

use shellcheck_lsp::linter::Diagnostic as LintDiagnostic;
use shellcheck_lsp::lsp::ShellcheckLsp;

/// Test harness for LSP integration tests.
///
/// Wraps a `ShellcheckLsp` instance created via `LspService::new`.
pub struct TestLspServer {
    lsp: Arc<ShellcheckLsp>,
}

impl TestLspServer {
    /// Create a new test LSP server.
    ///
    /// This creates a real `ShellcheckLsp` instance with a real `Client`,
    /// using the same `LspService::new` pattern as production code.
    pub fn new() -> Self {
        let lsp_arc: Arc<std::sync::Mutex<Option<Arc<ShellcheckLsp>>>> =
            Arc::new(std::sync::Mutex::new(None));
        let lsp_arc_clone = Arc::clone(&lsp_arc);

        let (_service, _socket) = LspService::new(move |client| {
            let lsp = Arc::new(ShellcheckLsp::new(client));
            *lsp_arc_clone.lock().unwrap() = Some(Arc::clone(&lsp));
            LspWrapper { inner: lsp }
        });

        let lsp = lsp_arc
            .lock()
            .unwrap()
            .take()
            .expect("ShellcheckLsp should have been initialized");

        Self { lsp }
    }

    /// Run the initialize handshake with `root` as the only workspace folder.
    pub async fn initialize(
        &self,
        root: &Path,
        options: Option<serde_json::Value>,
    ) -> InitializeResult {
        let params = InitializeParams {
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: file_uri(root).parse().unwrap(),
                name: "workspace".to_string(),
            }]),
            initialization_options: options,
            ..Default::default()
        };

        let result = self.lsp.initialize(params).await.unwrap();
        self.lsp.initialized(InitializedParams {}).await;
        result
    }

    pub async fn open_document(&self, uri: &str, content: &str, language_id: &str) {
        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.parse().unwrap(),
                language_id: language_id.to_string(),
                version: 0,
                text: content.to_string(),
            },
        };

        self.lsp.did_open(params).await;
    }

    pub async fn close_document(&self, uri: &str) {
        let params = DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier {
                uri: uri.parse().unwrap(),
            },
        };

        self.lsp.did_close(params).await;
    }

    pub async fn edit_document(&self, uri: &str, changes: Vec<TextDocumentContentChangeEvent>) {
        let params = DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri.parse().unwrap(),
                version: 1,
            },
            content_changes: changes,
        };

        self.lsp.did_change(params).await;
    }

    pub async fn save_document(&self, uri: &str, text: Option<&str>) {
        let params = DidSaveTextDocumentParams {
            text_document: TextDocumentIdentifier {
                uri: uri.parse().unwrap(),
            },
            text: text.map(str::to_string),
        };

        self.lsp.did_save(params).await;
    }

    pub async fn change_configuration(&self, settings: serde_json::Value) {
        self.lsp
            .did_change_configuration(DidChangeConfigurationParams { settings })
            .await;
    }

    pub async fn execute_command(
        &self,
        command: &str,
        arguments: Vec<serde_json::Value>,
    ) -> tower_lsp_server::jsonrpc::Result<Option<LSPAny>> {
        let params = ExecuteCommandParams {
            command: command.to_string(),
            arguments,
            work_done_progress_params: WorkDoneProgressParams::default(),
        };

        self.lsp.execute_command(params).await
    }

    pub async fn get_code_actions(
        &self,
        uri: &str,
        start_line: u32,
        end_line: u32,
    ) -> Option<CodeActionResponse> {
        let params = CodeActionParams {
            text_document: TextDocumentIdentifier {
                uri: uri.parse().unwrap(),
            },
            range: Range {
                start: Position {
                    line: start_line,
                    character: 0,
                },
                end: Position {
                    line: end_line,
                    character: 0,
                },
            },
            context: CodeActionContext {
                diagnostics: vec![],
                only: None,
                trigger_kind: None,
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };

        self.lsp.code_action(params).await.unwrap()
    }

    /// Get the current content of a document from the server's state.
    pub async fn get_document_content(&self, uri: &str) -> Option<String> {
        let doc_map = self.lsp.document_map();
        let docs = doc_map.lock().await;
        docs.get(uri).map(|state| state.text.clone())
    }

    /// Diagnostics the server currently holds for `uri`.
    pub async fn diagnostics(&self, uri: &str) -> Vec<LintDiagnostic> {
        self.lsp.orchestrator().diagnostics(uri).await
    }

    /// Poll until diagnostics for `uri` satisfy `check`.
    pub async fn wait_for_diagnostics(
        &self,
        uri: &str,
        check: impl Fn(&[LintDiagnostic]) -> bool,
    ) -> Vec<LintDiagnostic> {
        for _ in 0..200 {
            let diagnostics = self.diagnostics(uri).await;
            if check(&diagnostics) {
                return diagnostics;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("timed out waiting for diagnostics on {uri}");
    }
}

/// Wrapper that delegates all LanguageServer methods to the inner Arc<ShellcheckLsp>.
///
/// This is needed because LspService requires ownership of the LanguageServer impl,
/// but we also need to retain a reference for testing.
struct LspWrapper {
    inner: Arc<ShellcheckLsp>,
}

impl LanguageServer for LspWrapper {
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> tower_lsp_server::jsonrpc::Result<InitializeResult> {
        self.inner.initialize(params).await
    }

    async fn initialized(&self, params: InitializedParams) {
        self.inner.initialized(params).await
    }

    async fn shutdown(&self) -> tower_lsp_server::jsonrpc::Result<()> {
        self.inner.shutdown().await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.inner.did_open(params).await
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.inner.did_change(params).await
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.inner.did_save(params).await
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.inner.did_close(params).await
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.inner.did_change_configuration(params).await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> tower_lsp_server::jsonrpc::Result<Option<LSPAny>> {
        self.inner.execute_command(params).await
    }

    async fn code_action(
        &self,
        params: CodeActionParams,
    ) -> tower_lsp_server::jsonrpc::Result<Option<CodeActionResponse>> {
        self.inner.code_action(params).await
    }
}

pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Write an executable stand-in for `shellcheck` into `dir` that prints
/// `output` for every script it is given.
#[cfg(unix)]
pub fn fake_shellcheck(dir: &Path, output: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(dir.join("output.json"), output).unwrap();
    let script = dir.join("shellcheck");
    let body = format!(
        "#!/bin/sh\nif [ \"$1\" = \"-V\" ]; then echo 'version: 0.9.0'; exit 0; fi\n\
         cat > /dev/null\ncat '{}'\n",
        dir.join("output.json").display()
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Helper to create a simple text change event (full document replacement).
pub fn full_document_change(text: &str) -> TextDocumentContentChangeEvent {
    TextDocumentContentChangeEvent {
        range: None,
        range_length: None,
        text: text.to_string(),
    }
}

/// Helper to create an incremental text change event.
pub fn incremental_change(
    start_line: u32,
    start_char: u32,
    end_line: u32,
    end_char: u32,
    text: &str,
) -> TextDocumentContentChangeEvent {
    TextDocumentContentChangeEvent {
        range: Some(Range {
            start: Position {
                line: start_line,
                character: start_char,
            },
            end: Position {
                line: end_line,
                character: end_char,
            },
        }),
        range_length: None,
        text: text.to_string(),
    }
}
