use std::path::PathBuf;
use tower_lsp_server::LanguageServer;
use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::ls_types::*;

use super::{RUN_LINT_COMMAND, ShellcheckLsp, documents, handlers};
use crate::config::Settings;
use crate::host::Host;

fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    // Try workspace_folders first, fall back to deprecated root_uri
    if let Some(folders) = &params.workspace_folders
        && let Some(folder) = folders.first()
        && let Some(path) = folder.uri.to_file_path()
    {
        return Some(path.into_owned());
    }

    #[allow(deprecated)]
    let root_uri = params.root_uri.as_ref();
    root_uri
        .and_then(|uri| uri.to_file_path())
        .map(|path| path.into_owned())
}

impl ShellcheckLsp {
    /// Settings pushed by the client, or the configuration file when the
    /// client sends none.
    async fn resolve_settings(&self, value: Option<serde_json::Value>) -> Settings {
        let host = self.orchestrator.host();
        match value {
            Some(value) if !value.is_null() => match Settings::from_json(value) {
                Ok(settings) => settings,
                Err(e) => {
                    self.client
                        .log_message(
                            MessageType::WARNING,
                            format!("Ignoring invalid settings: {}", e),
                        )
                        .await;
                    host.settings().await
                }
            },
            _ => host.load_file_settings().await,
        }
    }
}

impl LanguageServer for ShellcheckLsp {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let host = self.orchestrator.host();
        host.set_workspace_root(workspace_root(&params)).await;

        let settings = self.resolve_settings(params.initialization_options).await;
        host.set_settings(settings).await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                        ..Default::default()
                    },
                )),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![RUN_LINT_COMMAND.to_string()],
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "shellcheck-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "shellcheck LSP server initialized")
            .await;
        self.orchestrator.initialize().await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        documents::did_open(self, params).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        documents::did_change(self, params).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        documents::did_save(self, params).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        documents::did_close(self, params).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let settings = self.resolve_settings(Some(params.settings)).await;
        self.orchestrator.host().set_settings(settings).await;
        self.orchestrator.on_configuration_changed().await;
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<LSPAny>> {
        if params.command != RUN_LINT_COMMAND {
            return Err(tower_lsp_server::jsonrpc::Error::method_not_found());
        }

        let uris: Vec<String> = match params.arguments.first().and_then(|arg| arg.as_str()) {
            Some(uri) => vec![uri.to_string()],
            None => self.document_map().lock().await.keys().cloned().collect(),
        };
        for uri in uris {
            self.orchestrator.lint_now(&uri).await;
        }

        Ok(None)
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        handlers::code_actions::code_action(self, params).await
    }
}
