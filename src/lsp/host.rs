use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_lsp_server::Client;
use tower_lsp_server::ls_types::{MessageActionItem, MessageType, ShowDocumentParams, Uri};

use super::DocumentMap;
use super::conversions::convert_diagnostic;
use crate::config::{self, PersistedState, Settings};
use crate::host::{Document, Host};
use crate::linter;

/// [`Host`] backed by a language server client.
#[derive(Clone)]
pub struct LspHost {
    client: Client,
    documents: DocumentMap,
    workspace_root: Arc<Mutex<Option<PathBuf>>>,
    settings: Arc<Mutex<Settings>>,
    state_path: Option<PathBuf>,
}

impl LspHost {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(Mutex::new(HashMap::new())),
            workspace_root: Arc::new(Mutex::new(None)),
            settings: Arc::new(Mutex::new(Settings::default())),
            state_path: config::state_path(),
        }
    }

    pub fn documents(&self) -> &DocumentMap {
        &self.documents
    }

    pub(crate) async fn set_workspace_root(&self, root: Option<PathBuf>) {
        *self.workspace_root.lock().await = root;
    }

    pub(crate) async fn set_settings(&self, settings: Settings) {
        *self.settings.lock().await = settings;
    }

    /// Settings from the configuration file found from the workspace root.
    pub(crate) async fn load_file_settings(&self) -> Settings {
        let Some(root) = self.workspace_root.lock().await.clone() else {
            return Settings::default();
        };

        match config::load(None, &root) {
            Ok((settings, path)) => {
                if let Some(p) = path {
                    self.client
                        .log_message(
                            MessageType::INFO,
                            format!("Loaded config from {}", p.display()),
                        )
                        .await;
                }
                settings
            }
            Err(e) => {
                self.client
                    .log_message(
                        MessageType::WARNING,
                        format!("Failed to load config: {}", e),
                    )
                    .await;
                Settings::default()
            }
        }
    }
}

fn parse_uri(uri: &str) -> Option<Uri> {
    match uri.parse() {
        Ok(uri) => Some(uri),
        Err(_) => {
            log::warn!("Invalid URI: {}", uri);
            None
        }
    }
}

impl Host for LspHost {
    async fn settings(&self) -> Settings {
        let mut settings = self.settings.lock().await.clone();
        if let Some(path) = &self.state_path
            && config::load_state(path).disable_version_check
        {
            settings.disable_version_check = true;
        }
        settings
    }

    async fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace_root.lock().await.clone()
    }

    async fn open_documents(&self) -> Vec<Document> {
        let documents = self.documents.lock().await;
        documents
            .iter()
            .map(|(uri, state)| state.to_document(uri))
            .collect()
    }

    async fn document(&self, uri: &str) -> Option<Document> {
        let documents = self.documents.lock().await;
        documents.get(uri).map(|state| state.to_document(uri))
    }

    async fn publish_diagnostics(
        &self,
        uri: &str,
        diagnostics: &[linter::Diagnostic],
        text: &str,
    ) {
        let Some(parsed) = parse_uri(uri) else {
            return;
        };

        let lsp_diagnostics = diagnostics
            .iter()
            .map(|d| convert_diagnostic(d, text))
            .collect();
        self.client
            .publish_diagnostics(parsed, lsp_diagnostics, None)
            .await;
    }

    async fn show_error(&self, message: &str) {
        self.client.show_message(MessageType::ERROR, message).await;
    }

    async fn show_suggestion(&self, message: &str, actions: &[&str]) -> Option<String> {
        let items = actions
            .iter()
            .map(|title| MessageActionItem {
                title: title.to_string(),
                properties: HashMap::new(),
            })
            .collect();

        match self
            .client
            .show_message_request(MessageType::INFO, message, Some(items))
            .await
        {
            Ok(choice) => choice.map(|item| item.title),
            Err(e) => {
                log::debug!("Message request failed: {}", e);
                None
            }
        }
    }

    async fn open_external(&self, url: &str) {
        let Some(uri) = parse_uri(url) else {
            return;
        };

        let params = ShowDocumentParams {
            uri,
            external: Some(true),
            take_focus: Some(true),
            selection: None,
        };
        if let Err(e) = self.client.show_document(params).await {
            log::debug!("Could not open {}: {}", url, e);
        }
    }

    async fn disable_version_check(&self) {
        self.settings.lock().await.disable_version_check = true;

        let Some(path) = &self.state_path else {
            return;
        };
        let state = PersistedState {
            disable_version_check: true,
        };
        if let Err(e) = config::save_state(path, &state) {
            log::warn!("Failed to save state to {}: {}", path.display(), e);
        }
    }
}
