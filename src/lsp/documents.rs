use tower_lsp_server::ls_types::*;

use super::conversions::apply_content_change;
use super::{DocumentState, ShellcheckLsp};

/// Handle textDocument/didOpen notification
pub(crate) async fn did_open(lsp: &ShellcheckLsp, params: DidOpenTextDocumentParams) {
    let item = params.text_document;
    let uri = item.uri.to_string();
    let state = DocumentState {
        text: item.text,
        language_id: item.language_id,
        path: item.uri.to_file_path().map(|p| p.into_owned()),
    };
    let document = state.to_document(&uri);

    lsp.document_map().lock().await.insert(uri.clone(), state);
    log::debug!("Opened document: {}", uri);

    lsp.orchestrator().on_document_opened(&document).await;
}

/// Handle textDocument/didChange notification
pub(crate) async fn did_change(lsp: &ShellcheckLsp, params: DidChangeTextDocumentParams) {
    let uri = params.text_document.uri.to_string();

    let document = {
        let map = lsp.document_map();
        let mut documents = map.lock().await;
        let Some(state) = documents.get_mut(&uri) else {
            return;
        };
        for change in &params.content_changes {
            state.text = apply_content_change(&state.text, change);
        }
        state.to_document(&uri)
    };

    lsp.orchestrator().on_document_changed(&document).await;
}

/// Handle textDocument/didSave notification
pub(crate) async fn did_save(lsp: &ShellcheckLsp, params: DidSaveTextDocumentParams) {
    let uri = params.text_document.uri.to_string();

    let document = {
        let map = lsp.document_map();
        let mut documents = map.lock().await;
        let Some(state) = documents.get_mut(&uri) else {
            return;
        };
        if let Some(text) = params.text {
            state.text = text;
        }
        state.to_document(&uri)
    };

    lsp.orchestrator().on_document_saved(&document).await;
}

/// Handle textDocument/didClose notification
pub(crate) async fn did_close(lsp: &ShellcheckLsp, params: DidCloseTextDocumentParams) {
    let uri = params.text_document.uri.to_string();
    lsp.document_map().lock().await.remove(&uri);
    log::debug!("Closed document: {}", uri);

    lsp.orchestrator().on_document_closed(&uri).await;
}
