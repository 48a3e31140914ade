use std::collections::HashMap;
use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::ls_types::*;

use crate::linter;
use crate::linter::position::line_text;
use crate::lsp::ShellcheckLsp;
use crate::lsp::conversions::convert_diagnostic;

/// Comment line that silences `code` for the line below it, indented like
/// that line.
fn disable_comment(line: &str, code: &str) -> String {
    let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
    format!("{}# shellcheck disable={}\n", &line[..indent_len], code)
}

fn disable_action(uri: &Uri, text: &str, diag: &linter::Diagnostic) -> CodeAction {
    let line = diag.range.start.line;
    let insert_at = Position { line, character: 0 };
    let edit = TextEdit {
        range: Range {
            start: insert_at,
            end: insert_at,
        },
        new_text: disable_comment(line_text(text, line), &diag.code),
    };

    let mut changes = HashMap::new();
    changes.insert(uri.clone(), vec![edit]);

    CodeAction {
        title: format!("Disable {} for this line", diag.code),
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: Some(vec![convert_diagnostic(diag, text)]),
        edit: Some(WorkspaceEdit {
            changes: Some(changes),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Handle textDocument/codeAction request
pub(crate) async fn code_action(
    lsp: &ShellcheckLsp,
    params: CodeActionParams,
) -> Result<Option<CodeActionResponse>> {
    let uri = params.text_document.uri;
    let uri_string = uri.to_string();

    let text = {
        let map = lsp.document_map();
        let documents = map.lock().await;
        match documents.get(&uri_string) {
            Some(state) => state.text.clone(),
            None => return Ok(None),
        }
    };

    let first = params.range.start.line;
    let last = params.range.end.line;
    let diagnostics = lsp.orchestrator().diagnostics(&uri_string).await;

    let mut seen = Vec::new();
    let mut actions = Vec::new();
    for diag in &diagnostics {
        let line = diag.range.start.line;
        if line < first || line > last || seen.contains(&(line, &diag.code)) {
            continue;
        }
        seen.push((line, &diag.code));
        actions.push(CodeActionOrCommand::CodeAction(disable_action(
            &uri, &text, diag,
        )));
    }

    Ok(Some(actions))
}
