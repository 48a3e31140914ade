//! Tests for diagnostic workflows (linting, commands and code actions).

use super::helpers::*;
use serde_json::json;
use tempfile::TempDir;
use tower_lsp_server::ls_types::*;

use shellcheck_lsp::lsp::RUN_LINT_COMMAND;

const UNUSED_FOO: &str = r#"{"comments":[{"file":"-","line":2,"endLine":2,"column":9,"endColumn":12,"level":"warning","code":2034,"message":"foo appears unused. Verify use (or export if used externally)."}]}"#;

const SCRIPT: &str = "#!/bin/sh\n\tfoo=1\n";

#[tokio::test]
async fn test_capabilities() {
    let workspace = TempDir::new().unwrap();
    let server = TestLspServer::new();

    let result = server.initialize(workspace.path(), None).await;
    let capabilities = result.capabilities;

    assert_eq!(
        capabilities.execute_command_provider.unwrap().commands,
        vec![RUN_LINT_COMMAND.to_string()]
    );
    assert!(capabilities.code_action_provider.is_some());
    match capabilities.text_document_sync {
        Some(TextDocumentSyncCapability::Options(options)) => {
            assert_eq!(options.change, Some(TextDocumentSyncKind::INCREMENTAL));
            assert!(options.save.is_some());
        }
        other => panic!("unexpected sync capability: {other:?}"),
    }
    assert_eq!(result.server_info.unwrap().name, "shellcheck-lsp");
}

#[cfg(unix)]
#[tokio::test]
async fn test_diagnostics_are_tab_corrected() {
    let workspace = TempDir::new().unwrap();
    let shellcheck = fake_shellcheck(workspace.path(), UNUSED_FOO);
    let server = TestLspServer::new();
    server
        .initialize(
            workspace.path(),
            Some(json!({ "executablePath": shellcheck.display().to_string() })),
        )
        .await;

    let uri = file_uri(&workspace.path().join("a.sh"));
    server.open_document(&uri, SCRIPT, "shellscript").await;

    let diagnostics = server.wait_for_diagnostics(&uri, |d| !d.is_empty()).await;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, "SC2034");
    // ShellCheck counts the leading tab as eight columns
    assert_eq!(diagnostics[0].range.start.line, 1);
    assert_eq!(diagnostics[0].range.start.character, 1);
    assert_eq!(diagnostics[0].range.end.character, 4);
}

#[cfg(unix)]
#[tokio::test]
async fn test_disable_code_action() {
    let workspace = TempDir::new().unwrap();
    let shellcheck = fake_shellcheck(workspace.path(), UNUSED_FOO);
    let server = TestLspServer::new();
    server
        .initialize(
            workspace.path(),
            Some(json!({ "executablePath": shellcheck.display().to_string() })),
        )
        .await;

    let uri = file_uri(&workspace.path().join("a.sh"));
    server.open_document(&uri, SCRIPT, "shellscript").await;
    server.wait_for_diagnostics(&uri, |d| !d.is_empty()).await;

    let actions = server.get_code_actions(&uri, 1, 1).await.unwrap();
    assert_eq!(actions.len(), 1);
    let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
        panic!("expected a code action");
    };
    assert_eq!(action.title, "Disable SC2034 for this line");

    let changes = action.edit.as_ref().unwrap().changes.as_ref().unwrap();
    let edits = changes.values().next().unwrap();
    assert_eq!(edits[0].new_text, "\t# shellcheck disable=SC2034\n");

    // Nothing to offer outside the flagged line
    let elsewhere = server.get_code_actions(&uri, 0, 0).await.unwrap();
    assert!(elsewhere.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_lint_command_in_manual_mode() {
    let workspace = TempDir::new().unwrap();
    let shellcheck = fake_shellcheck(workspace.path(), UNUSED_FOO);
    let server = TestLspServer::new();
    server
        .initialize(
            workspace.path(),
            Some(json!({
                "executablePath": shellcheck.display().to_string(),
                "run": "manual",
            })),
        )
        .await;

    let uri = file_uri(&workspace.path().join("a.sh"));
    server.open_document(&uri, SCRIPT, "shellscript").await;
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    assert!(server.diagnostics(&uri).await.is_empty());

    server
        .execute_command(RUN_LINT_COMMAND, vec![json!(uri)])
        .await
        .unwrap();
    server.wait_for_diagnostics(&uri, |d| d.len() == 1).await;

    assert!(server.execute_command("shellcheck.unknown", vec![]).await.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_disabling_through_configuration_clears() {
    let workspace = TempDir::new().unwrap();
    let shellcheck = fake_shellcheck(workspace.path(), UNUSED_FOO);
    let executable = shellcheck.display().to_string();
    let server = TestLspServer::new();
    server
        .initialize(workspace.path(), Some(json!({ "executablePath": executable })))
        .await;

    let uri = file_uri(&workspace.path().join("a.sh"));
    server.open_document(&uri, SCRIPT, "shellscript").await;
    server.wait_for_diagnostics(&uri, |d| !d.is_empty()).await;

    server
        .change_configuration(json!({
            "shellcheck": { "enable": false, "executablePath": executable }
        }))
        .await;
    assert!(server.diagnostics(&uri).await.is_empty());

    server
        .change_configuration(json!({ "enable": true, "executablePath": executable }))
        .await;
    server.wait_for_diagnostics(&uri, |d| !d.is_empty()).await;
}

#[cfg(unix)]
#[tokio::test]
async fn test_ignored_files_get_no_diagnostics() {
    let workspace = TempDir::new().unwrap();
    let shellcheck = fake_shellcheck(workspace.path(), UNUSED_FOO);
    let server = TestLspServer::new();
    server
        .initialize(
            workspace.path(),
            Some(json!({
                "executablePath": shellcheck.display().to_string(),
                "ignorePatterns": { "vendor/**": true },
            })),
        )
        .await;

    let vendored = file_uri(&workspace.path().join("vendor/lib.sh"));
    let own = file_uri(&workspace.path().join("a.sh"));
    server.open_document(&vendored, SCRIPT, "shellscript").await;
    server.open_document(&own, SCRIPT, "shellscript").await;

    server.wait_for_diagnostics(&own, |d| !d.is_empty()).await;
    assert!(server.diagnostics(&vendored).await.is_empty());
}
