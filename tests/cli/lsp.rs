//! `lsp` subcommand tests over real stdio.
//!
//! A reader thread decodes framed messages from the server's stdout so a
//! silent server fails the test instead of hanging it.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

const TIMEOUT: Duration = Duration::from_secs(10);

struct StdioServer {
    child: Child,
    stdin: Option<ChildStdin>,
    messages: Receiver<Value>,
}

impl StdioServer {
    fn start() -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_shellcheck-lsp"))
            .arg("lsp")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to start shellcheck-lsp");

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().expect("stdout is piped");
        let (tx, messages) = mpsc::channel();
        thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            while let Some(message) = read_message(&mut reader) {
                if tx.send(message).is_err() {
                    break;
                }
            }
        });

        Self {
            child,
            stdin,
            messages,
        }
    }

    fn send_raw(&mut self, body: &str) {
        let stdin = self.stdin.as_mut().expect("stdin still open");
        write!(stdin, "Content-Length: {}\r\n\r\n{}", body.len(), body).unwrap();
        stdin.flush().unwrap();
    }

    fn send(&mut self, message: Value) {
        self.send_raw(&message.to_string());
    }

    /// Wait for the response to request `id`, skipping notifications.
    fn response(&self, id: i64) -> Value {
        loop {
            let message = self
                .messages
                .recv_timeout(TIMEOUT)
                .unwrap_or_else(|_| panic!("no response to request {id}"));
            if message.get("id") == Some(&json!(id)) {
                return message;
            }
        }
    }

    fn initialize(&mut self) -> Value {
        self.send(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "capabilities": {},
                "processId": null,
                "rootUri": null,
                "workspaceFolders": null
            }
        }));
        self.response(1)
    }

    fn shutdown(mut self) {
        self.send(json!({"jsonrpc": "2.0", "id": 99, "method": "shutdown"}));
        let response = self.response(99);
        assert_eq!(response["result"], Value::Null);
        assert!(response.get("error").is_none());

        self.send(json!({"jsonrpc": "2.0", "method": "exit"}));
        drop(self.stdin.take());
        self.child.wait().unwrap();
    }
}

impl Drop for StdioServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn read_message(reader: &mut impl BufRead) -> Option<Value> {
    let mut length = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            return None;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Content-Length:") {
            length = value.trim().parse().ok();
        }
    }

    let mut body = vec![0; length?];
    reader.read_exact(&mut body).ok()?;
    serde_json::from_slice(&body).ok()
}

#[test]
fn test_lsp_advertises_capabilities() {
    let mut server = StdioServer::start();
    let response = server.initialize();

    let result = &response["result"];
    assert_eq!(result["serverInfo"]["name"], "shellcheck-lsp");
    assert_eq!(
        result["capabilities"]["executeCommandProvider"]["commands"],
        json!(["shellcheck.runLint"])
    );
    assert_eq!(result["capabilities"]["codeActionProvider"], json!(true));

    server.shutdown();
}

#[test]
fn test_lsp_recovers_from_invalid_json() {
    let mut server = StdioServer::start();
    server.send_raw("{invalid}");

    let response = server.initialize();
    assert_eq!(
        response["result"]["capabilities"]["executeCommandProvider"]["commands"],
        json!(["shellcheck.runLint"])
    );

    server.shutdown();
}

#[test]
fn test_lsp_rejects_unknown_command() {
    let mut server = StdioServer::start();
    server.initialize();
    server.send(json!({"jsonrpc": "2.0", "method": "initialized", "params": {}}));

    server.send(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "workspace/executeCommand",
        "params": {"command": "shellcheck.formatEverything", "arguments": []}
    }));
    let response = server.response(2);
    assert_eq!(response["error"]["code"], json!(-32601));

    server.shutdown();
}
