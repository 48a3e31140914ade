//! ShellCheck process invocation.
//!
//! Builds the command line for a document, pipes the document text through
//! stdin and collects stdout until the process closes it.

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::diagnostics::Diagnostic;
use super::mapper::map_output;
use crate::config::Settings;
use crate::host::Document;

/// Errors that can occur when invoking ShellCheck.
#[derive(Debug, thiserror::Error)]
pub enum LinterError {
    /// The executable could not be found
    #[error("executable not found: {0}")]
    ExecutableNotFound(String),
    /// WSL mode was requested on a system without it
    #[error("Windows Subsystem for Linux is not installed")]
    WslUnavailable,
    /// The process could not be started for another reason
    #[error("failed to spawn {command}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: io::Error,
    },
    /// Process failed without printing anything to parse
    #[error("{command} exited with code {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
    #[error("linter I/O error: {0}")]
    Io(#[from] io::Error),
    /// Stdout was not the JSON ShellCheck is supposed to print
    #[error("failed to parse shellcheck output: {0}")]
    MalformedOutput(#[source] serde_json::Error),
}

impl LinterError {
    /// Errors the user fixes by installing or configuring the tool.
    pub fn is_missing_tool(&self) -> bool {
        matches!(
            self,
            LinterError::ExecutableNotFound(_) | LinterError::WslUnavailable
        )
    }
}

/// Whether the Windows Subsystem for Linux can be used to run ShellCheck.
pub fn wsl_available() -> bool {
    cfg!(windows) && which::which("wsl").is_ok()
}

/// Shell dialect implied by a file name, passed to ShellCheck's `-s`.
pub fn dialect_for(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    match extension {
        "bash" => Some("bash"),
        "ksh" => Some("ksh"),
        "dash" => Some("dash"),
        _ => None,
    }
}

/// Arguments for a lint run: `-f json [-e codes] [-s dialect] [custom...] -`.
pub fn lint_args(settings: &Settings, dialect: Option<&str>) -> Vec<String> {
    let mut args = vec!["-f".to_string(), "json".to_string()];

    let excluded = settings.excluded_codes();
    if !excluded.is_empty() {
        args.push("-e".to_string());
        args.push(excluded.join(","));
    }

    if let Some(dialect) = dialect {
        args.push("-s".to_string());
        args.push(dialect.to_string());
    }

    args.extend(settings.custom_args.iter().cloned());

    // Read the script from stdin
    args.push("-".to_string());
    args
}

fn working_directory(
    settings: &Settings,
    document: &Document,
    workspace_root: Option<&Path>,
) -> Option<PathBuf> {
    if settings.use_workspace_root_as_cwd {
        return workspace_root.map(Path::to_path_buf);
    }

    match document.path.as_deref().and_then(Path::parent) {
        Some(dir) => Some(dir.to_path_buf()),
        // Untitled documents have no directory of their own
        None => workspace_root.map(Path::to_path_buf),
    }
}

/// A fully resolved ShellCheck command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Convert CRLF to LF before writing stdin (WSL mode)
    pub normalize_line_endings: bool,
}

impl Invocation {
    fn new(settings: &Settings, workspace_root: Option<&Path>, args: Vec<String>) -> Self {
        let executable = settings.executable(workspace_root);

        if settings.use_wsl {
            let mut wsl_args = Vec::with_capacity(args.len() + 1);
            wsl_args.push(executable);
            wsl_args.extend(args);
            Self {
                program: "wsl".to_string(),
                args: wsl_args,
                cwd: None,
                normalize_line_endings: true,
            }
        } else {
            Self {
                program: executable,
                args,
                cwd: None,
                normalize_line_endings: false,
            }
        }
    }

    /// Command that lints `document` read from stdin.
    pub fn for_document(
        settings: &Settings,
        document: &Document,
        workspace_root: Option<&Path>,
    ) -> Self {
        let args = lint_args(settings, document.dialect());
        let mut invocation = Self::new(settings, workspace_root, args);
        invocation.cwd = working_directory(settings, document, workspace_root);
        invocation
    }

    /// Command that prints ShellCheck's version banner.
    pub fn version_query(settings: &Settings, workspace_root: Option<&Path>) -> Self {
        Self::new(settings, workspace_root, vec!["-V".to_string()])
    }

    /// The command line as a single string, for logs and messages.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Spawn the process, feed it `input` and collect stdout.
    ///
    /// Stdin is closed as soon as the input is written, and the child is
    /// killed if the returned future is dropped before it exits.
    pub async fn output(&self, input: &str) -> Result<String, LinterError> {
        log::debug!("Invoking: {}", self.command_line());

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // A missing directory would surface as NotFound and be mistaken for a
        // missing executable
        if let Some(cwd) = self.cwd.as_deref().filter(|dir| dir.is_dir()) {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LinterError::ExecutableNotFound(self.program.clone()),
            _ => LinterError::SpawnFailed {
                command: self.program.clone(),
                source: e,
            },
        })?;

        let input: Cow<'_, str> = if self.normalize_line_endings {
            Cow::Owned(input.replace("\r\n", "\n"))
        } else {
            Cow::Borrowed(input)
        };

        let stdin = child.stdin.take();
        let write = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(input.as_bytes()).await {
                // The tool may exit before consuming everything, e.g. on bad arguments
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                result => result,
            }
            // stdin dropped here, signalling EOF
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;
        written?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !stderr.trim().is_empty() {
            log::warn!("{} wrote to stderr: {}", self.program, stderr.trim());
        }

        // ShellCheck exits 1 whenever it reports something, so only an empty
        // stdout marks a real failure
        if !output.status.success() && stdout.trim().is_empty() {
            return Err(LinterError::NonZeroExit {
                command: self.command_line(),
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(stdout)
    }

    /// Lint `text` and map the findings onto it.
    pub async fn run(&self, text: &str) -> Result<Vec<Diagnostic>, LinterError> {
        let stdout = self.output(text).await?;
        let diagnostics = map_output(&stdout, text)?;
        log::debug!(
            "{} reported {} finding(s)",
            self.program,
            diagnostics.len()
        );
        Ok(diagnostics)
    }
}
