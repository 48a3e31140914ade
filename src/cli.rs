use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shellcheck-lsp")]
#[command(author, version)]
#[command(about = "A language server that runs ShellCheck on shell scripts")]
#[command(
    long_about = "shellcheck-lsp runs the ShellCheck static analyzer on shell scripts and \
    reports its findings as editor diagnostics. It throttles runs while you type, skips files \
    matched by ignore patterns, and corrects ShellCheck's tab-expanded columns."
)]
#[command(after_help = "\
EXAMPLES:

    # Start the language server (usually launched by your editor)
    shellcheck-lsp lsp

    # Lint scripts from the command line
    shellcheck-lsp check deploy.sh lib/*.bash

    # Use a specific ShellCheck binary
    shellcheck-lsp check --executable /opt/shellcheck/bin/shellcheck run.sh

CONFIGURATION:

shellcheck-lsp looks for configuration files in this order:
  1. Explicit --config path
  2. shellcheck-lsp.toml or .shellcheck-lsp.toml in current/parent directories
  3. ~/.config/shellcheck-lsp/config.toml (XDG)
  4. Built-in defaults

Editors may also send the same settings as JSON (camelCase keys) through
initializationOptions and workspace/didChangeConfiguration.

Example .shellcheck-lsp.toml:

    run = \"onSave\"
    exclude = [\"SC1090\", \"SC1091\"]
    customArgs = [\"-x\"]

    [ignorePatterns]
    \"**/*.zsh\" = true
    \"vendor/**\" = { caseSensitive = false }

For more information, visit: https://www.shellcheck.net")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, global = true)]
    #[arg(help = "Path to configuration file")]
    #[arg(
        long_help = "Path to a custom configuration file. If not specified, shellcheck-lsp will \
        search for .shellcheck-lsp.toml or shellcheck-lsp.toml in the current directory and its \
        parents, then fall back to ~/.config/shellcheck-lsp/config.toml."
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint shell scripts with ShellCheck
    #[command(
        long_about = "Run ShellCheck on each file and print its findings with corrected \
        positions. Files matched by the configured ignore patterns are skipped. Exits with \
        code 1 when any issue is found and code 2 when ShellCheck could not be run."
    )]
    Check {
        /// Files to lint
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// ShellCheck executable, overriding `executablePath`
        #[arg(long, env = "SHELLCHECK_PATH")]
        executable: Option<String>,
    },
    /// Start the Language Server Protocol server
    #[cfg(feature = "lsp")]
    #[command(
        long_about = "Start the shellcheck-lsp Language Server Protocol (LSP) server for \
        editor integration. Diagnostics are published as you open, edit, and save shell \
        scripts."
    )]
    #[command(after_help = "\
The LSP server communicates via stdin/stdout and is typically launched automatically by your \
editor's LSP client. You generally don't need to run this command manually.")]
    Lsp,
}
