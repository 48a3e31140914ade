use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;

use shellcheck_lsp::config::{self, Settings};
use shellcheck_lsp::host::{Document, SHELL_LANGUAGE_ID};
use shellcheck_lsp::linter::{Diagnostic, FileMatcher, Severity};

mod cli;
use cli::{Cli, Commands};

fn start_dir_for(files: &[PathBuf]) -> io::Result<PathBuf> {
    match files.first().and_then(|p| p.parent()) {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => std::env::current_dir(),
    }
}

fn read_document(path: &Path) -> io::Result<Document> {
    let text = fs::read_to_string(path)?;
    let absolute = std::path::absolute(path)?;
    let uri = format!("file://{}", absolute.display());
    Ok(Document::new(uri, SHELL_LANGUAGE_ID, text).with_path(absolute))
}

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { files, executable } => {
            let start_dir = start_dir_for(&files)?;
            let (mut settings, cfg_path) = config::load(cli.config.as_deref(), &start_dir)?;

            if let Some(path) = &cfg_path {
                log::debug!("Using config from: {}", path.display());
            } else {
                log::debug!("Using default config");
            }
            if let Some(executable) = executable {
                settings.executable_path = executable;
            }

            let rt = tokio::runtime::Runtime::new()?;
            let code = rt.block_on(check(&settings, &files, &std::env::current_dir()?));
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        #[cfg(feature = "lsp")]
        Commands::Lsp => {
            // LSP needs tokio runtime
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async { shellcheck_lsp::lsp::run().await })?;
            Ok(())
        }
    }
}

/// Lint every file and return the process exit code.
async fn check(settings: &Settings, files: &[PathBuf], root: &Path) -> i32 {
    let matcher = FileMatcher::new(&settings.ignore_patterns);
    let mut issues = 0;

    for file in files {
        let document = match read_document(file) {
            Ok(document) => document,
            Err(e) => {
                eprintln!("Error: cannot read {}: {}", file.display(), e);
                return 2;
            }
        };

        if let Some(path) = &document.path
            && matcher.excludes(path, Some(root))
        {
            log::info!("Skipping ignored file: {}", file.display());
            continue;
        }

        match shellcheck_lsp::lint_document(settings, &document, Some(root)).await {
            Ok(diagnostics) => {
                print_diagnostics(&diagnostics, file);
                issues += diagnostics.len();
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return 2;
            }
        }
    }

    if issues == 0 {
        println!("No issues found");
        0
    } else {
        println!("\nFound {} issue(s)", issues);
        1
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic], file: &Path) {
    for diag in diagnostics {
        let severity_str = match diag.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",     // red
            Severity::Warning => "\x1b[33mwarning\x1b[0m", // yellow
            Severity::Info => "\x1b[34minfo\x1b[0m",       // blue
        };

        println!(
            "{severity_str}[{}]: {} at {}:{}:{}",
            diag.code,
            diag.message,
            file.display(),
            diag.range.start.line + 1,
            diag.range.start.character + 1
        );
    }
}
