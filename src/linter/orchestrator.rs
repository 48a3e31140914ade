//! Coordination of ShellCheck runs for every open document.
//!
//! The orchestrator owns two tables keyed by document URI: the throttling
//! queue of each document and the diagnostics last published for it. Both
//! live behind one lock, and publication to the host happens while holding
//! it, so clears and results for a document reach the host in the order they
//! were decided.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use super::delayer::{LintTask, ThrottledDelayer};
use super::diagnostics::Diagnostic;
use super::exclusion::FileMatcher;
use super::invocation::LinterError;
use super::version::check_tool_version;
use crate::config::{RunTrigger, Settings};
use crate::host::{Document, Host};

/// Reason a document is not linted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    Disabled,
    NotShellScript,
    IgnoredScheme,
    IgnoredPath,
}

/// Event that asks for a lint run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Open,
    Change,
    Save,
    /// Explicit user request, bypasses the debounce delay
    Manual,
    /// Startup or configuration reload
    Refresh,
}

impl Trigger {
    fn applies(self, run: RunTrigger) -> bool {
        match self {
            Trigger::Open | Trigger::Refresh => run != RunTrigger::Manual,
            Trigger::Change => run == RunTrigger::OnType,
            Trigger::Save => run == RunTrigger::OnSave,
            Trigger::Manual => true,
        }
    }
}

struct DocumentQueue {
    delayer: ThrottledDelayer,
    /// Identifies this queue; results from runs of a discarded queue are
    /// dropped
    generation: u64,
}

struct State {
    settings: Arc<Settings>,
    matcher: FileMatcher,
    workspace_root: Option<PathBuf>,
    queues: HashMap<String, DocumentQueue>,
    diagnostics: HashMap<String, Vec<Diagnostic>>,
    next_generation: u64,
}

impl State {
    fn new(settings: Settings) -> Self {
        Self {
            matcher: FileMatcher::new(&settings.ignore_patterns),
            settings: Arc::new(settings),
            workspace_root: None,
            queues: HashMap::new(),
            diagnostics: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Gates are checked in order; the first failing one wins.
    fn gate(&self, document: &Document) -> Result<(), Skip> {
        if !self.settings.enable {
            return Err(Skip::Disabled);
        }
        if !document.is_shell_script() {
            return Err(Skip::NotShellScript);
        }
        if self
            .settings
            .ignore_file_schemes
            .iter()
            .any(|scheme| scheme == document.scheme())
        {
            return Err(Skip::IgnoredScheme);
        }
        if !self.matcher.is_empty()
            && let Some(path) = &document.path
            && self.matcher.excludes(path, self.workspace_root.as_deref())
        {
            return Err(Skip::IgnoredPath);
        }
        Ok(())
    }

    fn queue_for(&mut self, uri: &str) -> &DocumentQueue {
        if !self.queues.contains_key(uri) {
            self.next_generation += 1;
            let queue = DocumentQueue {
                delayer: ThrottledDelayer::new(self.settings.run.debounce()),
                generation: self.next_generation,
            };
            self.queues.insert(uri.to_string(), queue);
        }
        &self.queues[uri]
    }
}

pub struct LintOrchestrator<H: Host> {
    host: H,
    state: Mutex<State>,
    /// Set once the user was told the tool is missing, until settings reload
    tool_missing_reported: AtomicBool,
}

impl<H: Host> LintOrchestrator<H> {
    pub fn new(host: H) -> Arc<Self> {
        Arc::new(Self {
            host,
            state: Mutex::new(State::new(Settings::default())),
            tool_missing_reported: AtomicBool::new(false),
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Load settings, lint every open document and start the version check.
    pub async fn initialize(self: &Arc<Self>) {
        let settings = self.reload().await;
        log::info!("Linting initialized (run: {:?})", settings.run);

        self.lint_open_documents(Trigger::Refresh).await;

        let this = Arc::clone(self);
        let root = self.state.lock().await.workspace_root.clone();
        tokio::spawn(async move {
            check_tool_version(&this.host, &settings, root.as_deref()).await;
        });
    }

    /// Reset all per-document state against fresh settings and lint again.
    pub async fn on_configuration_changed(self: &Arc<Self>) {
        let settings = self.reload().await;
        log::info!("Configuration reloaded (enabled: {})", settings.enable);

        {
            let mut state = self.state.lock().await;
            for (_, queue) in state.queues.drain() {
                queue.delayer.dispose().await;
            }
            self.tool_missing_reported.store(false, Ordering::SeqCst);

            if !settings.enable {
                for (uri, _) in state.diagnostics.drain() {
                    self.host.publish_diagnostics(&uri, &[], "").await;
                }
            }
        }

        self.lint_open_documents(Trigger::Refresh).await;
    }

    pub async fn on_document_opened(self: &Arc<Self>, document: &Document) {
        self.handle(document, Trigger::Open).await;
    }

    pub async fn on_document_changed(self: &Arc<Self>, document: &Document) {
        self.handle(document, Trigger::Change).await;
    }

    pub async fn on_document_saved(self: &Arc<Self>, document: &Document) {
        self.handle(document, Trigger::Save).await;
    }

    /// Forget everything about a closed document.
    pub async fn on_document_closed(&self, uri: &str) {
        let mut state = self.state.lock().await;
        if let Some(queue) = state.queues.remove(uri) {
            queue.delayer.dispose().await;
        }
        state.diagnostics.remove(uri);
        self.host.publish_diagnostics(uri, &[], "").await;
    }

    /// Lint `uri` right away, whatever the configured trigger.
    pub async fn lint_now(self: &Arc<Self>, uri: &str) -> bool {
        match self.host.document(uri).await {
            Some(document) => {
                self.handle(&document, Trigger::Manual).await;
                true
            }
            None => {
                log::warn!("Cannot lint unknown document: {}", uri);
                false
            }
        }
    }

    /// Diagnostics currently recorded for `uri`.
    pub async fn diagnostics(&self, uri: &str) -> Vec<Diagnostic> {
        let state = self.state.lock().await;
        state.diagnostics.get(uri).cloned().unwrap_or_default()
    }

    /// Generation of the throttling queue for `uri`, if one exists. A new
    /// queue always gets a new generation.
    pub async fn queue_generation(&self, uri: &str) -> Option<u64> {
        let state = self.state.lock().await;
        state.queues.get(uri).map(|queue| queue.generation)
    }

    async fn reload(&self) -> Arc<Settings> {
        let settings = Arc::new(self.host.settings().await);
        let workspace_root = self.host.workspace_root().await;

        let mut state = self.state.lock().await;
        state.matcher = FileMatcher::new(&settings.ignore_patterns);
        state.settings = Arc::clone(&settings);
        state.workspace_root = workspace_root;
        settings
    }

    async fn lint_open_documents(self: &Arc<Self>, trigger: Trigger) {
        for document in self.host.open_documents().await {
            self.handle(&document, trigger).await;
        }
    }

    async fn handle(self: &Arc<Self>, document: &Document, trigger: Trigger) {
        let mut state = self.state.lock().await;

        if let Err(skip) = state.gate(document) {
            log::debug!("Not linting {}: {:?}", document.uri, skip);
            if state.diagnostics.remove(&document.uri).is_some() {
                self.host.publish_diagnostics(&document.uri, &[], "").await;
            }
            return;
        }

        if !trigger.applies(state.settings.run) {
            return;
        }

        let queue = state.queue_for(&document.uri);
        let task: LintTask = Box::pin(
            Arc::clone(self).run_lint(document.uri.clone(), queue.generation),
        );
        match trigger {
            Trigger::Manual => queue.delayer.trigger_now(task).await,
            _ => queue.delayer.trigger(task).await,
        }
    }

    /// One ShellCheck run, executed by the document's delayer.
    async fn run_lint(self: Arc<Self>, uri: String, generation: u64) {
        let Some(document) = self.host.document(&uri).await else {
            log::debug!("Document closed before linting: {}", uri);
            return;
        };

        let (settings, workspace_root) = {
            let state = self.state.lock().await;
            (Arc::clone(&state.settings), state.workspace_root.clone())
        };

        match super::lint_document(&settings, &document, workspace_root.as_deref()).await {
            Ok(diagnostics) => {
                self.publish(&uri, generation, diagnostics, &document.text)
                    .await
            }
            Err(e) if e.is_missing_tool() => {
                self.report_missing_tool(&e, &settings, workspace_root.as_deref())
                    .await
            }
            Err(e) => log::error!("Linting {} failed: {}", uri, e),
        }
    }

    async fn publish(
        &self,
        uri: &str,
        generation: u64,
        diagnostics: Vec<Diagnostic>,
        text: &str,
    ) {
        let mut state = self.state.lock().await;

        let current = state.queues.get(uri).map(|queue| queue.generation);
        if current != Some(generation) {
            log::debug!("Discarding results of a superseded run for {}", uri);
            return;
        }

        self.host.publish_diagnostics(uri, &diagnostics, text).await;
        state.diagnostics.insert(uri.to_string(), diagnostics);
    }

    async fn report_missing_tool(
        &self,
        error: &LinterError,
        settings: &Settings,
        workspace_root: Option<&std::path::Path>,
    ) {
        log::warn!("{}", error);
        if self.tool_missing_reported.swap(true, Ordering::SeqCst) {
            return;
        }

        let message = match error {
            LinterError::WslUnavailable => {
                "Windows Subsystem for Linux is not installed. Install it or turn off the \
                 `useWSL` setting."
                    .to_string()
            }
            _ => format!(
                "Could not run ShellCheck ({}). Install it or point `executablePath` at it.",
                settings.executable(workspace_root)
            ),
        };
        self.host.show_error(&message).await;
    }
}
