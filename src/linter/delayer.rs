//! Per-document throttling of lint runs.
//!
//! A [`ThrottledDelayer`] runs at most one task at a time and keeps at most
//! one more waiting. Triggers that arrive while a task is scheduled or
//! running replace the waiting task, so a burst of edits costs at most two
//! runs no matter how long it is.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

/// Unit of work scheduled through a delayer.
pub type LintTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayerState {
    Idle,
    /// A task is waiting out its delay or executing
    Running,
    /// As `Running`, with a follow-up queued behind it
    RunningWithPending,
}

struct Scheduled {
    task: LintTask,
    delay: Duration,
}

#[derive(Default)]
struct Inner {
    running: bool,
    pending: Option<Scheduled>,
    disposed: bool,
}

pub struct ThrottledDelayer {
    delay: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl ThrottledDelayer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task` after the configured delay.
    pub async fn trigger(&self, task: LintTask) {
        self.schedule(task, self.delay).await;
    }

    /// Schedule `task` without waiting out the delay. Still never overlaps a
    /// running task.
    pub async fn trigger_now(&self, task: LintTask) {
        self.schedule(task, Duration::ZERO).await;
    }

    async fn schedule(&self, task: LintTask, delay: Duration) {
        let mut inner = self.inner.lock().await;
        if inner.disposed {
            return;
        }

        if inner.running {
            if inner.pending.replace(Scheduled { task, delay }).is_some() {
                log::trace!("Dropped superseded pending lint task");
            }
            return;
        }

        inner.running = true;
        drop(inner);

        tokio::spawn(drive(Arc::clone(&self.inner), Scheduled { task, delay }));
    }

    pub async fn state(&self) -> DelayerState {
        let inner = self.inner.lock().await;
        match (inner.running, inner.pending.is_some()) {
            (false, _) => DelayerState::Idle,
            (true, false) => DelayerState::Running,
            (true, true) => DelayerState::RunningWithPending,
        }
    }

    /// Abandon pending work. A task that already started runs to completion,
    /// nothing scheduled afterwards starts.
    pub async fn dispose(&self) {
        let mut inner = self.inner.lock().await;
        inner.disposed = true;
        inner.pending = None;
    }
}

async fn drive(inner: Arc<Mutex<Inner>>, mut next: Scheduled) {
    loop {
        if !next.delay.is_zero() {
            tokio::time::sleep(next.delay).await;
        }

        {
            let mut guard = inner.lock().await;
            if guard.disposed {
                guard.running = false;
                return;
            }
        }

        next.task.await;

        let mut guard = inner.lock().await;
        match guard.pending.take() {
            Some(pending) if !guard.disposed => next = pending,
            _ => {
                guard.running = false;
                return;
            }
        }
    }
}
