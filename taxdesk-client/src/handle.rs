//! Cancellation handle for a running chat stream.

use parking_lot::ReentrantMutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How a pushed chat stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The body ended normally.
    Completed,
    /// The server reported an error or the transport failed.
    Failed(String),
    /// The stream was aborted by its caller.
    Aborted,
}

impl StreamOutcome {
    /// Whether the stream ended without error or abort.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[derive(Debug, Default)]
struct AbortState {
    token: CancellationToken,
    // held while a handler runs and while aborting
    gate: ReentrantMutex<()>,
}

/// Cloneable abort switch for one chat stream.
///
/// Handlers run under the same lock that [`abort`](Self::abort) takes, so
/// once `abort` returns no handler is running and none will run again. A
/// handler may abort its own stream.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    state: Arc<AbortState>,
}

impl AbortHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stop the stream. Calling it again does nothing.
    ///
    /// Waits for a handler that is currently running on another thread.
    pub fn abort(&self) {
        let _gate = self.state.gate.lock();
        if !self.state.token.is_cancelled() {
            debug!("Aborting chat stream");
            self.state.token.cancel();
        }
    }

    /// Whether [`abort`](Self::abort) has been called.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.state.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.state.token
    }

    /// Run `f` unless the stream is aborted; `None` if it was.
    pub(crate) fn run_unless_aborted<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.state.gate.lock();
        if self.state.token.is_cancelled() {
            return None;
        }
        Some(f())
    }
}

/// Handle returned by [`ChatClient::stream_chat`](crate::ChatClient::stream_chat).
///
/// Dropping the handle does not stop the stream.
#[derive(Debug)]
pub struct StreamHandle {
    abort: AbortHandle,
    task: JoinHandle<StreamOutcome>,
}

impl StreamHandle {
    pub(crate) fn new(abort: AbortHandle, task: JoinHandle<StreamOutcome>) -> Self {
        Self { abort, task }
    }

    /// Stop the stream.
    ///
    /// No handler is running once this returns, and none is invoked after.
    /// Calling it again, or after the stream has finished, does nothing.
    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Whether [`abort`](Self::abort) has been called.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }

    /// Whether the background task has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cloneable switch that aborts this stream.
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Wait for the stream to end.
    pub async fn join(self) -> StreamOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => StreamOutcome::Aborted,
            Err(e) => StreamOutcome::Failed(e.to_string()),
        }
    }
}
