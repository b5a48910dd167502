//! Background run with a foreground event loop.
//!
//! A front-end owning an event loop (a window, a terminal spinner) runs the
//! launch on a worker thread and keeps its loop on the calling thread. The
//! worker hands its single result back through a one-slot channel and then
//! asks the loop to quit. Closing the front-end cancels cooperatively: the
//! worker is not interrupted, its late result is simply discarded.

use std::sync::mpsc::{TryRecvError, sync_channel};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::error::LaunchError;

#[derive(Debug, Default)]
struct LoopState {
    quit: bool,
    closed_by_user: bool,
}

/// Shared control handle for the foreground event loop.
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    inner: Arc<(Mutex<LoopState>, Condvar)>,
}

impl LoopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LoopState> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the event loop to exit.
    pub fn quit(&self) {
        self.state().quit = true;
        self.inner.1.notify_all();
    }

    /// Record that the user closed the front-end, then quit the loop.
    pub fn close_by_user(&self) {
        {
            let mut state = self.state();
            state.closed_by_user = true;
            state.quit = true;
        }
        self.inner.1.notify_all();
    }

    pub fn is_closed_by_user(&self) -> bool {
        self.state().closed_by_user
    }

    pub fn should_quit(&self) -> bool {
        self.state().quit
    }

    /// Block until the loop is asked to quit.
    pub fn wait(&self) {
        let (lock, condvar) = &*self.inner;
        let mut state = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !state.quit {
            state = condvar.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until quit or until `timeout` elapses; returns true on quit.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, condvar) = &*self.inner;
        let state = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (state, _) = condvar
            .wait_timeout_while(state, timeout, |state| !state.quit)
            .unwrap_or_else(PoisonError::into_inner);
        state.quit
    }
}

/// Run `job` on a worker thread while `event_loop` runs on this one.
///
/// Returns the job's result, or [`LaunchError::ExecutionCanceled`] if the
/// user closed the loop or the loop ended before a result arrived.
pub fn run_with_event_loop<T, J, L>(job: J, event_loop: L) -> anyhow::Result<T>
where
    T: Send + 'static,
    J: FnOnce() -> anyhow::Result<T> + Send + 'static,
    L: FnOnce(&LoopHandle),
{
    let handle = LoopHandle::new();
    let (sender, receiver) = sync_channel(1);

    let worker_handle = handle.clone();
    std::thread::Builder::new()
        .name("liftoff-run".to_string())
        .spawn(move || {
            let result = job();
            // The receiver is gone once the foreground has given up
            let _ = sender.send(result);
            worker_handle.quit();
        })
        .map_err(|e| anyhow::anyhow!("Failed to start the background run: {}", e))?;

    event_loop(&handle);

    if handle.is_closed_by_user() {
        debug!("Front-end closed by the user; discarding any run result");
        return Err(LaunchError::ExecutionCanceled.into());
    }

    match receiver.try_recv() {
        Ok(result) => result,
        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
            debug!("Event loop ended without a run result");
            Err(LaunchError::ExecutionCanceled.into())
        }
    }
}
