// ABOUTME: Shared event-loop handle that every endpoint, timer, and queue dispatches work on
// ABOUTME: Wraps a tokio runtime so the core never hand-rolls its own reactor

use std::future::Future;
use tokio::runtime::{Builder, Handle, Runtime};

/// A process-wide scheduler for deferred callbacks and I/O readiness.
///
/// Mirrors spec §3's "Executor context": one or more worker threads drive it
/// until stopped. Tokio's multi-threaded scheduler *is* that executor — see
/// DESIGN.md for why no separate reactor is built on top of it.
#[derive(Clone)]
pub struct Executor {
    handle: Handle,
    // Keeps a freestanding runtime alive when the executor owns one; `None`
    // when constructed from an ambient `#[tokio::main]` runtime.
    owned: Option<std::sync::Arc<Runtime>>,
}

impl Executor {
    /// Create a new executor with its own dedicated worker-thread pool.
    pub fn new(worker_threads: usize) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();
        Ok(Executor {
            handle,
            owned: Some(std::sync::Arc::new(runtime)),
        })
    }

    /// Adopt the currently running tokio runtime (e.g. inside `#[tokio::main]`)
    /// as the executor, without taking ownership of its lifetime.
    pub fn current() -> Self {
        Executor {
            handle: Handle::current(),
            owned: None,
        }
    }

    /// Post a future to run on this executor, detached from the caller.
    ///
    /// This is the Rust analogue of `asionet::Context::post`: queued
    /// operations (`queue::OperationQueue`, `override_op::OverrideSlot`) use
    /// this to hand a deferred closure back to the executor rather than
    /// running it inline.
    pub fn post<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// True when called from one of this executor's own worker threads.
    /// Used by [`crate::wait::Waiter`] to decide whether to pump the runtime
    /// or fall back to a blocking condvar wait.
    pub fn is_worker_thread(&self) -> bool {
        Handle::try_current().is_ok()
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("owned", &self.owned.is_some())
            .finish()
    }
}
