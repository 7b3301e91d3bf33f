// ABOUTME: Serializing sub-executor for the timer/completion race described in spec §5
// ABOUTME: Guarantees exactly one of {timer expiry, operation completion} observes the other's effect

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A strand serializes arbitrary async work attached to it, regardless of how
/// many worker threads the executor runs. The deadline-bound operation
/// (`crate::deadline::with_deadline`) uses one per in-flight operation so the
/// timer-expiry closer and the completion handler can never interleave.
///
/// Grounded on the GLOSSARY entry and Design Note "Strand for timer/operation
/// race": essential, not a thing a later revision superseded.
#[derive(Clone, Default)]
pub struct Strand {
    lock: Arc<Mutex<()>>,
}

impl Strand {
    pub fn new() -> Self {
        Strand::default()
    }

    /// Run `fut` with the strand held, so no other task on this strand can
    /// run concurrently with it.
    pub async fn run<F, T>(&self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let _guard = self.lock.lock().await;
        fut.await
    }
}
