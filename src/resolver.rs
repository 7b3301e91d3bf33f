// ABOUTME: Name resolution with timeout and cancellation, serialized per owner
// ABOUTME: Grounded on original_source/include/asionet/Resolver.h, built on tokio::net::lookup_host

use crate::closeable::{CloseSignal, Closeable};
use crate::deadline::with_deadline;
use crate::error::{Error, Result};
use crate::queue::OperationQueue;
use std::net::SocketAddr;
use std::time::Duration;

/// Resolves a host/port pair into an ordered list of endpoints (spec §4.6).
/// A close — whether from `stop()` or from the deadline timer expiring —
/// cancels an in-progress resolution. Concurrent `resolve` calls from one
/// owner are serialized FIFO.
#[derive(Clone)]
pub struct Resolver {
    signal: CloseSignal,
    queue: OperationQueue,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            signal: CloseSignal::new(),
            queue: OperationQueue::new(),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, host: &str, port: u16, timeout: Duration) -> Result<Vec<SocketAddr>> {
        self.signal.reopen();
        let signal = self.signal.clone();
        let host = host.to_string();

        self.queue
            .dispatch(with_deadline(&signal, timeout, async move {
                tokio::select! {
                    biased;
                    _ = signal.closed() => Err(Error::Aborted),
                    result = tokio::net::lookup_host((host.as_str(), port)) => {
                        match result {
                            Ok(iter) => Ok(iter.collect::<Vec<_>>()),
                            Err(cause) => Err(Error::failed_operation(cause)),
                        }
                    }
                }
            }))
            .await
    }

    pub fn stop(&self) {
        self.signal.close();
        self.queue.cancel_queued();
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver::new()
    }
}

impl Closeable for Resolver {
    fn is_open(&self) -> bool {
        self.signal.is_open()
    }

    fn close(&self) {
        self.signal.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_localhost() {
        let resolver = Resolver::new();
        let addrs = resolver
            .resolve("localhost", 0, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(!addrs.is_empty());
    }

    #[tokio::test]
    async fn stop_then_resolve_still_works() {
        let resolver = Resolver::new();
        resolver.stop();
        // The façade re-opens its endpoint on next use (spec §7).
        let addrs = resolver
            .resolve("localhost", 0, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(!addrs.is_empty());
    }
}
