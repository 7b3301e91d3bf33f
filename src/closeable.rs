// ABOUTME: Closable endpoint abstraction shared by streams, datagram sockets, listeners and the resolver
// ABOUTME: Closing is idempotent and never fails observably; it is also how cancellation is expressed

use std::sync::Arc;
use tokio::sync::watch;

/// A closable I/O handle: a stream connection, a datagram socket, a
/// listener, or a name resolver (spec §3 "Endpoint"). `is_open` and `close`
/// are both idempotent; `close` never fails observably.
pub trait Closeable: Send + Sync {
    fn is_open(&self) -> bool;
    fn close(&self);
}

/// Shared open/closed flag with a wakeup for whoever is racing an
/// in-flight operation against a close. Built on a `watch` channel rather
/// than a raw `Notify` so a `close()` that happens before the waiter starts
/// watching is never missed.
#[derive(Clone)]
pub struct CloseSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CloseSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        CloseSignal { tx: Arc::new(tx) }
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn close(&self) {
        let _ = self.tx.send(false);
    }

    /// Façades re-open their endpoint on next use after `stop()` (spec §7).
    pub fn reopen(&self) {
        let _ = self.tx.send(true);
    }

    /// Resolves once the signal transitions to closed. Resolves immediately
    /// if already closed.
    pub async fn closed(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if !*rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CloseSignal {
    fn default() -> Self {
        CloseSignal::new()
    }
}

impl Closeable for CloseSignal {
    fn is_open(&self) -> bool {
        CloseSignal::is_open(self)
    }

    fn close(&self) {
        CloseSignal::close(self)
    }
}
