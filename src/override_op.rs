// ABOUTME: Per-owner single-pending-slot override that supersedes and cancels the previous in-flight op
// ABOUTME: Grounded on original_source/include/asionet/OverrideOperation.h, reworked around async/await

use crate::error::{Error, Result};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

struct OverrideState {
    executing: bool,
    pending: Option<oneshot::Sender<()>>,
}

/// Replaces any in-flight operation with a newer one, cancelling the old one
/// (spec §4.4). Used where only the newest request matters, e.g.
/// `DatagramReceiver::async_receive` re-arming.
#[derive(Clone)]
pub struct OverrideSlot {
    state: Arc<Mutex<OverrideState>>,
}

/// The outcome of [`OverrideSlot::begin`]'s synchronous bookkeeping: either
/// the caller may run its operation immediately, or must wait its turn on
/// the returned receiver first.
pub enum DispatchGate {
    Immediate,
    Pending(oneshot::Receiver<()>),
}

impl OverrideSlot {
    pub fn new() -> Self {
        OverrideSlot {
            state: Arc::new(Mutex::new(OverrideState {
                executing: false,
                pending: None,
            })),
        }
    }

    /// The synchronous half of `dispatch`: decides, *at the moment it is
    /// called*, whether this operation may start now or must wait behind
    /// whatever is currently running, invoking `cancel_running` (typically
    /// `close(endpoint)`) in the latter case. Exposed separately from
    /// `dispatch` so a caller that defers the rest of the operation onto an
    /// executor (e.g. `Timer::start_one_shot`) can still gate back-to-back
    /// calls in the order they were actually issued — deferring this
    /// decision into a spawned task as well would leave it at the mercy of
    /// whichever task the executor happens to poll first.
    pub fn begin<C>(&self, cancel_running: C) -> DispatchGate
    where
        C: FnOnce(),
    {
        let mut state = self.state.lock().unwrap();
        if !state.executing {
            state.executing = true;
            DispatchGate::Immediate
        } else {
            cancel_running();
            let (tx, rx) = oneshot::channel();
            state.pending = Some(tx); // drops (and so aborts) any previous pending sender
            DispatchGate::Pending(rx)
        }
    }

    /// Runs `op` given a `gate` already obtained from `begin`: waits out a
    /// pending gate (reporting `Aborted` if superseded before its turn),
    /// then runs `op` under the move-only finished-notifier that keeps the
    /// slot's bookkeeping correct however `op` ends.
    pub async fn run_gated<F, T>(&self, gate: DispatchGate, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let DispatchGate::Pending(rx) = gate {
            if rx.await.is_err() {
                return Err(Error::Aborted);
            }
        }

        let _notifier = FinishedNotifier {
            state: Some(self.state.clone()),
        };
        op.await
    }

    /// Run `op`. If nothing is executing, `op` starts immediately. Otherwise
    /// `cancel_running` is invoked (typically `close(endpoint)`) to abort
    /// whatever is currently running, and `op` is stored as the single
    /// pending operation, replacing (and thereby aborting) any operation
    /// that was already pending.
    pub async fn dispatch<C, F, T>(&self, cancel_running: C, op: F) -> Result<T>
    where
        C: FnOnce(),
        F: Future<Output = Result<T>>,
    {
        let gate = self.begin(cancel_running);
        self.run_gated(gate, op).await
    }

    /// Drops the pending slot. Does not cancel a currently running
    /// operation; the owner decides whether to close the endpoint too.
    pub fn cancel_pending(&self) {
        let mut state = self.state.lock().unwrap();
        state.pending = None;
    }
}

impl Default for OverrideSlot {
    fn default() -> Self {
        OverrideSlot::new()
    }
}

struct FinishedNotifier {
    state: Option<Arc<Mutex<OverrideState>>>,
}

impl Drop for FinishedNotifier {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        let mut state = state.lock().unwrap();
        match state.pending.take() {
            Some(tx) => {
                let _ = tx.send(());
            }
            None => state.executing = false,
        }
    }
}
