// ABOUTME: One-shot and periodic deadlines built on tokio's clock, cancellable via an override slot
// ABOUTME: Grounded on original_source/include/asionet/Timer.h (the OverrideOperation-based revision)

use crate::closeable::CloseSignal;
use crate::error::Error;
use crate::executor::Executor;
use crate::override_op::OverrideSlot;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// A cancellable one-shot or periodic timer bound to an [`Executor`] (spec
/// §3/§4.5). `start_one_shot`/`start_periodic` return immediately; the
/// handler runs later on the executor. Re-arming or `stop()`-ping before a
/// one-shot fires suppresses its handler.
#[derive(Clone)]
pub struct Timer {
    executor: Executor,
    slot: OverrideSlot,
    // The cancellation signal for whichever invocation is presently running.
    // The override slot guarantees at most one is, so there is no ambiguity
    // about which invocation `stop`/re-arm should cancel.
    current: Arc<Mutex<Option<CloseSignal>>>,
}

impl Timer {
    pub fn new(executor: Executor) -> Self {
        Timer {
            executor,
            slot: OverrideSlot::new(),
            current: Arc::new(Mutex::new(None)),
        }
    }

    fn cancel_running(&self) {
        if let Some(signal) = self.current.lock().unwrap().as_ref() {
            signal.close();
        }
    }

    /// Schedule `handler` to run once after `duration`. If re-armed (another
    /// `start_one_shot`/`start_periodic` call) or `stop()`-ped before firing,
    /// `handler` does not run.
    pub fn start_one_shot<H>(&self, duration: Duration, handler: H)
    where
        H: FnOnce() + Send + 'static,
    {
        let slot = self.slot.clone();
        let current = self.current.clone();
        let cancel = {
            let slot_self = self.clone();
            move || slot_self.cancel_running()
        };
        // Gate synchronously, right here, so two back-to-back calls to
        // start_one_shot/start_periodic are ordered by call order rather
        // than by whichever of their deferred tasks the executor happens to
        // poll first (only the op itself — the actual wait — is deferred).
        let gate = slot.begin(cancel);
        self.executor.post(async move {
            let _ = slot
                .run_gated(gate, async move {
                    let signal = CloseSignal::new();
                    *current.lock().unwrap() = Some(signal.clone());

                    let deadline = Instant::now() + duration;
                    tokio::select! {
                        biased;
                        _ = signal.closed() => {}
                        _ = sleep_until(deadline) => {
                            if signal.is_open() {
                                handler();
                            }
                        }
                    }
                    Ok::<(), Error>(())
                })
                .await;
        });
    }

    /// Schedule `handler` to run every `interval`, measuring the next
    /// deadline from the previous *scheduled* deadline rather than from
    /// handler completion, so drift does not accumulate (spec §4.5).
    pub fn start_periodic<H>(&self, interval: Duration, handler: H)
    where
        H: Fn() + Send + Sync + 'static,
    {
        let slot = self.slot.clone();
        let current = self.current.clone();
        let cancel = {
            let slot_self = self.clone();
            move || slot_self.cancel_running()
        };
        // See start_one_shot: gate synchronously, defer only the wait itself.
        let gate = slot.begin(cancel);
        self.executor.post(async move {
            let _ = slot
                .run_gated(gate, async move {
                    let signal = CloseSignal::new();
                    *current.lock().unwrap() = Some(signal.clone());

                    let mut deadline = Instant::now() + interval;
                    loop {
                        tokio::select! {
                            biased;
                            _ = signal.closed() => break,
                            _ = sleep_until(deadline) => {
                                if !signal.is_open() {
                                    break;
                                }
                                handler();
                                deadline += interval;
                            }
                        }
                    }
                    Ok::<(), Error>(())
                })
                .await;
        });
    }

    /// Cancel any armed wait. Idempotent.
    pub fn stop(&self) {
        self.cancel_running();
        self.slot.cancel_pending();
    }
}
