// ABOUTME: Blocking bridge from the async world to a caller thread, for tests and integration glue
// ABOUTME: Grounded on original_source/include/Wait.h and src/Wait.cpp

use crate::executor::Executor;
use std::ops::{BitAnd, BitOr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// An arbitrary boolean combination of [`Waitable`]s, built with `&`/`|`
/// (Rust has no `&&`/`||` overloads, unlike the C++ original).
#[derive(Clone)]
pub struct WaitExpression(Arc<dyn Fn() -> bool + Send + Sync>);

impl WaitExpression {
    fn eval(&self) -> bool {
        (self.0)()
    }
}

impl BitAnd for WaitExpression {
    type Output = WaitExpression;
    fn bitand(self, rhs: Self) -> Self::Output {
        WaitExpression(Arc::new(move || self.eval() && rhs.eval()))
    }
}

impl BitOr for WaitExpression {
    type Output = WaitExpression;
    fn bitor(self, rhs: Self) -> Self::Output {
        WaitExpression(Arc::new(move || self.eval() || rhs.eval()))
    }
}

impl BitAnd<WaitExpression> for &Waitable {
    type Output = WaitExpression;
    fn bitand(self, rhs: WaitExpression) -> Self::Output {
        self.expression() & rhs
    }
}

impl BitAnd<&Waitable> for WaitExpression {
    type Output = WaitExpression;
    fn bitand(self, rhs: &Waitable) -> Self::Output {
        self & rhs.expression()
    }
}

impl BitAnd<&Waitable> for &Waitable {
    type Output = WaitExpression;
    fn bitand(self, rhs: &Waitable) -> Self::Output {
        self.expression() & rhs.expression()
    }
}

impl BitOr<WaitExpression> for &Waitable {
    type Output = WaitExpression;
    fn bitor(self, rhs: WaitExpression) -> Self::Output {
        self.expression() | rhs
    }
}

impl BitOr<&Waitable> for WaitExpression {
    type Output = WaitExpression;
    fn bitor(self, rhs: &Waitable) -> Self::Output {
        self | rhs.expression()
    }
}

impl BitOr<&Waitable> for &Waitable {
    type Output = WaitExpression;
    fn bitor(self, rhs: &Waitable) -> Self::Output {
        self.expression() | rhs.expression()
    }
}

/// A boolean `ready` flag paired with its owning [`Waiter`]'s condition
/// variable. Wrapping a completion handler with `wrap` returns a handler
/// that runs the original then flips `ready` and wakes anyone waiting.
#[derive(Clone)]
pub struct Waitable {
    ready: Arc<AtomicBool>,
    notify: Arc<(Mutex<()>, Condvar)>,
}

impl Waitable {
    fn new(notify: Arc<(Mutex<()>, Condvar)>) -> Self {
        Waitable {
            ready: Arc::new(AtomicBool::new(false)),
            notify,
        }
    }

    /// Wraps `handler`, so that once it runs, this `Waitable` becomes ready.
    pub fn wrap<F, T>(&self, handler: F) -> impl FnOnce(T)
    where
        F: FnOnce(T),
    {
        let this = self.clone();
        move |arg: T| {
            handler(arg);
            this.set_ready();
        }
    }

    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
        let (lock, cvar) = &*self.notify;
        let _guard = lock.lock().unwrap();
        cvar.notify_all();
    }

    pub fn set_waiting(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn expression(&self) -> WaitExpression {
        let ready = self.ready.clone();
        WaitExpression(Arc::new(move || ready.load(Ordering::SeqCst)))
    }
}

/// Blocks a caller thread until a [`WaitExpression`] becomes true (spec
/// §4.9). If the calling thread is one of the executor's own worker
/// threads, the wait runs inside `tokio::task::block_in_place` so the
/// runtime can move other work off this thread while it blocks — the Rust
/// realization of "pump the executor one step at a time" from the original.
/// Otherwise the thread sleeps on a condition variable.
pub struct Waiter {
    executor: Executor,
    notify: Arc<(Mutex<()>, Condvar)>,
}

impl Waiter {
    pub fn new(executor: Executor) -> Self {
        Waiter {
            executor,
            notify: Arc::new((Mutex::new(()), Condvar::new())),
        }
    }

    pub fn new_waitable(&self) -> Waitable {
        Waitable::new(self.notify.clone())
    }

    pub fn wait(&self, expr: WaitExpression) {
        if self.executor.is_worker_thread() {
            tokio::task::block_in_place(|| self.block_until(&expr));
        } else {
            self.block_until(&expr);
        }
    }

    pub fn wait_on(&self, waitable: &Waitable) {
        self.wait(waitable.expression());
    }

    fn block_until(&self, expr: &WaitExpression) {
        let (lock, cvar) = &*self.notify;
        let mut guard = lock.lock().unwrap();
        while !expr.eval() {
            guard = cvar.wait(guard).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn wait_blocks_until_the_waitable_is_set_ready() {
        let executor = Executor::current();
        let waiter = Arc::new(Waiter::new(executor));
        let waitable = waiter.new_waitable();

        let signalled = {
            let waitable = waitable.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                waitable.set_ready();
            })
        };

        let expr = waitable.expression();
        tokio::task::spawn_blocking({
            let waiter = waiter.clone();
            move || waiter.wait(expr)
        })
        .await
        .unwrap();

        signalled.await.unwrap();
        assert!(waitable.is_ready());
    }

    #[test]
    fn and_or_expressions_combine_readiness() {
        let notify = Arc::new((Mutex::new(()), Condvar::new()));
        let a = Waitable::new(notify.clone());
        let b = Waitable::new(notify);

        let and_expr = &a & &b;
        let or_expr = &a | &b;
        assert!(!and_expr.eval());
        assert!(!or_expr.eval());

        a.set_ready();
        assert!(!and_expr.eval());
        assert!(or_expr.eval());

        b.set_ready();
        assert!(and_expr.eval());
    }
}
