// ABOUTME: Pairs a timer with a closable endpoint so expiry cancels the operation by closing it
// ABOUTME: Grounded on original_source/include/asionet/Socket.h's timedAsyncOperation composition

use crate::closeable::Closeable;
use crate::error::{Error, Result};
use crate::strand::Strand;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Race `op` against `duration`. If `op` finishes first, its timer is
/// cancelled and its result is returned unchanged. If the deadline elapses
/// first, `endpoint` is closed — which is what actually aborts `op`, since
/// `op` is expected to be racing `endpoint`'s own close signal internally, as
/// every transport operation in this crate does — and `Error::Aborted` is
/// returned once `op` unwinds.
///
/// The classification step (did the timer fire, or did the operation
/// complete?) runs on a private [`Strand`] so the two can never both decide
/// they won the race (spec §4.2, §5).
pub async fn with_deadline<E, F, T>(endpoint: &E, duration: Duration, op: F) -> Result<T>
where
    E: Closeable,
    F: Future<Output = Result<T>>,
{
    let strand = Strand::new();
    let deadline = Instant::now() + duration;

    tokio::select! {
        biased;
        result = op => {
            strand.run(async {}).await;
            result
        }
        _ = sleep_until(deadline) => {
            strand.run(async { endpoint.close() }).await;
            Err(Error::Aborted)
        }
    }
}
