// ABOUTME: ServiceClient<Req, Resp, C> facade: resolve -> connect -> write -> read, one fresh
// ABOUTME: connection per call. Grounded on the teacher's client/traits.rs + client/default.rs layering

use crate::codec::{Decode, Encode};
use crate::error::{Error, Result};
use crate::queue::OperationQueue;
use crate::resolver::Resolver;
use crate::transport::stream::Connection;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// Typed request/response client over TCP (spec §6). Each `call` resolves
/// the target, opens a fresh connection, writes the request frame, reads
/// the response frame, and closes the connection — exactly one exchange
/// per connection (spec §3 "Request-Response pair"). Calls from one client
/// are FIFO-serialized through an [`OperationQueue`].
pub struct ServiceClient<Req, Resp, C> {
    codec: C,
    max_message_size: usize,
    queue: OperationQueue,
    resolver: Resolver,
    _marker: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp, C> ServiceClient<Req, Resp, C>
where
    C: Encode<Req> + Decode<Resp> + Clone + Send + Sync + 'static,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    pub fn new(codec: C, max_message_size: usize) -> Self {
        ServiceClient {
            codec,
            max_message_size,
            queue: OperationQueue::new(),
            resolver: Resolver::new(),
            _marker: PhantomData,
        }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn call(&self, request: &Req, host: &str, port: u16, timeout: Duration) -> Result<Resp> {
        let payload = self.codec.encode(request).map_err(Error::Encoding)?;
        let codec = self.codec.clone();
        let max_message_size = self.max_message_size;
        let resolver = self.resolver.clone();
        let host = host.to_string();

        self.queue
            .dispatch(async move {
                let deadline = Instant::now() + timeout;
                let remaining = || deadline.saturating_duration_since(Instant::now());

                let addrs = resolver.resolve(&host, port, remaining()).await?;
                let addr = addrs
                    .into_iter()
                    .next()
                    .ok_or_else(Error::failed_operation_no_cause)?;

                let mut conn = Connection::connect(addr, remaining()).await?;
                conn.write_frame(&payload, remaining(), max_message_size).await?;
                let response = conn.read_frame(remaining(), max_message_size).await?;
                conn.close();

                codec.decode(&response).map_err(Error::Decoding)
            })
            .await
    }

    /// Outstanding and queued calls complete with `Error::Aborted`;
    /// subsequent calls work normally (spec §7).
    pub fn stop(&self) {
        self.queue.cancel_queued();
        self.resolver.stop();
    }
}
