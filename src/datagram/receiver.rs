// ABOUTME: DatagramReceiver<M, C> facade: override-slot-serialized typed receives over one UDP socket
// ABOUTME: Grounded on original_source/include/asionet/DatagramReceiver.h

use crate::closeable::Closeable;
use crate::codec::Decode;
use crate::error::{Error, Result};
use crate::override_op::OverrideSlot;
use crate::transport::datagram::DatagramEndpoint;
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Receives typed datagrams on a fixed port (spec §6). Re-arming via
/// `receive` while a receive is already outstanding cancels the outstanding
/// one, which completes with `Error::Aborted` — scenario 5 in spec §8.
/// The socket is opened with address-reuse and broadcast enabled on
/// construction.
pub struct DatagramReceiver<M, C> {
    codec: C,
    max_message_size: usize,
    endpoint: Arc<DatagramEndpoint>,
    slot: OverrideSlot,
    _marker: PhantomData<M>,
}

impl<M, C> DatagramReceiver<M, C>
where
    C: Decode<M> + Clone + Send + Sync + 'static,
    M: Send + 'static,
{
    pub fn new(codec: C, binding_port: u16, max_message_size: usize) -> Result<Self> {
        Ok(DatagramReceiver {
            codec,
            max_message_size,
            endpoint: Arc::new(DatagramEndpoint::bind_with_reuse_and_broadcast(binding_port)?),
            slot: OverrideSlot::new(),
            _marker: PhantomData,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn receive(&self, timeout: Duration) -> Result<(M, SocketAddr)> {
        let codec = self.codec.clone();
        let max_message_size = self.max_message_size;
        let endpoint = self.endpoint.clone();
        let cancel_endpoint = endpoint.clone();

        self.slot
            .dispatch(
                move || cancel_endpoint.close(),
                async move {
                    // Only runs once this call has actually started executing
                    // (immediately, or after an overridden predecessor has
                    // finished unwinding), so reopening here can never race
                    // with that predecessor's own close-triggered abort.
                    endpoint.reopen();
                    let (bytes, from) = endpoint.receive_from(timeout, max_message_size).await?;
                    let message = codec.decode(&bytes).map_err(Error::Decoding)?;
                    Ok((message, from))
                },
            )
            .await
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.endpoint.local_addr()
    }

    pub fn stop(&self) {
        self.endpoint.close();
        self.slot.cancel_pending();
    }
}
