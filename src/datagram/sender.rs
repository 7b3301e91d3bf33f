// ABOUTME: DatagramSender<M, C> facade: queue-serialized typed sends over one UDP socket
// ABOUTME: Grounded on original_source/include/asionet/Socket.h's asyncSendTo

use crate::codec::Encode;
use crate::error::{Error, Result};
use crate::queue::OperationQueue;
use crate::transport::datagram::DatagramEndpoint;
use std::marker::PhantomData;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

/// Sends typed datagrams (spec §6). Dispatch is queue-serialized, so
/// completions fire in FIFO order relative to calls.
pub struct DatagramSender<M, C> {
    codec: C,
    max_message_size: usize,
    endpoint: Arc<DatagramEndpoint>,
    queue: OperationQueue,
    _marker: PhantomData<M>,
}

impl<M, C> DatagramSender<M, C>
where
    C: Encode<M> + Clone + Send + Sync + 'static,
    M: Send + 'static,
{
    pub fn new(codec: C, max_message_size: usize) -> Result<Self> {
        Ok(DatagramSender {
            codec,
            max_message_size,
            endpoint: Arc::new(DatagramEndpoint::bind_ephemeral()?),
            queue: OperationQueue::new(),
            _marker: PhantomData,
        })
    }

    #[tracing::instrument(skip(self, message))]
    pub async fn send(&self, message: &M, ip: IpAddr, port: u16, timeout: Duration) -> Result<()> {
        let payload = self.codec.encode(message).map_err(Error::Encoding)?;
        let endpoint = self.endpoint.clone();
        let max_message_size = self.max_message_size;
        let destination = SocketAddr::new(ip, port);

        self.queue
            .dispatch(async move {
                // Only runs once this call has actually started executing
                // (immediately, or after its queued predecessors have
                // finished), so reopening here can never race a concurrent
                // `stop()`'s close into re-opening a send that should abort
                // (spec §7: the façade re-opens its endpoint on next use).
                endpoint.reopen();
                endpoint.send_to(&payload, destination, timeout, max_message_size).await
            })
            .await
    }

    pub fn stop(&self) {
        self.endpoint.close();
        self.queue.cancel_queued();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closeable::Closeable;
    use crate::transport::datagram::DatagramEndpoint as RawEndpoint;

    #[derive(Clone)]
    struct Raw;

    impl Encode<Vec<u8>> for Raw {
        fn encode(&self, message: &Vec<u8>) -> std::result::Result<Vec<u8>, crate::error::UserError> {
            Ok(message.clone())
        }
    }

    #[tokio::test]
    async fn sends_are_delivered_in_dispatch_order() {
        let receiver = RawEndpoint::bind_ephemeral().unwrap();
        let receiver_addr = receiver.local_addr().unwrap();

        let sender: DatagramSender<Vec<u8>, Raw> = DatagramSender::new(Raw, 64).unwrap();
        for i in 0u8..5 {
            sender
                .send(&vec![i], receiver_addr.ip(), receiver_addr.port(), Duration::from_secs(1))
                .await
                .unwrap();
        }

        let mut received = Vec::new();
        for _ in 0..5 {
            let (payload, _from) = receiver.receive_from(Duration::from_secs(1), 64).await.unwrap();
            received.push(payload[0]);
        }
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn stop_closes_the_endpoint() {
        let sender: DatagramSender<Vec<u8>, Raw> = DatagramSender::new(Raw, 64).unwrap();
        assert!(sender.endpoint.is_open());
        sender.stop();
        assert!(!sender.endpoint.is_open());
    }

    #[tokio::test]
    async fn stop_then_send_still_works() {
        let receiver = RawEndpoint::bind_ephemeral().unwrap();
        let receiver_addr = receiver.local_addr().unwrap();

        let sender: DatagramSender<Vec<u8>, Raw> = DatagramSender::new(Raw, 64).unwrap();
        sender.stop();

        // The façade re-opens its endpoint on next use (spec §7).
        sender
            .send(&vec![7], receiver_addr.ip(), receiver_addr.port(), Duration::from_secs(1))
            .await
            .unwrap();

        let (payload, _from) = receiver.receive_from(Duration::from_secs(1), 64).await.unwrap();
        assert_eq!(payload, vec![7]);
    }
}
