// ABOUTME: Length-prefixed send-to/receive-from over a UDP socket, deadline-bound and closable
// ABOUTME: Grounded on original_source/include/asionet/Socket.h and DatagramReceiver.h; socket setup
// ABOUTME: style grounded on HFQR-xitca-web's builder.rs use of socket2 for reuse-address binding

use crate::closeable::{CloseSignal, Closeable};
use crate::deadline::with_deadline;
use crate::error::{Error, Result};
use crate::frame;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

/// One UDP socket, framed and deadline-bound (spec §4.8).
pub struct DatagramEndpoint {
    socket: UdpSocket,
    signal: CloseSignal,
}

impl DatagramEndpoint {
    pub fn from_socket(socket: UdpSocket) -> Self {
        DatagramEndpoint {
            socket,
            signal: CloseSignal::new(),
        }
    }

    /// Opens a socket for an ephemeral local port, used by senders that
    /// don't need a fixed binding.
    pub fn bind_ephemeral() -> Result<Self> {
        let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        Ok(Self::from_socket(UdpSocket::from_std(socket)?))
    }

    /// Opens a socket bound to `port` with address-reuse and broadcast
    /// enabled, as `DatagramReceiver` requires on first use (spec §6).
    pub fn bind_with_reuse_and_broadcast(port: u16) -> Result<Self> {
        let domain = Domain::IPV4;
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.set_broadcast(true)?;
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        socket.bind(&SockAddr::from(addr))?;
        socket.set_nonblocking(true)?;
        let std_socket: std::net::UdpSocket = socket.into();
        Ok(Self::from_socket(UdpSocket::from_std(std_socket)?))
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Wraps `payload` in a frame and submits one gathered send-to. Fewer
    /// bytes transferred than the frame size is `failed_operation`.
    pub async fn send_to(
        &self,
        payload: &[u8],
        destination: SocketAddr,
        timeout: Duration,
        max_message_size: usize,
    ) -> Result<()> {
        let signal = self.signal.clone();
        let racer = signal.clone();
        let socket = &self.socket;
        with_deadline(&signal, timeout, async move {
            tokio::select! {
                biased;
                _ = racer.closed() => Err(Error::Aborted),
                result = async {
                    let datagram = frame::encode_datagram(payload, max_message_size)?;
                    let sent = socket.send_to(&datagram, destination).await?;
                    if sent != datagram.len() {
                        return Err(Error::failed_operation_no_cause());
                    }
                    Ok(())
                } => result,
            }
        })
        .await
    }

    /// Submits one receive-from into a buffer sized `max_message_size + 4`.
    /// A datagram too large for that buffer is a transport-level truncation
    /// (`failed_operation`); a datagram whose own framing is inconsistent
    /// with the bytes received is `invalid_frame` (spec §4.8, Open Question
    /// (b)).
    pub async fn receive_from(
        &self,
        timeout: Duration,
        max_message_size: usize,
    ) -> Result<(Vec<u8>, SocketAddr)> {
        let signal = self.signal.clone();
        let racer = signal.clone();
        let socket = &self.socket;
        with_deadline(&signal, timeout, async move {
            tokio::select! {
                biased;
                _ = racer.closed() => Err(Error::Aborted),
                result = async {
                    let mut buf = vec![0u8; max_message_size + frame::HEADER_LEN];
                    let (n, from) = socket.recv_from(&mut buf).await?;
                    if n == buf.len() {
                        // The OS may have silently truncated a larger datagram.
                        return Err(Error::failed_operation_no_cause());
                    }
                    let payload = frame::decode_datagram(&buf[..n], max_message_size)?;
                    Ok((payload.to_vec(), from))
                } => result,
            }
        })
        .await
    }

    pub fn close(&self) {
        Closeable::close(self)
    }

    pub fn is_open(&self) -> bool {
        Closeable::is_open(self)
    }

    /// Re-opens the endpoint after a close. Used by
    /// [`crate::datagram::receiver::DatagramReceiver`] to reset the shared
    /// socket's signal at the start of each new receive, so an override
    /// that cancelled the previous receive doesn't also poison the next one
    /// (spec §7: the façade re-opens its endpoint on next use).
    pub fn reopen(&self) {
        self.signal.reopen();
    }
}

impl Closeable for DatagramEndpoint {
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
    async fn send_and_receive_round_trip() {
        let receiver = DatagramEndpoint::bind_ephemeral().unwrap();
        let receiver_addr = receiver.local_addr().unwrap();
        let sender = DatagramEndpoint::bind_ephemeral().unwrap();

        sender
            .send_to(b"ping", receiver_addr, Duration::from_secs(1), 64)
            .await
            .unwrap();

        let (payload, _from) = receiver.receive_from(Duration::from_secs(1), 64).await.unwrap();
        assert_eq!(payload, b"ping");
    }

    #[tokio::test]
    async fn receive_aborts_when_nothing_arrives() {
        let receiver = DatagramEndpoint::bind_ephemeral().unwrap();
        let result = receiver.receive_from(Duration::from_millis(20), 64).await;
        assert!(matches!(result, Err(Error::Aborted)));
    }
}
