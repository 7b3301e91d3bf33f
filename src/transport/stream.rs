// ABOUTME: Length-prefixed write/read over a TCP connection, deadline-bound and closable
// ABOUTME: Grounded on the teacher's Connection::read_frame/parse_frame and Connection::write_frame

use crate::closeable::{CloseSignal, Closeable};
use crate::deadline::with_deadline;
use crate::error::{Error, Result};
use crate::frame;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

/// One TCP connection, framed and deadline-bound (spec §4.7). Each
/// `write_frame`/`read_frame` call races the underlying I/O against this
/// connection's close signal so either a timeout or an explicit `close()`
/// aborts it uniformly.
pub struct Connection {
    stream: TcpStream,
    signal: CloseSignal,
}

impl Connection {
    pub fn from_stream(stream: TcpStream) -> Self {
        Connection {
            stream,
            signal: CloseSignal::new(),
        }
    }

    #[tracing::instrument(skip(timeout))]
    pub async fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self> {
        let signal = CloseSignal::new();
        let racer = signal.clone();
        let stream = with_deadline(&signal, timeout, async move {
            tokio::select! {
                biased;
                _ = racer.closed() => Err(Error::Aborted),
                result = TcpStream::connect(addr) => result.map_err(Error::failed_operation),
            }
        })
        .await?;
        Ok(Connection { stream, signal })
    }

    pub fn peer_addr(&self) -> std::io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Build the frame header and submit a gathered write of `[header,
    /// bytes]`. Fewer bytes transferred than the frame requires is
    /// `failed_operation`; timeout/close is `aborted` (spec §4.7).
    pub async fn write_frame(&mut self, payload: &[u8], timeout: Duration, max_message_size: usize) -> Result<()> {
        let signal = self.signal.clone();
        let racer = signal.clone();
        let stream = &mut self.stream;
        with_deadline(&signal, timeout, async move {
            tokio::select! {
                biased;
                _ = racer.closed() => Err(Error::Aborted),
                result = frame::write_frame(stream, payload, max_message_size) => result,
            }
        })
        .await
    }

    /// Two-phase exact-length read: 4 header bytes, then exactly the N
    /// payload bytes the header declares, so a partial first phase never
    /// consumes bytes belonging to the next frame (spec §4.7).
    pub async fn read_frame(&mut self, timeout: Duration, max_message_size: usize) -> Result<Vec<u8>> {
        let signal = self.signal.clone();
        let racer = signal.clone();
        let stream = &mut self.stream;
        with_deadline(&signal, timeout, async move {
            tokio::select! {
                biased;
                _ = racer.closed() => Err(Error::Aborted),
                result = frame::read_frame(stream, max_message_size) => result,
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
}

impl Closeable for Connection {
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
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn writes_and_reads_a_frame_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut conn = Connection::from_stream(stream);
            conn.read_frame(Duration::from_secs(1), 1024).await.unwrap()
        });

        let mut client = Connection::connect(addr, Duration::from_secs(1)).await.unwrap();
        client
            .write_frame(b"hello", Duration::from_secs(1), 1024)
            .await
            .unwrap();

        let received = server.await.unwrap();
        assert_eq!(received, b"hello");
    }

    #[tokio::test]
    async fn read_aborts_when_deadline_elapses_before_any_data_arrives() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut conn = Connection::from_stream(stream);
            conn.read_frame(Duration::from_millis(30), 1024).await
        });

        let _client = Connection::connect(addr, Duration::from_secs(1)).await.unwrap();
        // Client never writes; the server's read must time out.
        let result = server.await.unwrap();
        assert!(matches!(result, Err(Error::Aborted)));
    }

    #[tokio::test]
    async fn truncated_frame_is_failed_operation() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut conn = Connection::from_stream(stream);
            conn.read_frame(Duration::from_secs(1), 1024).await
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(&10u32.to_be_bytes()).await.unwrap();
        client.write_all(b"short").await.unwrap();
        client.shutdown().await.unwrap();

        let result = server.await.unwrap();
        assert!(matches!(result, Err(Error::FailedOperation { .. })));
    }
}
