// ABOUTME: Length-prefixed framing shared by the stream and datagram transports
// ABOUTME: Grounded on the teacher's Frame::check/parse split and Connection::parse_frame

use crate::error::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the big-endian length header (spec §3 "Frame").
pub const HEADER_LEN: usize = 4;

/// Writes one frame (`HEADER_LEN` bytes of big-endian length, then
/// `payload`) to `writer`. Payload lengths over `max_message_size` are
/// rejected before anything is written — exceeding the bound on a stream is
/// `failed_operation`, matching the treatment of any other stream write
/// failure (spec §4.1).
pub async fn write_frame<W>(writer: &mut W, payload: &[u8], max_message_size: usize) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > max_message_size {
        return Err(Error::failed_operation_no_cause());
    }
    let header = (payload.len() as u32).to_be_bytes();
    writer.write_all(&header).await?;
    writer.write_all(payload).await?;
    Ok(())
}

/// Reads one frame from `reader`: exactly `HEADER_LEN` bytes for the length,
/// then exactly that many payload bytes. An `N = 0` header yields an empty
/// payload with no further read. A short read at either phase is
/// `failed_operation` (spec §4.1, §4.7) — on a bytestream there is no such
/// thing as a malformed-but-self-consistent frame, only a connection that
/// closed early.
pub async fn read_frame<R>(reader: &mut R, max_message_size: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;
    let len = u32::from_be_bytes(header) as usize;
    if len > max_message_size {
        return Err(Error::failed_operation_no_cause());
    }
    if len == 0 {
        return Ok(Vec::new());
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Builds one frame (header + payload) as a single contiguous buffer, for
/// a gathered datagram send. Same length check as `write_frame`.
pub fn encode_datagram(payload: &[u8], max_message_size: usize) -> Result<Vec<u8>> {
    if payload.len() > max_message_size {
        return Err(Error::failed_operation_no_cause());
    }
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Extracts the payload from one received datagram's bytes. Unlike stream
/// framing, an internally inconsistent datagram (too short for its own
/// header, or shorter than the length it declares) is `invalid_frame` — the
/// datagram arrived whole at the socket layer, it's just malformed (spec
/// §4.8, Open Question (b)). Truncation *by the socket layer itself* (the
/// buffer was too small) is detected by the caller before this is reached.
pub fn decode_datagram(received: &[u8], max_message_size: usize) -> Result<&[u8]> {
    if received.len() < HEADER_LEN {
        return Err(Error::InvalidFrame);
    }
    let len = u32::from_be_bytes([received[0], received[1], received[2], received[3]]) as usize;
    if len > max_message_size {
        return Err(Error::InvalidFrame);
    }
    if received.len() < HEADER_LEN + len {
        return Err(Error::InvalidFrame);
    }
    Ok(&received[HEADER_LEN..HEADER_LEN + len])
}
