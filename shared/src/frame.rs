//! Length-prefixed message framing over a byte stream.
//!
//! Every message on the wire is one frame: a 4-byte big-endian payload
//! length followed by exactly that many payload bytes. The codec enforces
//! no upper bound on the payload size.

use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Prefixes the payload with its length as a 4-byte big-endian integer.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Reads the next frame's payload from the stream.
///
/// Returns `Ok(None)` when the stream ends, whether cleanly between frames
/// or mid-frame; both mean the connection is gone. Other I/O errors
/// propagate to the caller.
pub async fn read_frame<R>(reader: &mut R) -> std::io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut header).await {
        return if e.kind() == ErrorKind::UnexpectedEof {
            Ok(None)
        } else {
            Err(e)
        };
    }

    let len = u32::from_be_bytes(header) as usize;
    let mut payload = vec![0u8; len];
    if let Err(e) = reader.read_exact(&mut payload).await {
        return if e.kind() == ErrorKind::UnexpectedEof {
            Ok(None)
        } else {
            Err(e)
        };
    }

    Ok(Some(payload))
}

/// Writes one encoded frame to the stream.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode(payload)).await
}
