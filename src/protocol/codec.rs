//! Length-prefixed framing for [`Request`] and [`Reply`] messages.
//!
//! Every frame on the wire is `[u32 big-endian length][bincode payload]`.
//! Reads and writes are driven to completion (`read_exact`/`write_all`):
//! partial reads are always fully drained and short writes are always
//! fully flushed before a codec function returns.

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::frame::{Reply, Request};
use crate::error::{Error, Result};

/// Maximum accepted frame payload size. Frames larger than this are
/// rejected with `ProtocolViolation` instead of being read into memory.
pub const MAX_FRAME_SIZE: u32 = 32 * 1024 * 1024;

async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = bincode::serialize(message)?;
    let len = u32::try_from(payload.len()).map_err(|_| Error::ProtocolViolation {
        message: format!("frame of {} bytes exceeds u32 length prefix", payload.len()),
    })?;
    if len > MAX_FRAME_SIZE {
        return Err(Error::ProtocolViolation {
            message: format!("frame of {len} bytes exceeds cap of {MAX_FRAME_SIZE}"),
        });
    }

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads into `buf` until full or the stream is exhausted, returning the
/// number of bytes actually filled (short of `buf.len()` on EOF).
async fn read_as_much_as_possible<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

async fn read_frame<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_bytes = [0u8; 4];
    let filled = read_as_much_as_possible(reader, &mut len_bytes).await?;
    if filled == 0 {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    if filled < len_bytes.len() {
        return Err(Error::ProtocolViolation {
            message: format!(
                "truncated length prefix: got {filled} of {} bytes",
                len_bytes.len()
            ),
        });
    }
    let len = u32::from_be_bytes(len_bytes);

    if len > MAX_FRAME_SIZE {
        return Err(Error::ProtocolViolation {
            message: format!("frame of {len} bytes exceeds cap of {MAX_FRAME_SIZE}"),
        });
    }

    let mut payload = vec![0u8; len as usize];
    let filled = read_as_much_as_possible(reader, &mut payload).await?;
    if filled < payload.len() {
        return Err(Error::ProtocolViolation {
            message: format!("truncated frame: got {filled} of {len} payload bytes"),
        });
    }
    Ok(bincode::deserialize(&payload)?)
}

/// Reads one [`Request`] frame, fully draining the length-prefixed payload.
pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Request> {
    read_frame(reader).await
}

/// Writes one [`Request`] frame, fully flushing before returning.
pub async fn write_request<W: AsyncWrite + Unpin>(writer: &mut W, request: &Request) -> Result<()> {
    write_frame(writer, request).await
}

/// Reads one [`Reply`] frame, fully draining the length-prefixed payload.
pub async fn read_reply<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Reply> {
    read_frame(reader).await
}

/// Writes one [`Reply`] frame, fully flushing before returning.
pub async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, reply: &Reply) -> Result<()> {
    write_frame(writer, reply).await
}
