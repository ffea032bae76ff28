//! Length-prefixed bincode framing.
//!
//! Each frame is a big-endian `u32` payload length followed by the bincode
//! encoding of one message.

use crate::error::{Result, TransportError};
use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted payload (16 MiB).
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Encodes `message` into a complete frame.
pub fn encode<T: Serialize>(message: &T) -> Result<Bytes> {
    let payload = bincode::serialize(message)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(payload.len()));
    }
    let mut frame = BytesMut::with_capacity(4 + payload.len());
    frame.put_u32(payload.len() as u32);
    frame.put_slice(&payload);
    Ok(frame.freeze())
}

pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame. Returns `None` on a clean end of stream between frames.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if len > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(bincode::deserialize(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Request;
    use corelib::{Identity, Operation};

    #[tokio::test]
    async fn test_frame_through_pipe() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let request = Request {
            id: 7,
            target: Identity::root(),
            operation: Operation::Write(vec!["line".to_string()]),
            oneway: false,
        };

        write_frame(&mut client, &request).await.unwrap();
        drop(client);

        let decoded: Option<Request> = read_frame(&mut server).await.unwrap();
        assert_eq!(decoded, Some(request));
        let eof: Option<Request> = read_frame(&mut server).await.unwrap();
        assert_eq!(eof, None);
    }

    #[tokio::test]
    async fn test_oversized_length_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_u32(MAX_FRAME_LEN as u32 + 1).await.unwrap();

        let result: Result<Option<Request>> = read_frame(&mut server).await;
        assert!(matches!(result, Err(TransportError::FrameTooLarge(_))));
    }

    #[test]
    fn test_encode_prefixes_length() {
        let frame = encode(&Identity::root()).unwrap();
        let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(len, frame.len() - 4);
    }
}
