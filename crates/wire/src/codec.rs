// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The self-describing binary codec (§4.2, §6) and its length-delimited
//! framing.
//!
//! Every frame on the wire is a 4-byte big-endian length prefix followed by
//! that many bytes of `rmp-serde` encoded [`Message`]. The prefix is the
//! same shape the daemon's unix-socket protocol already used for its JSON
//! payloads; only the payload encoding changed.

use crate::message::Message;
use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Frames larger than this are rejected before allocation, so a corrupt or
/// hostile peer can't make us allocate an unbounded buffer from a forged
/// length prefix.
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("message exceeds max frame length ({0} > {MAX_FRAME_LEN})")]
    FrameTooLarge(u32),
    #[error("connection closed mid-frame")]
    Eof,
    #[error("encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encodes a `Message` into a length-prefixed frame.
pub trait Codec: Send + Sync {
    fn encode(&self, message: &Message) -> Result<BytesMut, CodecError>;
    fn decode(&self, frame: &[u8]) -> Result<Message, CodecError>;
}

/// The `rmp-serde` (MessagePack) implementation used on the wire.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryCodec;

impl Codec for BinaryCodec {
    fn encode(&self, message: &Message) -> Result<BytesMut, CodecError> {
        let payload = rmp_serde::to_vec_named(message)?;
        if payload.len() as u64 > MAX_FRAME_LEN as u64 {
            return Err(CodecError::FrameTooLarge(payload.len() as u32));
        }
        let mut framed = BytesMut::with_capacity(4 + payload.len());
        framed.put_u32(payload.len() as u32);
        framed.extend_from_slice(&payload);
        Ok(framed)
    }

    fn decode(&self, frame: &[u8]) -> Result<Message, CodecError> {
        Ok(rmp_serde::from_slice(frame)?)
    }
}

/// Writes one length-prefixed frame to `writer`.
pub async fn write_message<W, C>(writer: &mut W, codec: &C, message: &Message) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
    C: Codec,
{
    let framed = codec.encode(message)?;
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one length-prefixed frame from `reader` and decodes it.
///
/// Returns `Err(CodecError::Eof)` if the peer closes before a full length
/// prefix arrives; a partial payload after a valid length prefix surfaces as
/// `CodecError::Io` from the underlying `read_exact`.
pub async fn read_message<R, C>(reader: &mut R, codec: &C) -> Result<Message, CodecError>
where
    R: AsyncRead + Unpin,
    C: Codec,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(CodecError::Eof),
        Err(e) => return Err(CodecError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    codec.decode(&payload)
}

/// Attempts to split one frame off the front of `buf`, for callers that
/// accumulate bytes from a stream themselves (e.g. a transport adapter
/// driven by its own read loop rather than by `read_message`).
///
/// Returns `Ok(None)` when `buf` doesn't yet hold a complete frame.
pub fn try_decode_frame<C: Codec>(buf: &mut BytesMut, codec: &C) -> Result<Option<Message>, CodecError> {
    if buf.len() < 4 {
        return Ok(None);
    }
    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if len > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge(len));
    }
    let total = 4 + len as usize;
    if buf.len() < total {
        return Ok(None);
    }
    buf.advance(4);
    let payload = buf.split_to(len as usize);
    Ok(Some(codec.decode(&payload)?))
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
