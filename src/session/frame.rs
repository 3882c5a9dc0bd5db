//! Frame envelope
//!
//! Encoding and decoding of the correlation envelope around each wire
//! document.
//!
//! ## Envelope Format
//! ```text
//! ┌────────────────┬──────────┬─────────────────────────────┐
//! │ Correlation (8)│ Len (4)  │       XML Payload           │
//! └────────────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! The correlation id is echoed by the server, which is what lets many
//! commands share one connection with responses arriving in any order.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{OciError, Result};

/// Header size: 8 byte correlation id + 4 bytes payload length
pub const FRAME_HEADER_SIZE: usize = 12;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// A correlation-tagged frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Monotonic per-session request identifier, echoed in the response
    pub correlation_id: u64,

    /// Serialized wire document
    pub payload: Bytes,
}

impl Frame {
    /// Build a frame around a payload
    pub fn new(correlation_id: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            correlation_id,
            payload: payload.into(),
        }
    }
}

/// Encode a frame to bytes
pub fn encode_frame(frame: &Frame) -> Result<Bytes> {
    if frame.payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(OciError::Frame(format!(
            "payload too large: {} bytes (max {})",
            frame.payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + frame.payload.len());
    buf.put_u64(frame.correlation_id);
    buf.put_u32(frame.payload.len() as u32);
    buf.put_slice(&frame.payload);

    Ok(buf.freeze())
}

/// Decode a frame from bytes
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < FRAME_HEADER_SIZE {
        return Err(OciError::Frame(format!(
            "incomplete header: expected {} bytes, got {}",
            FRAME_HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut cursor = bytes;
    let correlation_id = cursor.get_u64();
    let payload_len = cursor.get_u32() as usize;

    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(OciError::Frame(format!(
            "payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    if bytes.len() != FRAME_HEADER_SIZE + payload_len {
        return Err(OciError::Frame(format!(
            "length mismatch: header declares {} payload bytes, frame has {}",
            payload_len,
            bytes.len() - FRAME_HEADER_SIZE
        )));
    }

    Ok(Frame {
        correlation_id,
        payload: Bytes::copy_from_slice(cursor),
    })
}
