//! Length-prefixed stream framing.
//!
//! Stream transports deliver an undelimited byte sequence, so every
//! frame travels behind a 24-bit big-endian length prefix. This module
//! provides the pure framing functions ([`encode_frame_with_length`],
//! [`decode_frame_with_length`], [`decode_frames`]) and a stateful
//! [`FrameBuffer`] that accumulates partial reads across pushes.
//!
//! Truncation is never an error here: a partial frame is
//! indistinguishable from bytes that have not arrived yet, and stays in
//! the leftover/tail until more data is fed.
//!
//! # Example
//!
//! ```
//! use rsocket_framing::protocol::{decode_frames, encode_frame_with_length, CancelFrame, Frame};
//! use rsocket_framing::encoding::TEXT_ENCODERS;
//!
//! let frame = Frame::Cancel(CancelFrame { stream_id: 7, flags: 0 });
//! let wire = encode_frame_with_length(&frame, &TEXT_ENCODERS).unwrap();
//!
//! let (frames, leftover) = decode_frames(&wire, &TEXT_ENCODERS).unwrap();
//! assert_eq!(frames, vec![frame]);
//! assert!(leftover.is_empty());
//! ```

use bytes::BytesMut;

use crate::encoding::{EncoderSet, TEXT_ENCODERS};
use crate::error::{FramingError, Result};

use super::frame::Frame;
use super::frame_codec::{decode_frame, encode_frame};
use super::wire_format::{put_u24, read_u24, MAX_FRAME_LENGTH, UINT24_SIZE};

/// Serialize a frame behind a 24-bit big-endian length prefix.
pub fn encode_frame_with_length(frame: &Frame, encoders: &EncoderSet) -> Result<Vec<u8>> {
    let body = encode_frame(frame, encoders)?;
    if body.len() > MAX_FRAME_LENGTH {
        return Err(FramingError::invariant(format!(
            "frame of {} bytes exceeds the 24-bit length prefix",
            body.len()
        )));
    }
    let mut out = Vec::with_capacity(UINT24_SIZE + body.len());
    put_u24(&mut out, body.len() as u32);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Parse a single length-prefixed frame from the start of `buf`.
pub fn decode_frame_with_length(buf: &[u8], encoders: &EncoderSet) -> Result<Frame> {
    if buf.len() < UINT24_SIZE {
        return Err(FramingError::invariant(format!(
            "buffer of {} bytes is shorter than the length prefix",
            buf.len()
        )));
    }
    let frame_len = read_u24(buf, 0) as usize;
    if buf.len() < UINT24_SIZE + frame_len {
        return Err(FramingError::invariant(format!(
            "declared frame length {frame_len} exceeds the {} buffered bytes",
            buf.len() - UINT24_SIZE
        )));
    }
    decode_frame(&buf[UINT24_SIZE..UINT24_SIZE + frame_len], encoders)
}

/// Peel every complete length-prefixed frame off the front of `buf`.
///
/// Returns the parsed frames and the unparsed tail: a prefix that is
/// too short for the length header, or a frame whose declared length
/// does not fit yet. The caller prepends the tail to the next read.
pub fn decode_frames<'a>(
    buf: &'a [u8],
    encoders: &EncoderSet,
) -> Result<(Vec<Frame>, &'a [u8])> {
    let mut frames = Vec::new();
    let mut offset = 0;
    while buf.len() - offset >= UINT24_SIZE {
        let frame_len = read_u24(buf, offset) as usize;
        if offset + UINT24_SIZE + frame_len > buf.len() {
            break;
        }
        let start = offset + UINT24_SIZE;
        frames.push(decode_frame(&buf[start..start + frame_len], encoders)?);
        offset = start + frame_len;
    }
    Ok((frames, &buf[offset..]))
}

/// Buffer accumulating incoming bytes and extracting complete frames.
///
/// Feeds of arbitrary chunking are fine: a frame may arrive across many
/// pushes, and one push may carry many frames plus a partial tail. The
/// tail is retained internally between pushes.
pub struct FrameBuffer {
    /// Accumulated bytes from transport reads.
    buffer: BytesMut,
    /// Encoder set applied to every extracted frame.
    encoders: EncoderSet,
    /// Largest declared frame length accepted before failing the
    /// connection.
    max_frame_len: usize,
}

impl FrameBuffer {
    /// Create a frame buffer with the default (text) encoder set.
    pub fn new() -> Self {
        Self::with_encoders(TEXT_ENCODERS)
    }

    /// Create a frame buffer decoding through `encoders`.
    pub fn with_encoders(encoders: EncoderSet) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            encoders,
            max_frame_len: MAX_FRAME_LENGTH,
        }
    }

    /// Cap the declared frame length this buffer will accept.
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            max_frame_len,
            ..Self::new()
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// # Errors
    ///
    /// Fails when a declared length exceeds the configured maximum or a
    /// complete frame fails to parse; the connection should be closed.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        if self.buffer.len() < UINT24_SIZE {
            return Ok(None);
        }
        let frame_len = read_u24(&self.buffer, 0) as usize;
        if frame_len > self.max_frame_len {
            return Err(FramingError::invariant(format!(
                "declared frame length {frame_len} exceeds maximum {}",
                self.max_frame_len
            )));
        }
        if self.buffer.len() < UINT24_SIZE + frame_len {
            return Ok(None);
        }
        let _ = self.buffer.split_to(UINT24_SIZE);
        let body = self.buffer.split_to(frame_len);
        decode_frame(&body, &self.encoders).map(Some)
    }

    /// Number of buffered (unparsed) bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
