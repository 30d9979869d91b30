//! Raw byte codec - pass-through for binary data.
//!
//! Used for `data`, `metadata`, and `resume_token` when payloads are
//! opaque blobs rather than text. Decoding copies the field bytes into
//! an owned `bytes::Bytes` so the frame outlives the receive buffer.

use bytes::Bytes;

use crate::encoding::{FieldCodec, FieldValue};
use crate::error::Result;

/// Codec that passes bytes through without transformation.
///
/// Text values are accepted on encode and written as their UTF-8 bytes,
/// so a frame built with text fields can still be emitted through a
/// binary-leaning set. Decode always yields [`FieldValue::Bytes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl FieldCodec for BinaryCodec {
    #[inline]
    fn byte_length(&self, value: &FieldValue) -> usize {
        value.len()
    }

    fn encode(&self, value: &FieldValue, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(value.as_slice());
        Ok(())
    }

    fn decode(&self, buf: &[u8], start: usize, end: usize) -> Result<FieldValue> {
        Ok(FieldValue::Bytes(Bytes::copy_from_slice(&buf[start..end])))
    }
}
