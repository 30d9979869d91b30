//! Encoding module - pluggable codecs for frame payload fields.
//!
//! Six frame fields carry caller-defined bytes: `data`, `metadata`,
//! `data_mime_type`, `metadata_mime_type`, `message`, and `resume_token`.
//! Each is encoded through a [`FieldCodec`], and an [`EncoderSet`] binds
//! one codec to each field:
//!
//! - [`Utf8Codec`] - UTF-8 text (the default for every field)
//! - [`BinaryCodec`] - raw byte blobs (zero-copy via `bytes::Bytes`)
//!
//! The same set must be used to encode and decode a given frame; the wire
//! format carries no record of which set produced it, so a mismatch is
//! not detected.
//!
//! # Example
//!
//! ```
//! use rsocket_framing::encoding::{FieldCodec, FieldValue, BinaryCodec, Utf8Codec};
//!
//! let value = FieldValue::text("hello");
//! let mut out = Vec::new();
//! Utf8Codec.encode(&value, &mut out).unwrap();
//! assert_eq!(out, b"hello");
//! assert_eq!(Utf8Codec.byte_length(&value), 5);
//!
//! let decoded = BinaryCodec.decode(&out, 0, out.len()).unwrap();
//! assert_eq!(decoded, FieldValue::bytes(&b"hello"[..]));
//! ```

mod binary;
mod set;
mod utf8;

pub use binary::BinaryCodec;
pub use set::{EncoderSet, BINARY_ENCODERS, TEXT_ENCODERS};
pub use utf8::Utf8Codec;

use bytes::Bytes;

use crate::error::Result;

/// A frame field value: UTF-8 text or an opaque byte blob.
///
/// Which representation a decode produces is determined by the codec
/// bound to the field, not by the wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// UTF-8 text, produced and consumed by [`Utf8Codec`].
    Text(String),
    /// Raw bytes, produced by [`BinaryCodec`] (zero-copy where possible).
    Bytes(Bytes),
}

impl FieldValue {
    /// Build a text value.
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Build a byte-blob value.
    pub fn bytes(b: impl Into<Bytes>) -> Self {
        FieldValue::Bytes(b.into())
    }

    /// View the value as its underlying bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            FieldValue::Text(s) => s.as_bytes(),
            FieldValue::Bytes(b) => b,
        }
    }

    /// Length of the value in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the value holds zero bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Bytes> for FieldValue {
    fn from(b: Bytes) -> Self {
        FieldValue::Bytes(b)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(b: Vec<u8>) -> Self {
        FieldValue::Bytes(Bytes::from(b))
    }
}

/// Byte-level codec for one frame field.
///
/// Implementations must keep `byte_length` and `encode` consistent:
/// `encode` appends exactly `byte_length(value)` bytes.
pub trait FieldCodec: Send + Sync {
    /// Encoded size of `value` in bytes.
    fn byte_length(&self, value: &FieldValue) -> usize;

    /// Append the encoded bytes of `value` to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::EncoderMismatch`](crate::FramingError::EncoderMismatch)
    /// if the value is not representable by this codec.
    fn encode(&self, value: &FieldValue, out: &mut Vec<u8>) -> Result<()>;

    /// Decode the bytes in `buf[start..end]` into a field value.
    ///
    /// Callers guarantee `start <= end <= buf.len()`.
    fn decode(&self, buf: &[u8], start: usize, end: usize) -> Result<FieldValue>;
}
