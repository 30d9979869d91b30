//! UTF-8 text codec.
//!
//! Default codec for every payload field. Decodes to
//! [`FieldValue::Text`] and refuses bytes that are not valid UTF-8.

use crate::encoding::{FieldCodec, FieldValue};
use crate::error::{FramingError, Result};

/// Codec for fields carrying UTF-8 text.
///
/// Byte blobs are accepted on encode only when their content happens to
/// be valid UTF-8; anything else is an encoder mismatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl FieldCodec for Utf8Codec {
    #[inline]
    fn byte_length(&self, value: &FieldValue) -> usize {
        value.len()
    }

    fn encode(&self, value: &FieldValue, out: &mut Vec<u8>) -> Result<()> {
        match value {
            FieldValue::Text(s) => out.extend_from_slice(s.as_bytes()),
            FieldValue::Bytes(b) => {
                std::str::from_utf8(b).map_err(|e| {
                    FramingError::encoder(format!(
                        "UTF-8 encoder handed a binary blob ({} bytes): {e}",
                        b.len()
                    ))
                })?;
                out.extend_from_slice(b);
            }
        }
        Ok(())
    }

    fn decode(&self, buf: &[u8], start: usize, end: usize) -> Result<FieldValue> {
        let text = std::str::from_utf8(&buf[start..end]).map_err(|e| {
            FramingError::encoder(format!("field bytes are not valid UTF-8: {e}"))
        })?;
        Ok(FieldValue::Text(text.to_owned()))
    }
}
