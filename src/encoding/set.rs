//! Encoder sets - one codec per payload-bearing field.

use crate::encoding::{BinaryCodec, FieldCodec, Utf8Codec};

/// Binds a [`FieldCodec`] to each of the six payload-bearing fields.
///
/// The set is a plain configuration value threaded through every codec
/// call; there is no runtime registry. Custom sets are built by filling
/// the struct directly:
///
/// ```
/// use rsocket_framing::encoding::{BinaryCodec, EncoderSet, Utf8Codec};
///
/// let custom = EncoderSet {
///     data: &BinaryCodec,
///     ..EncoderSet::default()
/// };
/// # let _ = custom;
/// ```
#[derive(Clone, Copy)]
pub struct EncoderSet {
    pub data: &'static dyn FieldCodec,
    pub metadata: &'static dyn FieldCodec,
    pub data_mime_type: &'static dyn FieldCodec,
    pub metadata_mime_type: &'static dyn FieldCodec,
    pub message: &'static dyn FieldCodec,
    pub resume_token: &'static dyn FieldCodec,
}

/// Every field encoded as UTF-8 text. This is the default set.
pub const TEXT_ENCODERS: EncoderSet = EncoderSet {
    data: &Utf8Codec,
    metadata: &Utf8Codec,
    data_mime_type: &Utf8Codec,
    metadata_mime_type: &Utf8Codec,
    message: &Utf8Codec,
    resume_token: &Utf8Codec,
};

/// `data`, `metadata`, and `resume_token` as raw byte blobs; MIME types
/// and the error `message` stay UTF-8.
pub const BINARY_ENCODERS: EncoderSet = EncoderSet {
    data: &BinaryCodec,
    metadata: &BinaryCodec,
    data_mime_type: &Utf8Codec,
    metadata_mime_type: &Utf8Codec,
    message: &Utf8Codec,
    resume_token: &BinaryCodec,
};

impl Default for EncoderSet {
    fn default() -> Self {
        TEXT_ENCODERS
    }
}

impl std::fmt::Debug for EncoderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncoderSet { .. }")
    }
}
