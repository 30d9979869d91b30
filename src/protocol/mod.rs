//! Protocol module - wire format, frame model, codec, and framing.
//!
//! This module implements the binary protocol surface:
//! - 6-byte header and wire-format primitives
//! - Frame model with one variant per frame kind
//! - Per-variant frame (de)serialization
//! - Length-prefixed stream framing over accumulated reads

mod frame;
mod frame_buffer;
mod frame_codec;
mod wire_format;

pub use frame::{
    CancelFrame, ErrorFrame, Frame, KeepaliveFrame, LeaseFrame, PayloadFrame, RequestChannelFrame,
    RequestFnfFrame, RequestNFrame, RequestResponseFrame, RequestStreamFrame, ResumeFrame,
    ResumeOkFrame, SetupFrame,
};
pub use frame_buffer::{
    decode_frame_with_length, decode_frames, encode_frame_with_length, FrameBuffer,
};
pub use frame_codec::{decode_frame, encode_frame};
pub use wire_format::{
    error_codes, flags, read_u24, write_u24, FrameHeader, FrameType, CONNECTION_STREAM_ID,
    FLAGS_MASK, FRAME_HEADER_SIZE, FRAME_TYPE_OFFSET, MAX_CODE, MAX_FRAME_LENGTH, MAX_KEEPALIVE,
    MAX_LIFETIME, MAX_RESUME_LENGTH, MAX_STREAM_ID, UINT24_SIZE,
};
