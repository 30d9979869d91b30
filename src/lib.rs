//! # rsocket-framing
//!
//! Binary framing codec for the RSocket 1.0 wire protocol.
//!
//! This crate translates between typed frame values and the exact
//! on-wire byte layout: the 6-byte header, the per-kind frame bodies,
//! the metadata/data payload convention, and the 24-bit length-prefixed
//! framing used over stream transports. It is a pure, synchronous
//! library: no I/O, no scheduling, no retained state between calls.
//! Transports, session state machines, and flow control live elsewhere
//! and talk to this codec through plain parse/emit calls.
//!
//! ## Architecture
//!
//! - **Encoding** ([`encoding`]): pluggable codecs for the six
//!   payload-bearing fields, bundled into an [`EncoderSet`] (UTF-8 text
//!   by default, raw bytes via [`encoding::BinaryCodec`])
//! - **Protocol** ([`protocol`]): wire-format primitives, the [`Frame`]
//!   model, per-variant (de)serialization, and the stream framer
//!
//! ## Example
//!
//! ```
//! use rsocket_framing::encoding::FieldValue;
//! use rsocket_framing::protocol::{flags, Frame, FrameBuffer, PayloadFrame};
//!
//! let frame = Frame::Payload(PayloadFrame {
//!     stream_id: 1,
//!     flags: flags::METADATA | flags::NEXT,
//!     metadata: Some(FieldValue::text("hi")),
//!     data: Some(FieldValue::text("abc")),
//! });
//!
//! // One complete frame, no length prefix.
//! let wire = frame.encode().unwrap();
//! assert_eq!(Frame::decode(&wire).unwrap(), frame);
//!
//! // Length-prefixed stream framing tolerates arbitrary chunking.
//! let mut buffer = FrameBuffer::new();
//! let prefixed = rsocket_framing::protocol::encode_frame_with_length(
//!     &frame,
//!     &rsocket_framing::encoding::TEXT_ENCODERS,
//! )
//! .unwrap();
//! assert!(buffer.push(&prefixed[..4]).unwrap().is_empty());
//! assert_eq!(buffer.push(&prefixed[4..]).unwrap(), vec![frame]);
//! ```

pub mod encoding;
pub mod error;
pub mod protocol;

pub use encoding::{EncoderSet, FieldCodec, FieldValue, BINARY_ENCODERS, TEXT_ENCODERS};
pub use error::{FramingError, Result};
pub use protocol::{Frame, FrameBuffer, FrameHeader, FrameType};
