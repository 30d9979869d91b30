//! Frame model: one struct per frame kind, unified under the [`Frame`]
//! sum type, with typed accessors over the shared header fields.
//!
//! Field values are [`FieldValue`]s so the same model serves both the
//! text and binary encoder sets. Optional fields encode as zero bytes
//! when absent; the METADATA flag (not the field) controls whether a
//! metadata length prefix appears on the wire.
//!
//! # Example
//!
//! ```
//! use rsocket_framing::encoding::FieldValue;
//! use rsocket_framing::protocol::{flags, Frame, PayloadFrame};
//!
//! let frame = Frame::Payload(PayloadFrame {
//!     stream_id: 1,
//!     flags: flags::METADATA | flags::NEXT,
//!     metadata: Some(FieldValue::text("hi")),
//!     data: Some(FieldValue::text("abc")),
//! });
//! assert_eq!(frame.stream_id(), 1);
//! assert!(frame.has_metadata());
//! assert!(frame.is_next());
//! ```

use crate::encoding::FieldValue;

use super::wire_format::{flags, FrameType};

/// Connection handshake. Stream id must be 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupFrame {
    pub stream_id: u32,
    pub flags: u16,
    pub major_version: u16,
    pub minor_version: u16,
    /// Keep-alive interval in milliseconds (at most 2³¹−1).
    pub keep_alive: u32,
    /// Connection lifetime in milliseconds (at most 2³¹−1).
    pub lifetime: u32,
    /// Opaque session token, at most 65535 bytes. Absent emits as a
    /// zero-length token.
    pub resume_token: Option<FieldValue>,
    pub metadata_mime_type: Option<FieldValue>,
    pub data_mime_type: Option<FieldValue>,
    pub metadata: Option<FieldValue>,
    pub data: Option<FieldValue>,
}

/// Capacity grant in lease mode. Stream id must be 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseFrame {
    pub stream_id: u32,
    pub flags: u16,
    /// Validity of the grant in milliseconds.
    pub ttl: u32,
    /// Number of requests the grant allows.
    pub request_count: u32,
    /// Carried as the raw frame remainder, with no length prefix.
    pub metadata: Option<FieldValue>,
}

/// Connection liveness probe. Stream id must be 0. Never carries
/// metadata, whatever the flags say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepaliveFrame {
    pub stream_id: u32,
    pub flags: u16,
    /// Resume position of the sender. Opaque to the codec; carried
    /// faithfully as 64 bits.
    pub last_received_position: u64,
    pub data: Option<FieldValue>,
}

/// Single request expecting a single response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestResponseFrame {
    pub stream_id: u32,
    pub flags: u16,
    pub metadata: Option<FieldValue>,
    pub data: Option<FieldValue>,
}

/// Fire-and-forget request; no response will arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFnfFrame {
    pub stream_id: u32,
    pub flags: u16,
    pub metadata: Option<FieldValue>,
    pub data: Option<FieldValue>,
}

/// Request opening a response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStreamFrame {
    pub stream_id: u32,
    pub flags: u16,
    /// Initial request count; must be positive.
    pub request_n: u32,
    pub metadata: Option<FieldValue>,
    pub data: Option<FieldValue>,
}

/// Request opening a bidirectional channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestChannelFrame {
    pub stream_id: u32,
    pub flags: u16,
    /// Initial request count; must be positive.
    pub request_n: u32,
    pub metadata: Option<FieldValue>,
    pub data: Option<FieldValue>,
}

/// Flow-control credit grant. No payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestNFrame {
    pub stream_id: u32,
    pub flags: u16,
    /// Additional request count; must be positive.
    pub request_n: u32,
}

/// Requester is no longer interested in the stream. Header only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelFrame {
    pub stream_id: u32,
    pub flags: u16,
}

/// Stream payload: next item, completion, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFrame {
    pub stream_id: u32,
    pub flags: u16,
    pub metadata: Option<FieldValue>,
    pub data: Option<FieldValue>,
}

/// Stream or connection error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFrame {
    pub stream_id: u32,
    pub flags: u16,
    /// Error code (at most 2³¹−1); see
    /// [`error_codes`](super::wire_format::error_codes).
    pub code: u32,
    /// Occupies the frame remainder; absent decodes as an empty string.
    pub message: Option<FieldValue>,
}

/// Session resumption request. Stream id must be 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFrame {
    pub stream_id: u32,
    pub flags: u16,
    pub major_version: u16,
    pub minor_version: u16,
    /// Token identifying the session to resume, at most 65535 bytes.
    pub resume_token: Option<FieldValue>,
    pub last_received_server_position: u64,
    pub first_available_client_position: u64,
}

/// Successful resumption handshake. Stream id must be 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeOkFrame {
    pub stream_id: u32,
    pub flags: u16,
    pub last_received_client_position: u64,
}

/// A complete protocol frame, discriminated by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Setup(SetupFrame),
    Lease(LeaseFrame),
    Keepalive(KeepaliveFrame),
    RequestResponse(RequestResponseFrame),
    RequestFnf(RequestFnfFrame),
    RequestStream(RequestStreamFrame),
    RequestChannel(RequestChannelFrame),
    RequestN(RequestNFrame),
    Cancel(CancelFrame),
    Payload(PayloadFrame),
    Error(ErrorFrame),
    Resume(ResumeFrame),
    ResumeOk(ResumeOkFrame),
}

impl Frame {
    /// Wire tag of this frame.
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Setup(_) => FrameType::Setup,
            Frame::Lease(_) => FrameType::Lease,
            Frame::Keepalive(_) => FrameType::Keepalive,
            Frame::RequestResponse(_) => FrameType::RequestResponse,
            Frame::RequestFnf(_) => FrameType::RequestFnf,
            Frame::RequestStream(_) => FrameType::RequestStream,
            Frame::RequestChannel(_) => FrameType::RequestChannel,
            Frame::RequestN(_) => FrameType::RequestN,
            Frame::Cancel(_) => FrameType::Cancel,
            Frame::Payload(_) => FrameType::Payload,
            Frame::Error(_) => FrameType::Error,
            Frame::Resume(_) => FrameType::Resume,
            Frame::ResumeOk(_) => FrameType::ResumeOk,
        }
    }

    /// Stream the frame belongs to (0 = connection level).
    pub fn stream_id(&self) -> u32 {
        match self {
            Frame::Setup(f) => f.stream_id,
            Frame::Lease(f) => f.stream_id,
            Frame::Keepalive(f) => f.stream_id,
            Frame::RequestResponse(f) => f.stream_id,
            Frame::RequestFnf(f) => f.stream_id,
            Frame::RequestStream(f) => f.stream_id,
            Frame::RequestChannel(f) => f.stream_id,
            Frame::RequestN(f) => f.stream_id,
            Frame::Cancel(f) => f.stream_id,
            Frame::Payload(f) => f.stream_id,
            Frame::Error(f) => f.stream_id,
            Frame::Resume(f) => f.stream_id,
            Frame::ResumeOk(f) => f.stream_id,
        }
    }

    /// Flag bits of the frame (10 bits on the wire).
    pub fn flags(&self) -> u16 {
        match self {
            Frame::Setup(f) => f.flags,
            Frame::Lease(f) => f.flags,
            Frame::Keepalive(f) => f.flags,
            Frame::RequestResponse(f) => f.flags,
            Frame::RequestFnf(f) => f.flags,
            Frame::RequestStream(f) => f.flags,
            Frame::RequestChannel(f) => f.flags,
            Frame::RequestN(f) => f.flags,
            Frame::Cancel(f) => f.flags,
            Frame::Payload(f) => f.flags,
            Frame::Error(f) => f.flags,
            Frame::Resume(f) => f.flags,
            Frame::ResumeOk(f) => f.flags,
        }
    }

    /// Check if the METADATA flag is set.
    #[inline]
    pub fn has_metadata(&self) -> bool {
        flags::has_flag(self.flags(), flags::METADATA)
    }

    /// Check if the IGNORE flag is set.
    #[inline]
    pub fn is_ignore(&self) -> bool {
        flags::has_flag(self.flags(), flags::IGNORE)
    }

    /// Check if the COMPLETE flag is set.
    #[inline]
    pub fn is_complete(&self) -> bool {
        flags::has_flag(self.flags(), flags::COMPLETE)
    }

    /// Check if the NEXT flag is set.
    #[inline]
    pub fn is_next(&self) -> bool {
        flags::has_flag(self.flags(), flags::NEXT)
    }

    /// Check if the FOLLOWS flag is set.
    #[inline]
    pub fn is_follows(&self) -> bool {
        flags::has_flag(self.flags(), flags::FOLLOWS)
    }

    /// Check if this is a connection-level frame (stream id 0 expected).
    #[inline]
    pub fn is_connection_level(&self) -> bool {
        self.frame_type().is_connection_level()
    }
}
