//! Per-variant frame serialization and deserialization.
//!
//! [`encode_frame`] turns a [`Frame`] into its exact wire image (header
//! plus variant body, no length prefix); [`decode_frame`] is the inverse
//! over a single complete frame. Both dispatch on the frame tag and
//! thread an [`EncoderSet`] through every payload-bearing field.
//!
//! Invariants (stream id ranges, positive request counts, field bounds)
//! are enforced on both paths; a violation never yields a partial frame.

use crate::encoding::{EncoderSet, FieldValue, TEXT_ENCODERS};
use crate::error::{FramingError, Result};

use super::frame::{
    CancelFrame, ErrorFrame, Frame, KeepaliveFrame, LeaseFrame, PayloadFrame, RequestChannelFrame,
    RequestFnfFrame, RequestNFrame, RequestResponseFrame, RequestStreamFrame, ResumeFrame,
    ResumeOkFrame, SetupFrame,
};
use super::wire_format::{
    flags, put_u24, read_u24, FrameHeader, FrameType, CONNECTION_STREAM_ID, FRAME_HEADER_SIZE,
    MAX_CODE, MAX_FRAME_LENGTH, MAX_KEEPALIVE, MAX_LIFETIME, MAX_RESUME_LENGTH, MAX_STREAM_ID,
    UINT24_SIZE,
};

/// Fixed SETUP body bytes before the resume token: versions, keep-alive,
/// lifetime, token length.
const SETUP_FIXED_SIZE: usize = 14;
/// Fixed RESUME body bytes before the token: versions, token length.
const RESUME_FIXED_SIZE: usize = 6;
const ERROR_FIXED_SIZE: usize = 4;
const KEEPALIVE_FIXED_SIZE: usize = 8;
const LEASE_FIXED_SIZE: usize = 8;
const REQUEST_N_SIZE: usize = 4;
const RESUME_POSITIONS_SIZE: usize = 16;
const RESUME_OK_FIXED_SIZE: usize = 8;
const MIME_LENGTH_SIZE: usize = 1;
const MAX_MIME_LENGTH: usize = 255;

impl Frame {
    /// Encode with the default (text) encoder set.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_frame(self, &TEXT_ENCODERS)
    }

    /// Encode with an explicit encoder set.
    pub fn encode_with(&self, encoders: &EncoderSet) -> Result<Vec<u8>> {
        encode_frame(self, encoders)
    }

    /// Decode a single complete frame with the default (text) set.
    pub fn decode(buf: &[u8]) -> Result<Frame> {
        decode_frame(buf, &TEXT_ENCODERS)
    }

    /// Decode a single complete frame with an explicit encoder set.
    pub fn decode_with(buf: &[u8], encoders: &EncoderSet) -> Result<Frame> {
        decode_frame(buf, encoders)
    }
}

/// Serialize a frame into its wire image, without a length prefix.
pub fn encode_frame(frame: &Frame, encoders: &EncoderSet) -> Result<Vec<u8>> {
    match frame {
        Frame::Setup(f) => encode_setup(f, encoders),
        Frame::Lease(f) => encode_lease(f, encoders),
        Frame::Keepalive(f) => encode_keepalive(f, encoders),
        Frame::RequestResponse(f) => {
            encode_payload_only(FrameType::RequestResponse, f.stream_id, f.flags, &f.metadata, &f.data, encoders)
        }
        Frame::RequestFnf(f) => {
            encode_payload_only(FrameType::RequestFnf, f.stream_id, f.flags, &f.metadata, &f.data, encoders)
        }
        Frame::RequestStream(f) => encode_with_request_n(
            FrameType::RequestStream, f.stream_id, f.flags, f.request_n, &f.metadata, &f.data, encoders,
        ),
        Frame::RequestChannel(f) => encode_with_request_n(
            FrameType::RequestChannel, f.stream_id, f.flags, f.request_n, &f.metadata, &f.data, encoders,
        ),
        Frame::RequestN(f) => encode_request_n(f),
        Frame::Cancel(f) => encode_cancel(f),
        Frame::Payload(f) => {
            encode_payload_only(FrameType::Payload, f.stream_id, f.flags, &f.metadata, &f.data, encoders)
        }
        Frame::Error(f) => encode_error(f, encoders),
        Frame::Resume(f) => encode_resume(f, encoders),
        Frame::ResumeOk(f) => encode_resume_ok(f),
    }
}

/// Parse a single complete frame (length prefix already stripped).
///
/// The caller is contractually required to pass exactly one frame;
/// short input fails closed with an invariant violation.
pub fn decode_frame(buf: &[u8], encoders: &EncoderSet) -> Result<Frame> {
    let header = FrameHeader::decode(buf)?;
    let body = &buf[FRAME_HEADER_SIZE..];
    match header.frame_type {
        FrameType::Setup => decode_setup(&header, body, encoders),
        FrameType::Lease => decode_lease(&header, body, encoders),
        FrameType::Keepalive => decode_keepalive(&header, body, encoders),
        FrameType::RequestResponse => {
            check_stream_scoped(&header)?;
            let (metadata, data) = read_payload(body, 0, &header, encoders)?;
            Ok(Frame::RequestResponse(RequestResponseFrame {
                stream_id: header.stream_id,
                flags: header.flags,
                metadata,
                data,
            }))
        }
        FrameType::RequestFnf => {
            check_stream_scoped(&header)?;
            let (metadata, data) = read_payload(body, 0, &header, encoders)?;
            Ok(Frame::RequestFnf(RequestFnfFrame {
                stream_id: header.stream_id,
                flags: header.flags,
                metadata,
                data,
            }))
        }
        FrameType::RequestStream => {
            let (request_n, metadata, data) = decode_request_n_payload(&header, body, encoders)?;
            Ok(Frame::RequestStream(RequestStreamFrame {
                stream_id: header.stream_id,
                flags: header.flags,
                request_n,
                metadata,
                data,
            }))
        }
        FrameType::RequestChannel => {
            let (request_n, metadata, data) = decode_request_n_payload(&header, body, encoders)?;
            Ok(Frame::RequestChannel(RequestChannelFrame {
                stream_id: header.stream_id,
                flags: header.flags,
                request_n,
                metadata,
                data,
            }))
        }
        FrameType::RequestN => decode_request_n(&header, body),
        FrameType::Cancel => {
            check_stream_scoped(&header)?;
            Ok(Frame::Cancel(CancelFrame {
                stream_id: header.stream_id,
                flags: header.flags,
            }))
        }
        FrameType::Payload => {
            check_stream_scoped(&header)?;
            let (metadata, data) = read_payload(body, 0, &header, encoders)?;
            Ok(Frame::Payload(PayloadFrame {
                stream_id: header.stream_id,
                flags: header.flags,
                metadata,
                data,
            }))
        }
        FrameType::Error => decode_error(&header, body, encoders),
        FrameType::Resume => decode_resume(&header, body, encoders),
        FrameType::ResumeOk => decode_resume_ok(&header, body),
    }
}

// ---------------------------------------------------------------------
// Shared validation
// ---------------------------------------------------------------------

fn check_connection_stream(stream_id: u32, frame_type: FrameType) -> Result<()> {
    if stream_id != CONNECTION_STREAM_ID {
        return Err(FramingError::invariant(format!(
            "{} frame stream id must be 0, got {stream_id}",
            frame_type.name()
        )));
    }
    Ok(())
}

fn check_stream_scoped(header: &FrameHeader) -> Result<()> {
    check_stream_scoped_id(header.stream_id, header.frame_type)
}

fn check_stream_scoped_id(stream_id: u32, frame_type: FrameType) -> Result<()> {
    if stream_id == 0 {
        return Err(FramingError::invariant(format!(
            "{} frame stream id must be positive, got 0",
            frame_type.name()
        )));
    }
    if stream_id > MAX_STREAM_ID {
        return Err(FramingError::invariant(format!(
            "{} frame stream id exceeds 31 bits: {stream_id:#x}",
            frame_type.name()
        )));
    }
    Ok(())
}

fn check_request_n(request_n: u32, frame_type: FrameType) -> Result<()> {
    if request_n == 0 || request_n > i32::MAX as u32 {
        return Err(FramingError::invariant(format!(
            "{} frame request n must be a positive int32, got {request_n}",
            frame_type.name()
        )));
    }
    Ok(())
}

fn ensure_len(body: &[u8], needed: usize, frame_type: FrameType, what: &str) -> Result<()> {
    if body.len() < needed {
        return Err(FramingError::invariant(format!(
            "{} frame truncated: {what} needs {needed} bytes, body has {}",
            frame_type.name(),
            body.len()
        )));
    }
    Ok(())
}

fn field_len(value: Option<&FieldValue>, codec: &dyn crate::encoding::FieldCodec) -> usize {
    value.map_or(0, |v| codec.byte_length(v))
}

// ---------------------------------------------------------------------
// Fixed-width reads (bounds checked by callers)
// ---------------------------------------------------------------------

#[inline]
fn get_u16(b: &[u8], o: usize) -> u16 {
    u16::from_be_bytes([b[o], b[o + 1]])
}

#[inline]
fn get_i32(b: &[u8], o: usize) -> i32 {
    i32::from_be_bytes([b[o], b[o + 1], b[o + 2], b[o + 3]])
}

#[inline]
fn get_u32(b: &[u8], o: usize) -> u32 {
    u32::from_be_bytes([b[o], b[o + 1], b[o + 2], b[o + 3]])
}

#[inline]
fn get_u64(b: &[u8], o: usize) -> u64 {
    u64::from_be_bytes([
        b[o],
        b[o + 1],
        b[o + 2],
        b[o + 3],
        b[o + 4],
        b[o + 5],
        b[o + 6],
        b[o + 7],
    ])
}

// ---------------------------------------------------------------------
// Payload section (metadata + data) shared by SETUP, REQUEST_*, PAYLOAD
// ---------------------------------------------------------------------

/// Encoded payload size: data bytes, plus a u24 prefix and the metadata
/// bytes when the METADATA flag is set. A clear flag drops the metadata
/// field silently.
fn payload_len(
    frame_flags: u16,
    metadata: Option<&FieldValue>,
    data: Option<&FieldValue>,
    encoders: &EncoderSet,
) -> usize {
    let mut len = field_len(data, encoders.data);
    if flags::has_flag(frame_flags, flags::METADATA) {
        len += UINT24_SIZE + field_len(metadata, encoders.metadata);
    }
    len
}

fn write_payload(
    out: &mut Vec<u8>,
    frame_flags: u16,
    metadata: Option<&FieldValue>,
    data: Option<&FieldValue>,
    encoders: &EncoderSet,
) -> Result<()> {
    if flags::has_flag(frame_flags, flags::METADATA) {
        let metadata_len = field_len(metadata, encoders.metadata);
        if metadata_len > MAX_FRAME_LENGTH {
            return Err(FramingError::invariant(format!(
                "metadata of {metadata_len} bytes exceeds the 24-bit length prefix"
            )));
        }
        put_u24(out, metadata_len as u32);
        if let Some(m) = metadata {
            encoders.metadata.encode(m, out)?;
        }
    }
    if let Some(d) = data {
        encoders.data.encode(d, out)?;
    }
    Ok(())
}

/// Read the payload section starting at `offset` of `body`. Data is the
/// remainder after the optional metadata block; zero-length fields
/// decode as absent.
fn read_payload(
    body: &[u8],
    mut offset: usize,
    header: &FrameHeader,
    encoders: &EncoderSet,
) -> Result<(Option<FieldValue>, Option<FieldValue>)> {
    let mut metadata = None;
    if flags::has_flag(header.flags, flags::METADATA) {
        ensure_len(body, offset + UINT24_SIZE, header.frame_type, "metadata length prefix")?;
        let metadata_len = read_u24(body, offset) as usize;
        offset += UINT24_SIZE;
        ensure_len(body, offset + metadata_len, header.frame_type, "metadata block")?;
        if metadata_len > 0 {
            metadata = Some(encoders.metadata.decode(body, offset, offset + metadata_len)?);
        }
        offset += metadata_len;
    }
    let data = if offset < body.len() {
        Some(encoders.data.decode(body, offset, body.len())?)
    } else {
        None
    };
    Ok((metadata, data))
}

// ---------------------------------------------------------------------
// SETUP
// ---------------------------------------------------------------------

fn encode_setup(f: &SetupFrame, encoders: &EncoderSet) -> Result<Vec<u8>> {
    check_connection_stream(f.stream_id, FrameType::Setup)?;
    if f.keep_alive > MAX_KEEPALIVE {
        return Err(FramingError::invariant(format!(
            "SETUP keep-alive out of range: {}",
            f.keep_alive
        )));
    }
    if f.lifetime > MAX_LIFETIME {
        return Err(FramingError::invariant(format!(
            "SETUP lifetime out of range: {}",
            f.lifetime
        )));
    }
    let token_len = field_len(f.resume_token.as_ref(), encoders.resume_token);
    if token_len > MAX_RESUME_LENGTH {
        return Err(FramingError::invariant(format!(
            "SETUP resume token of {token_len} bytes exceeds {MAX_RESUME_LENGTH}"
        )));
    }
    let metadata_mime_len = field_len(f.metadata_mime_type.as_ref(), encoders.metadata_mime_type);
    let data_mime_len = field_len(f.data_mime_type.as_ref(), encoders.data_mime_type);
    if metadata_mime_len > MAX_MIME_LENGTH {
        return Err(FramingError::invariant(format!(
            "SETUP metadata MIME type of {metadata_mime_len} bytes exceeds {MAX_MIME_LENGTH}"
        )));
    }
    if data_mime_len > MAX_MIME_LENGTH {
        return Err(FramingError::invariant(format!(
            "SETUP data MIME type of {data_mime_len} bytes exceeds {MAX_MIME_LENGTH}"
        )));
    }

    let body_len = SETUP_FIXED_SIZE
        + token_len
        + MIME_LENGTH_SIZE
        + metadata_mime_len
        + MIME_LENGTH_SIZE
        + data_mime_len
        + payload_len(f.flags, f.metadata.as_ref(), f.data.as_ref(), encoders);
    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + body_len);
    out.extend_from_slice(&FrameHeader::new(f.stream_id, FrameType::Setup, f.flags).encode());
    out.extend_from_slice(&f.major_version.to_be_bytes());
    out.extend_from_slice(&f.minor_version.to_be_bytes());
    out.extend_from_slice(&f.keep_alive.to_be_bytes());
    out.extend_from_slice(&f.lifetime.to_be_bytes());
    // Absent token still gets its length slot, as zero.
    out.extend_from_slice(&(token_len as u16).to_be_bytes());
    if let Some(token) = &f.resume_token {
        encoders.resume_token.encode(token, &mut out)?;
    }
    out.push(metadata_mime_len as u8);
    if let Some(mime) = &f.metadata_mime_type {
        encoders.metadata_mime_type.encode(mime, &mut out)?;
    }
    out.push(data_mime_len as u8);
    if let Some(mime) = &f.data_mime_type {
        encoders.data_mime_type.encode(mime, &mut out)?;
    }
    write_payload(&mut out, f.flags, f.metadata.as_ref(), f.data.as_ref(), encoders)?;
    Ok(out)
}

fn decode_setup(header: &FrameHeader, body: &[u8], encoders: &EncoderSet) -> Result<Frame> {
    check_connection_stream(header.stream_id, FrameType::Setup)?;
    ensure_len(body, SETUP_FIXED_SIZE, FrameType::Setup, "fixed section")?;

    let major_version = get_u16(body, 0);
    let minor_version = get_u16(body, 2);
    let keep_alive = get_i32(body, 4);
    if keep_alive < 0 {
        return Err(FramingError::invariant(format!(
            "SETUP keep-alive out of range: {keep_alive}"
        )));
    }
    let lifetime = get_i32(body, 8);
    if lifetime < 0 {
        return Err(FramingError::invariant(format!(
            "SETUP lifetime out of range: {lifetime}"
        )));
    }
    let token_len = get_u16(body, 12) as usize;
    let mut offset = SETUP_FIXED_SIZE;
    ensure_len(body, offset + token_len, FrameType::Setup, "resume token")?;
    let resume_token = if token_len > 0 {
        Some(encoders.resume_token.decode(body, offset, offset + token_len)?)
    } else {
        None
    };
    offset += token_len;

    ensure_len(body, offset + MIME_LENGTH_SIZE, FrameType::Setup, "metadata MIME length")?;
    let metadata_mime_len = body[offset] as usize;
    offset += MIME_LENGTH_SIZE;
    ensure_len(body, offset + metadata_mime_len, FrameType::Setup, "metadata MIME type")?;
    let metadata_mime_type =
        Some(encoders.metadata_mime_type.decode(body, offset, offset + metadata_mime_len)?);
    offset += metadata_mime_len;

    ensure_len(body, offset + MIME_LENGTH_SIZE, FrameType::Setup, "data MIME length")?;
    let data_mime_len = body[offset] as usize;
    offset += MIME_LENGTH_SIZE;
    ensure_len(body, offset + data_mime_len, FrameType::Setup, "data MIME type")?;
    let data_mime_type =
        Some(encoders.data_mime_type.decode(body, offset, offset + data_mime_len)?);
    offset += data_mime_len;

    let (metadata, data) = read_payload(body, offset, header, encoders)?;
    Ok(Frame::Setup(SetupFrame {
        stream_id: header.stream_id,
        flags: header.flags,
        major_version,
        minor_version,
        keep_alive: keep_alive as u32,
        lifetime: lifetime as u32,
        resume_token,
        metadata_mime_type,
        data_mime_type,
        metadata,
        data,
    }))
}

// ---------------------------------------------------------------------
// LEASE
// ---------------------------------------------------------------------

fn encode_lease(f: &LeaseFrame, encoders: &EncoderSet) -> Result<Vec<u8>> {
    check_connection_stream(f.stream_id, FrameType::Lease)?;
    let metadata_len = field_len(f.metadata.as_ref(), encoders.metadata);
    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + LEASE_FIXED_SIZE + metadata_len);
    out.extend_from_slice(&FrameHeader::new(f.stream_id, FrameType::Lease, f.flags).encode());
    out.extend_from_slice(&f.ttl.to_be_bytes());
    out.extend_from_slice(&f.request_count.to_be_bytes());
    // LEASE metadata is the raw remainder, no u24 prefix.
    if let Some(m) = &f.metadata {
        encoders.metadata.encode(m, &mut out)?;
    }
    Ok(out)
}

fn decode_lease(header: &FrameHeader, body: &[u8], encoders: &EncoderSet) -> Result<Frame> {
    check_connection_stream(header.stream_id, FrameType::Lease)?;
    ensure_len(body, LEASE_FIXED_SIZE, FrameType::Lease, "fixed section")?;
    let ttl = get_u32(body, 0);
    let request_count = get_u32(body, 4);
    let metadata = if body.len() > LEASE_FIXED_SIZE {
        Some(encoders.metadata.decode(body, LEASE_FIXED_SIZE, body.len())?)
    } else {
        None
    };
    Ok(Frame::Lease(LeaseFrame {
        stream_id: header.stream_id,
        flags: header.flags,
        ttl,
        request_count,
        metadata,
    }))
}

// ---------------------------------------------------------------------
// KEEPALIVE
// ---------------------------------------------------------------------

fn encode_keepalive(f: &KeepaliveFrame, encoders: &EncoderSet) -> Result<Vec<u8>> {
    check_connection_stream(f.stream_id, FrameType::Keepalive)?;
    let data_len = field_len(f.data.as_ref(), encoders.data);
    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + KEEPALIVE_FIXED_SIZE + data_len);
    out.extend_from_slice(&FrameHeader::new(f.stream_id, FrameType::Keepalive, f.flags).encode());
    out.extend_from_slice(&f.last_received_position.to_be_bytes());
    // No metadata section, whatever the flags say.
    if let Some(d) = &f.data {
        encoders.data.encode(d, &mut out)?;
    }
    Ok(out)
}

fn decode_keepalive(header: &FrameHeader, body: &[u8], encoders: &EncoderSet) -> Result<Frame> {
    check_connection_stream(header.stream_id, FrameType::Keepalive)?;
    ensure_len(body, KEEPALIVE_FIXED_SIZE, FrameType::Keepalive, "position")?;
    let last_received_position = get_u64(body, 0);
    let data = if body.len() > KEEPALIVE_FIXED_SIZE {
        Some(encoders.data.decode(body, KEEPALIVE_FIXED_SIZE, body.len())?)
    } else {
        None
    };
    Ok(Frame::Keepalive(KeepaliveFrame {
        stream_id: header.stream_id,
        flags: header.flags,
        last_received_position,
        data,
    }))
}

// ---------------------------------------------------------------------
// ERROR
// ---------------------------------------------------------------------

fn encode_error(f: &ErrorFrame, encoders: &EncoderSet) -> Result<Vec<u8>> {
    check_stream_scoped_id(f.stream_id, FrameType::Error)?;
    if f.code > MAX_CODE {
        return Err(FramingError::invariant(format!(
            "ERROR code out of range: {:#x}",
            f.code
        )));
    }
    let message_len = field_len(f.message.as_ref(), encoders.message);
    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + ERROR_FIXED_SIZE + message_len);
    out.extend_from_slice(&FrameHeader::new(f.stream_id, FrameType::Error, f.flags).encode());
    out.extend_from_slice(&f.code.to_be_bytes());
    if let Some(message) = &f.message {
        encoders.message.encode(message, &mut out)?;
    }
    Ok(out)
}

fn decode_error(header: &FrameHeader, body: &[u8], encoders: &EncoderSet) -> Result<Frame> {
    check_stream_scoped(header)?;
    ensure_len(body, ERROR_FIXED_SIZE, FrameType::Error, "code")?;
    let code = get_u32(body, 0);
    if code > MAX_CODE {
        return Err(FramingError::invariant(format!(
            "ERROR code out of range: {code:#x}"
        )));
    }
    // Missing message decodes as an empty value, never as absent.
    let message = Some(encoders.message.decode(body, ERROR_FIXED_SIZE, body.len())?);
    Ok(Frame::Error(ErrorFrame {
        stream_id: header.stream_id,
        flags: header.flags,
        code,
        message,
    }))
}

// ---------------------------------------------------------------------
// REQUEST_RESPONSE / REQUEST_FNF / PAYLOAD (header + payload section)
// ---------------------------------------------------------------------

fn encode_payload_only(
    frame_type: FrameType,
    stream_id: u32,
    frame_flags: u16,
    metadata: &Option<FieldValue>,
    data: &Option<FieldValue>,
    encoders: &EncoderSet,
) -> Result<Vec<u8>> {
    check_stream_scoped_id(stream_id, frame_type)?;
    let body_len = payload_len(frame_flags, metadata.as_ref(), data.as_ref(), encoders);
    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + body_len);
    out.extend_from_slice(&FrameHeader::new(stream_id, frame_type, frame_flags).encode());
    write_payload(&mut out, frame_flags, metadata.as_ref(), data.as_ref(), encoders)?;
    Ok(out)
}

// ---------------------------------------------------------------------
// REQUEST_STREAM / REQUEST_CHANNEL (request n + payload section)
// ---------------------------------------------------------------------

fn encode_with_request_n(
    frame_type: FrameType,
    stream_id: u32,
    frame_flags: u16,
    request_n: u32,
    metadata: &Option<FieldValue>,
    data: &Option<FieldValue>,
    encoders: &EncoderSet,
) -> Result<Vec<u8>> {
    check_stream_scoped_id(stream_id, frame_type)?;
    check_request_n(request_n, frame_type)?;
    let body_len = REQUEST_N_SIZE + payload_len(frame_flags, metadata.as_ref(), data.as_ref(), encoders);
    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + body_len);
    out.extend_from_slice(&FrameHeader::new(stream_id, frame_type, frame_flags).encode());
    out.extend_from_slice(&request_n.to_be_bytes());
    write_payload(&mut out, frame_flags, metadata.as_ref(), data.as_ref(), encoders)?;
    Ok(out)
}

fn decode_request_n_payload(
    header: &FrameHeader,
    body: &[u8],
    encoders: &EncoderSet,
) -> Result<(u32, Option<FieldValue>, Option<FieldValue>)> {
    check_stream_scoped(header)?;
    ensure_len(body, REQUEST_N_SIZE, header.frame_type, "request n")?;
    let request_n = get_i32(body, 0);
    if request_n <= 0 {
        return Err(FramingError::invariant(format!(
            "{} frame request n must be positive, got {request_n}",
            header.frame_type.name()
        )));
    }
    let (metadata, data) = read_payload(body, REQUEST_N_SIZE, header, encoders)?;
    Ok((request_n as u32, metadata, data))
}

// ---------------------------------------------------------------------
// REQUEST_N / CANCEL
// ---------------------------------------------------------------------

fn encode_request_n(f: &RequestNFrame) -> Result<Vec<u8>> {
    check_stream_scoped_id(f.stream_id, FrameType::RequestN)?;
    check_request_n(f.request_n, FrameType::RequestN)?;
    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + REQUEST_N_SIZE);
    out.extend_from_slice(&FrameHeader::new(f.stream_id, FrameType::RequestN, f.flags).encode());
    out.extend_from_slice(&f.request_n.to_be_bytes());
    Ok(out)
}

fn decode_request_n(header: &FrameHeader, body: &[u8]) -> Result<Frame> {
    check_stream_scoped(header)?;
    ensure_len(body, REQUEST_N_SIZE, FrameType::RequestN, "request n")?;
    let request_n = get_i32(body, 0);
    if request_n <= 0 {
        return Err(FramingError::invariant(format!(
            "REQUEST_N frame request n must be positive, got {request_n}"
        )));
    }
    Ok(Frame::RequestN(RequestNFrame {
        stream_id: header.stream_id,
        flags: header.flags,
        request_n: request_n as u32,
    }))
}

fn encode_cancel(f: &CancelFrame) -> Result<Vec<u8>> {
    check_stream_scoped_id(f.stream_id, FrameType::Cancel)?;
    Ok(FrameHeader::new(f.stream_id, FrameType::Cancel, f.flags)
        .encode()
        .to_vec())
}

// ---------------------------------------------------------------------
// RESUME / RESUME_OK
// ---------------------------------------------------------------------

fn encode_resume(f: &ResumeFrame, encoders: &EncoderSet) -> Result<Vec<u8>> {
    check_connection_stream(f.stream_id, FrameType::Resume)?;
    let token_len = field_len(f.resume_token.as_ref(), encoders.resume_token);
    if token_len > MAX_RESUME_LENGTH {
        return Err(FramingError::invariant(format!(
            "RESUME token of {token_len} bytes exceeds {MAX_RESUME_LENGTH}"
        )));
    }
    let body_len = RESUME_FIXED_SIZE + token_len + RESUME_POSITIONS_SIZE;
    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + body_len);
    out.extend_from_slice(&FrameHeader::new(f.stream_id, FrameType::Resume, f.flags).encode());
    out.extend_from_slice(&f.major_version.to_be_bytes());
    out.extend_from_slice(&f.minor_version.to_be_bytes());
    out.extend_from_slice(&(token_len as u16).to_be_bytes());
    if let Some(token) = &f.resume_token {
        encoders.resume_token.encode(token, &mut out)?;
    }
    out.extend_from_slice(&f.last_received_server_position.to_be_bytes());
    out.extend_from_slice(&f.first_available_client_position.to_be_bytes());
    Ok(out)
}

fn decode_resume(header: &FrameHeader, body: &[u8], encoders: &EncoderSet) -> Result<Frame> {
    check_connection_stream(header.stream_id, FrameType::Resume)?;
    ensure_len(body, RESUME_FIXED_SIZE, FrameType::Resume, "fixed section")?;
    let major_version = get_u16(body, 0);
    let minor_version = get_u16(body, 2);
    let token_len = get_u16(body, 4) as usize;
    let mut offset = RESUME_FIXED_SIZE;
    ensure_len(body, offset + token_len, FrameType::Resume, "resume token")?;
    let resume_token = if token_len > 0 {
        Some(encoders.resume_token.decode(body, offset, offset + token_len)?)
    } else {
        None
    };
    offset += token_len;
    ensure_len(body, offset + RESUME_POSITIONS_SIZE, FrameType::Resume, "positions")?;
    let last_received_server_position = get_u64(body, offset);
    let first_available_client_position = get_u64(body, offset + 8);
    Ok(Frame::Resume(ResumeFrame {
        stream_id: header.stream_id,
        flags: header.flags,
        major_version,
        minor_version,
        resume_token,
        last_received_server_position,
        first_available_client_position,
    }))
}

fn encode_resume_ok(f: &ResumeOkFrame) -> Result<Vec<u8>> {
    check_connection_stream(f.stream_id, FrameType::ResumeOk)?;
    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + RESUME_OK_FIXED_SIZE);
    out.extend_from_slice(&FrameHeader::new(f.stream_id, FrameType::ResumeOk, f.flags).encode());
    out.extend_from_slice(&f.last_received_client_position.to_be_bytes());
    Ok(out)
}

fn decode_resume_ok(header: &FrameHeader, body: &[u8]) -> Result<Frame> {
    check_connection_stream(header.stream_id, FrameType::ResumeOk)?;
    ensure_len(body, RESUME_OK_FIXED_SIZE, FrameType::ResumeOk, "position")?;
    Ok(Frame::ResumeOk(ResumeOkFrame {
        stream_id: header.stream_id,
        flags: header.flags,
        last_received_client_position: get_u64(body, 0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::BINARY_ENCODERS;

    fn roundtrip(frame: Frame) -> Frame {
        let bytes = frame.encode().unwrap();
        Frame::decode(&bytes).unwrap()
    }

    #[test]
    fn test_cancel_roundtrip_and_wire_image() {
        let frame = Frame::Cancel(CancelFrame {
            stream_id: 7,
            flags: 0,
        });
        let bytes = frame.encode().unwrap();
        // 0x09 << 10 = 0x2400
        assert_eq!(bytes, [0x00, 0x00, 0x00, 0x07, 0x24, 0x00]);
        assert_eq!(Frame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_request_n_wire_image() {
        let frame = Frame::RequestN(RequestNFrame {
            stream_id: 42,
            flags: 0,
            request_n: 16,
        });
        let bytes = frame.encode().unwrap();
        // 0x08 << 10 = 0x2000
        assert_eq!(
            bytes,
            [0x00, 0x00, 0x00, 0x2A, 0x20, 0x00, 0x00, 0x00, 0x00, 0x10]
        );
        assert_eq!(Frame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_payload_with_metadata_and_data_wire_image() {
        let frame = Frame::Payload(PayloadFrame {
            stream_id: 1,
            flags: flags::METADATA | flags::NEXT | flags::COMPLETE,
            metadata: Some(FieldValue::text("hi")),
            data: Some(FieldValue::text("abc")),
        });
        let bytes = frame.encode().unwrap();
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x00, 0x01]);
        // body: u24 metadata length 2, "hi", then "abc"
        assert_eq!(
            &bytes[FRAME_HEADER_SIZE..],
            &[0x00, 0x00, 0x02, 0x68, 0x69, 0x61, 0x62, 0x63]
        );
        assert_eq!(Frame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_setup_roundtrip_wire_details() {
        let frame = Frame::Setup(SetupFrame {
            stream_id: 0,
            flags: 0,
            major_version: 1,
            minor_version: 0,
            keep_alive: 60_000,
            lifetime: 180_000,
            resume_token: None,
            metadata_mime_type: Some(FieldValue::text("application/json")),
            data_mime_type: Some(FieldValue::text("application/json")),
            metadata: None,
            data: None,
        });
        let bytes = frame.encode().unwrap();
        let body = &bytes[FRAME_HEADER_SIZE..];
        assert_eq!(get_u16(body, 0), 1);
        assert_eq!(get_u16(body, 2), 0);
        assert_eq!(get_u32(body, 4), 60_000);
        assert_eq!(get_u32(body, 8), 180_000);
        // zero-length resume token slot
        assert_eq!(&body[12..14], &[0x00, 0x00]);
        // both mime lengths are 16 = 0x10
        assert_eq!(body[14], 0x10);
        assert_eq!(&body[15..31], b"application/json");
        assert_eq!(body[31], 0x10);
        assert_eq!(&body[32..48], b"application/json");
        assert_eq!(body.len(), 48);
        assert_eq!(Frame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_setup_with_resume_token_and_payload() {
        let frame = Frame::Setup(SetupFrame {
            stream_id: 0,
            flags: flags::METADATA | flags::RESUME_ENABLE | flags::LEASE,
            major_version: 1,
            minor_version: 0,
            keep_alive: 30_000,
            lifetime: 90_000,
            resume_token: Some(FieldValue::text("session-42")),
            metadata_mime_type: Some(FieldValue::text("text/plain")),
            data_mime_type: Some(FieldValue::text("text/plain")),
            metadata: Some(FieldValue::text("routing")),
            data: Some(FieldValue::text("hello")),
        });
        assert_eq!(roundtrip(frame.clone()), frame);
    }

    #[test]
    fn test_setup_absent_mime_decodes_empty() {
        let frame = Frame::Setup(SetupFrame {
            stream_id: 0,
            flags: 0,
            major_version: 1,
            minor_version: 0,
            keep_alive: 1,
            lifetime: 1,
            resume_token: None,
            metadata_mime_type: None,
            data_mime_type: None,
            metadata: None,
            data: None,
        });
        let decoded = roundtrip(frame);
        match decoded {
            Frame::Setup(f) => {
                assert_eq!(f.metadata_mime_type, Some(FieldValue::text("")));
                assert_eq!(f.data_mime_type, Some(FieldValue::text("")));
                assert_eq!(f.resume_token, None);
            }
            other => panic!("expected SETUP, got {:?}", other.frame_type()),
        }
    }

    #[test]
    fn test_setup_rejects_nonzero_stream_id() {
        let frame = Frame::Setup(SetupFrame {
            stream_id: 1,
            flags: 0,
            major_version: 1,
            minor_version: 0,
            keep_alive: 1,
            lifetime: 1,
            resume_token: None,
            metadata_mime_type: None,
            data_mime_type: None,
            metadata: None,
            data: None,
        });
        let err = frame.encode().unwrap_err();
        assert!(err.to_string().contains("stream id"));

        // Same on the parse side: craft a valid SETUP and corrupt the id.
        let mut bytes = Frame::Setup(SetupFrame {
            stream_id: 0,
            ..match frame {
                Frame::Setup(f) => f,
                _ => unreachable!(),
            }
        })
        .encode()
        .unwrap();
        bytes[3] = 0x01;
        let err = Frame::decode(&bytes).unwrap_err();
        assert!(matches!(err, FramingError::InvariantViolation(_)));
        assert!(err.to_string().contains("stream id"));
    }

    #[test]
    fn test_setup_rejects_out_of_range_keep_alive() {
        let mut bytes = Frame::Setup(SetupFrame {
            stream_id: 0,
            flags: 0,
            major_version: 1,
            minor_version: 0,
            keep_alive: 1,
            lifetime: 1,
            resume_token: None,
            metadata_mime_type: None,
            data_mime_type: None,
            metadata: None,
            data: None,
        })
        .encode()
        .unwrap();
        // Set the sign bit of the keep-alive slot.
        bytes[FRAME_HEADER_SIZE + 4] = 0x80;
        let err = Frame::decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("keep-alive"));

        let frame = Frame::Setup(SetupFrame {
            stream_id: 0,
            flags: 0,
            major_version: 1,
            minor_version: 0,
            keep_alive: MAX_KEEPALIVE + 1,
            lifetime: 1,
            resume_token: None,
            metadata_mime_type: None,
            data_mime_type: None,
            metadata: None,
            data: None,
        });
        assert!(frame.encode().is_err());
    }

    #[test]
    fn test_setup_rejects_oversized_resume_token() {
        let frame = Frame::Setup(SetupFrame {
            stream_id: 0,
            flags: 0,
            major_version: 1,
            minor_version: 0,
            keep_alive: 1,
            lifetime: 1,
            resume_token: Some(FieldValue::bytes(vec![0u8; MAX_RESUME_LENGTH + 1])),
            metadata_mime_type: None,
            data_mime_type: None,
            metadata: None,
            data: None,
        });
        let err = frame.encode_with(&BINARY_ENCODERS).unwrap_err();
        assert!(err.to_string().contains("resume token"));
    }

    #[test]
    fn test_keepalive_roundtrip_and_rejects_stream_id() {
        let frame = Frame::Keepalive(KeepaliveFrame {
            stream_id: 0,
            flags: flags::RESPOND,
            last_received_position: 0xDEAD_BEEF_CAFE_0042,
            data: Some(FieldValue::text("ping")),
        });
        assert_eq!(roundtrip(frame.clone()), frame);

        let bad = Frame::Keepalive(KeepaliveFrame {
            stream_id: 3,
            flags: 0,
            last_received_position: 0,
            data: None,
        });
        assert!(bad.encode().is_err());
    }

    #[test]
    fn test_keepalive_ignores_metadata_flag() {
        // METADATA flag set, but KEEPALIVE has no metadata section: the
        // whole remainder is data.
        let frame = Frame::Keepalive(KeepaliveFrame {
            stream_id: 0,
            flags: flags::METADATA,
            last_received_position: 1,
            data: Some(FieldValue::text("xyz")),
        });
        let bytes = frame.encode().unwrap();
        assert_eq!(bytes.len(), FRAME_HEADER_SIZE + 8 + 3);
        assert_eq!(Frame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_lease_roundtrip_without_length_prefix() {
        let frame = Frame::Lease(LeaseFrame {
            stream_id: 0,
            flags: flags::METADATA,
            ttl: 30_000,
            request_count: 128,
            metadata: Some(FieldValue::text("quota")),
        });
        let bytes = frame.encode().unwrap();
        // metadata starts right after ttl + request count, no u24 prefix
        assert_eq!(&bytes[FRAME_HEADER_SIZE + 8..], b"quota");
        assert_eq!(Frame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_lease_rejects_nonzero_stream_id() {
        let bad = Frame::Lease(LeaseFrame {
            stream_id: 9,
            flags: 0,
            ttl: 1,
            request_count: 1,
            metadata: None,
        });
        assert!(bad.encode().is_err());
    }

    #[test]
    fn test_error_roundtrip_and_code_bound() {
        use super::super::wire_format::error_codes;

        let frame = Frame::Error(ErrorFrame {
            stream_id: 5,
            flags: 0,
            code: error_codes::APPLICATION_ERROR,
            message: Some(FieldValue::text("boom")),
        });
        assert_eq!(roundtrip(frame.clone()), frame);

        let bad = Frame::Error(ErrorFrame {
            stream_id: 5,
            flags: 0,
            code: MAX_CODE + 1,
            message: None,
        });
        assert!(bad.encode().unwrap_err().to_string().contains("code"));
    }

    #[test]
    fn test_error_missing_message_decodes_empty() {
        let frame = Frame::Error(ErrorFrame {
            stream_id: 5,
            flags: 0,
            code: 0x0201,
            message: None,
        });
        match roundtrip(frame) {
            Frame::Error(f) => assert_eq!(f.message, Some(FieldValue::text(""))),
            other => panic!("expected ERROR, got {:?}", other.frame_type()),
        }
    }

    #[test]
    fn test_error_rejects_zero_stream_id() {
        let bad = Frame::Error(ErrorFrame {
            stream_id: 0,
            flags: 0,
            code: 1,
            message: None,
        });
        assert!(bad.encode().is_err());
    }

    #[test]
    fn test_request_response_roundtrip() {
        let frame = Frame::RequestResponse(RequestResponseFrame {
            stream_id: 11,
            flags: flags::METADATA | flags::FOLLOWS,
            metadata: Some(FieldValue::text("route")),
            data: Some(FieldValue::text("body")),
        });
        assert_eq!(roundtrip(frame.clone()), frame);
    }

    #[test]
    fn test_request_fnf_roundtrip_data_only() {
        let frame = Frame::RequestFnf(RequestFnfFrame {
            stream_id: 2,
            flags: 0,
            metadata: None,
            data: Some(FieldValue::text("event")),
        });
        assert_eq!(roundtrip(frame.clone()), frame);
    }

    #[test]
    fn test_request_stream_roundtrip_and_request_n_bound() {
        let frame = Frame::RequestStream(RequestStreamFrame {
            stream_id: 21,
            flags: flags::METADATA,
            request_n: 0x7FFF_FFFF,
            metadata: Some(FieldValue::text("m")),
            data: Some(FieldValue::text("d")),
        });
        assert_eq!(roundtrip(frame.clone()), frame);

        let bad = Frame::RequestStream(RequestStreamFrame {
            stream_id: 21,
            flags: 0,
            request_n: 0,
            metadata: None,
            data: None,
        });
        assert!(bad.encode().unwrap_err().to_string().contains("request n"));
    }

    #[test]
    fn test_request_channel_rejects_negative_request_n_on_parse() {
        let mut bytes = Frame::RequestChannel(RequestChannelFrame {
            stream_id: 4,
            flags: flags::COMPLETE,
            request_n: 10,
            metadata: None,
            data: None,
        })
        .encode()
        .unwrap();
        bytes[FRAME_HEADER_SIZE] = 0xFF;
        let err = Frame::decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("request n"));
    }

    #[test]
    fn test_request_n_rejects_zero_stream_id() {
        let bad = Frame::RequestN(RequestNFrame {
            stream_id: 0,
            flags: 0,
            request_n: 1,
        });
        assert!(bad.encode().is_err());
    }

    #[test]
    fn test_payload_metadata_flag_clear_trailing_bytes_are_data() {
        let frame = Frame::Payload(PayloadFrame {
            stream_id: 1,
            flags: flags::NEXT,
            metadata: None,
            data: Some(FieldValue::text("all of this is data")),
        });
        let bytes = frame.encode().unwrap();
        assert_eq!(&bytes[FRAME_HEADER_SIZE..], b"all of this is data");
        assert_eq!(Frame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_payload_metadata_dropped_when_flag_clear() {
        let frame = Frame::Payload(PayloadFrame {
            stream_id: 1,
            flags: flags::NEXT,
            metadata: Some(FieldValue::text("discarded")),
            data: Some(FieldValue::text("kept")),
        });
        let bytes = frame.encode().unwrap();
        assert_eq!(&bytes[FRAME_HEADER_SIZE..], b"kept");
        match Frame::decode(&bytes).unwrap() {
            Frame::Payload(f) => {
                assert_eq!(f.metadata, None);
                assert_eq!(f.data, Some(FieldValue::text("kept")));
            }
            other => panic!("expected PAYLOAD, got {:?}", other.frame_type()),
        }
    }

    #[test]
    fn test_payload_zero_length_metadata_block() {
        let frame = Frame::Payload(PayloadFrame {
            stream_id: 1,
            flags: flags::METADATA | flags::NEXT,
            metadata: None,
            data: Some(FieldValue::text("d")),
        });
        let bytes = frame.encode().unwrap();
        // zero-length u24 prefix still written
        assert_eq!(&bytes[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + 3], &[0, 0, 0]);
        match Frame::decode(&bytes).unwrap() {
            Frame::Payload(f) => {
                assert_eq!(f.metadata, None);
                assert_eq!(f.data, Some(FieldValue::text("d")));
            }
            other => panic!("expected PAYLOAD, got {:?}", other.frame_type()),
        }
    }

    #[test]
    fn test_payload_empty() {
        let frame = Frame::Payload(PayloadFrame {
            stream_id: 1,
            flags: flags::COMPLETE,
            metadata: None,
            data: None,
        });
        let bytes = frame.encode().unwrap();
        assert_eq!(bytes.len(), FRAME_HEADER_SIZE);
        assert_eq!(Frame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_payload_truncated_metadata_block_rejected() {
        let frame = Frame::Payload(PayloadFrame {
            stream_id: 1,
            flags: flags::METADATA,
            metadata: Some(FieldValue::text("meta")),
            data: None,
        });
        let mut bytes = frame.encode().unwrap();
        // claim more metadata than the frame holds
        bytes[FRAME_HEADER_SIZE + 2] = 0xFF;
        let err = Frame::decode(&bytes).unwrap_err();
        assert!(matches!(err, FramingError::InvariantViolation(_)));
    }

    #[test]
    fn test_unknown_flag_bits_roundtrip() {
        // 0x013 has no assigned meaning; it must survive untouched.
        let frame = Frame::Payload(PayloadFrame {
            stream_id: 1,
            flags: flags::NEXT | 0x013,
            metadata: None,
            data: Some(FieldValue::text("x")),
        });
        let decoded = roundtrip(frame.clone());
        assert_eq!(decoded.flags(), flags::NEXT | 0x013);
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_resume_roundtrip() {
        let frame = Frame::Resume(ResumeFrame {
            stream_id: 0,
            flags: 0,
            major_version: 1,
            minor_version: 0,
            resume_token: Some(FieldValue::bytes(vec![0xAA, 0xBB, 0xCC])),
            last_received_server_position: 77,
            first_available_client_position: 12,
        });
        let bytes = frame.encode_with(&BINARY_ENCODERS).unwrap();
        assert_eq!(Frame::decode_with(&bytes, &BINARY_ENCODERS).unwrap(), frame);
    }

    #[test]
    fn test_resume_empty_token_roundtrip() {
        let frame = Frame::Resume(ResumeFrame {
            stream_id: 0,
            flags: 0,
            major_version: 1,
            minor_version: 0,
            resume_token: None,
            last_received_server_position: 1,
            first_available_client_position: 1,
        });
        assert_eq!(roundtrip(frame.clone()), frame);
    }

    #[test]
    fn test_resume_rejects_nonzero_stream_id() {
        let mut bytes = Frame::Resume(ResumeFrame {
            stream_id: 0,
            flags: 0,
            major_version: 1,
            minor_version: 0,
            resume_token: None,
            last_received_server_position: 0,
            first_available_client_position: 0,
        })
        .encode()
        .unwrap();
        bytes[3] = 0x02;
        assert!(Frame::decode(&bytes).is_err());
    }

    #[test]
    fn test_resume_ok_roundtrip() {
        let frame = Frame::ResumeOk(ResumeOkFrame {
            stream_id: 0,
            flags: 0,
            last_received_client_position: u64::MAX,
        });
        assert_eq!(roundtrip(frame.clone()), frame);
    }

    #[test]
    fn test_binary_set_roundtrip_with_blob_fields() {
        let frame = Frame::Payload(PayloadFrame {
            stream_id: 9,
            flags: flags::METADATA | flags::NEXT,
            metadata: Some(FieldValue::bytes(vec![0x00, 0xFF, 0x80])),
            data: Some(FieldValue::bytes(vec![0xDE, 0xAD])),
        });
        let bytes = frame.encode_with(&BINARY_ENCODERS).unwrap();
        assert_eq!(Frame::decode_with(&bytes, &BINARY_ENCODERS).unwrap(), frame);
    }

    #[test]
    fn test_text_set_rejects_binary_blob() {
        let frame = Frame::Payload(PayloadFrame {
            stream_id: 9,
            flags: flags::NEXT,
            metadata: None,
            data: Some(FieldValue::bytes(vec![0xFF, 0xFE])),
        });
        let err = frame.encode().unwrap_err();
        assert!(matches!(err, FramingError::EncoderMismatch(_)));
    }

    #[test]
    fn test_truncated_body_rejected() {
        let bytes = Frame::RequestN(RequestNFrame {
            stream_id: 1,
            flags: 0,
            request_n: 5,
        })
        .encode()
        .unwrap();
        let err = Frame::decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, FramingError::InvariantViolation(_)));
    }
}
