use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};

/// Frame header: start marker (1) + length (1).
pub const HEADER_SIZE: usize = 2;

/// First byte of every frame.
pub const START_MARKER: u8 = 0xAA;

/// Last byte of every frame.
pub const END_MARKER: u8 = 0x0A;

/// Smallest legal length field: opcode + end marker.
pub const MIN_LENGTH: u8 = 2;

/// Largest payload of a frame without a sub-opcode.
pub const MAX_PAYLOAD: usize = u8::MAX as usize - 2;

/// Whether the first body byte after the opcode is a sub-opcode.
///
/// The wire format cannot tell the two apart; the sender knows which command
/// family it is talking to. Replies never echo the sub-opcode, so received
/// frames are decoded [`Addressing::Plain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Addressing {
    #[default]
    Plain,
    SubAddressed,
}

/// One command or response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command/response family.
    pub opcode: u8,
    /// Operation within a sub-addressed family.
    pub sub_opcode: Option<u8>,
    /// Opcode-specific bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame without a sub-opcode.
    pub fn new(opcode: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            sub_opcode: None,
            payload: payload.into(),
        }
    }

    /// Create a frame addressed to one member of a sub-addressed family.
    pub fn addressed(opcode: u8, sub_opcode: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            sub_opcode: Some(sub_opcode),
            payload: payload.into(),
        }
    }

    /// The family this frame belongs to. Replies are matched on this alone.
    pub fn family(&self) -> u8 {
        self.opcode
    }

    pub fn addressing(&self) -> Addressing {
        match self.sub_opcode {
            Some(_) => Addressing::SubAddressed,
            None => Addressing::Plain,
        }
    }

    /// Value of the length field: everything after it, end marker included.
    pub fn length(&self) -> usize {
        1 + usize::from(self.sub_opcode.is_some()) + self.payload.len() + 1
    }

    /// The total wire size of this frame (header + length).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.length()
    }

    /// First payload byte. Replies carry their status or count here.
    pub fn status(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Encode onto the end of `dst`.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        encode_frame(self.opcode, self.sub_opcode, &self.payload, dst)
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────┬────────┬────────┬─────────────┬──────────┬────────┐
/// │ 0xAA   │ Length │ Opcode │ Sub-opcode  │ Payload  │ 0x0A   │
/// │ (1B)   │ (1B)   │ (1B)   │ (0 or 1B)   │ (0..N)   │ (1B)   │
/// └────────┴────────┴────────┴─────────────┴──────────┴────────┘
/// Length counts every byte after itself, end marker included.
/// ```
pub fn encode_frame(
    opcode: u8,
    sub_opcode: Option<u8>,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let header_bytes = usize::from(sub_opcode.is_some());
    let max = MAX_PAYLOAD - header_bytes;
    if payload.len() > max {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max,
        });
    }

    let length = 1 + header_bytes + payload.len() + 1;
    dst.reserve(HEADER_SIZE + length);
    dst.put_u8(START_MARKER);
    dst.put_u8(length as u8);
    dst.put_u8(opcode);
    if let Some(sub) = sub_opcode {
        dst.put_u8(sub);
    }
    dst.put_slice(payload);
    dst.put_u8(END_MARKER);
    Ok(())
}

/// Validate the two header bytes and return the number of bytes that follow.
pub fn check_header(start: u8, length: u8) -> Result<usize> {
    if start != START_MARKER {
        return Err(FrameError::BadStart { found: start });
    }
    if length < MIN_LENGTH {
        return Err(FrameError::TooShort { length });
    }
    Ok(usize::from(length))
}

/// Decode exactly one frame from `src`.
///
/// The slice must hold the whole frame and nothing else. A short slice is
/// reported as [`FrameError::Incomplete`], never decoded partially.
pub fn decode_frame(src: &[u8], addressing: Addressing) -> Result<Frame> {
    let Some(&start) = src.first() else {
        return Err(FrameError::Incomplete {
            expected: HEADER_SIZE,
            actual: 0,
        });
    };
    if start != START_MARKER {
        return Err(FrameError::BadStart { found: start });
    }
    if src.len() < HEADER_SIZE {
        return Err(FrameError::Incomplete {
            expected: HEADER_SIZE,
            actual: src.len(),
        });
    }

    let length = check_header(src[0], src[1])?;
    let total = HEADER_SIZE + length;
    if src.len() < total {
        return Err(FrameError::Incomplete {
            expected: total,
            actual: src.len(),
        });
    }
    if src[total - 1] != END_MARKER {
        return Err(FrameError::BadEnd {
            found: src[total - 1],
        });
    }
    if src.len() > total {
        return Err(FrameError::TrailingBytes {
            extra: src.len() - total,
        });
    }

    split_body(&src[HEADER_SIZE..total - 1], addressing, src[1])
}

/// Decode a frame from the front of a streaming buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_from(src: &mut BytesMut, addressing: Addressing) -> Result<Option<Frame>> {
    if src.is_empty() {
        return Ok(None);
    }
    if src[0] != START_MARKER {
        return Err(FrameError::BadStart { found: src[0] });
    }
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let length = check_header(src[0], src[1])?;
    let total = HEADER_SIZE + length;
    if src.len() < total {
        return Ok(None);
    }
    if src[total - 1] != END_MARKER {
        return Err(FrameError::BadEnd {
            found: src[total - 1],
        });
    }

    let declared = src[1];
    trace!(length, buffered = src.len(), "frame complete in stream buffer");
    src.advance(HEADER_SIZE);
    let body = src.split_to(length - 1).freeze();
    src.advance(1);

    split_body(&body, addressing, declared).map(Some)
}

fn split_body(body: &[u8], addressing: Addressing, length: u8) -> Result<Frame> {
    match addressing {
        Addressing::Plain => Ok(Frame::new(body[0], Bytes::copy_from_slice(&body[1..]))),
        Addressing::SubAddressed => {
            if body.len() < 2 {
                return Err(FrameError::TooShort { length });
            }
            Ok(Frame::addressed(
                body[0],
                body[1],
                Bytes::copy_from_slice(&body[2..]),
            ))
        }
    }
}
