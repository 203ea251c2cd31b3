//! Marker-delimited command/response framing for the voice-recognition module.
//!
//! Every frame is delimited by:
//! - a start marker byte (0xAA)
//! - a 1-byte length covering everything after it
//! - an end marker byte (0x0A)
//!
//! There is no byte stuffing; the length field alone delimits the frame.

pub mod codec;
pub mod error;
pub mod opcode;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    check_header, decode_frame, decode_from, encode_frame, Addressing, Frame, END_MARKER,
    HEADER_SIZE, MAX_PAYLOAD, MIN_LENGTH, START_MARKER,
};
pub use error::{FrameError, Result};
pub use opcode::opcode_name;

#[cfg(feature = "async")]
pub use async_codec::{CodecError, VoiceCodec};
