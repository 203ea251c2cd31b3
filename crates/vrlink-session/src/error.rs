use std::time::Duration;

use vrlink_frame::{opcode_name, FrameError};
use vrlink_transport::TransportError;

/// Coarse classification of a failed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No complete reply arrived before the deadline.
    Timeout,
    /// Bytes arrived but did not form a valid frame.
    Framing,
    /// A valid frame arrived for a different command family.
    UnexpectedReply,
    /// A frame arrived that the current policy does not permit at all.
    ProtocolViolation,
    /// The byte transport failed.
    Transport,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Framing => "framing",
            Self::UnexpectedReply => "unexpected_reply",
            Self::ProtocolViolation => "protocol_violation",
            Self::Transport => "transport",
        }
    }
}

/// Errors that can occur while exchanging frames with the module.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The deadline passed before a complete frame arrived.
    ///
    /// `partial` counts bytes of an unfinished frame; zero means the line
    /// stayed silent.
    #[error("no complete reply within {waited:?} ({partial} bytes of a partial frame)")]
    Timeout { waited: Duration, partial: usize },

    /// A reply arrived for a different command family and was discarded.
    #[error(
        "unexpected reply 0x{found:02X} ({}) to 0x{expected:02X} ({})",
        name(.found),
        name(.expected)
    )]
    UnexpectedReply { expected: u8, found: u8 },

    /// A frame arrived that is neither the awaited reply nor a permitted
    /// diagnostic.
    #[error(
        "protocol violation: frame 0x{found:02X} ({}) while awaiting 0x{expected:02X} ({})",
        name(.found),
        name(.expected)
    )]
    ProtocolViolation { expected: u8, found: u8 },
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Frame(FrameError::Incomplete { .. }) => ErrorKind::Timeout,
            Self::Frame(_) => ErrorKind::Framing,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::UnexpectedReply { .. } => ErrorKind::UnexpectedReply,
            Self::ProtocolViolation { .. } => ErrorKind::ProtocolViolation,
        }
    }

    /// True for a deadline expiry with no partial frame on the line.
    pub fn is_silence(&self) -> bool {
        matches!(self, Self::Timeout { partial: 0, .. })
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

fn name(opcode: &u8) -> &'static str {
    opcode_name(*opcode)
}
