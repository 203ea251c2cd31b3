/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The first byte is not the start marker.
    #[error("invalid start marker 0x{found:02X} (expected 0xAA)")]
    BadStart { found: u8 },

    /// The length field cannot cover the opcode and the end marker.
    #[error("declared length {length} is below the minimum of 2")]
    TooShort { length: u8 },

    /// The byte at the position implied by the length field is not the end marker.
    #[error("invalid end marker 0x{found:02X} (expected 0x0A)")]
    BadEnd { found: u8 },

    /// Fewer bytes are present than the length field declares.
    #[error("incomplete frame ({actual} of {expected} bytes)")]
    Incomplete { expected: usize, actual: usize },

    /// More bytes are present than the length field declares.
    #[error("{extra} unexpected bytes after end marker")]
    TrailingBytes { extra: usize },

    /// The encoded frame would not fit the one-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
