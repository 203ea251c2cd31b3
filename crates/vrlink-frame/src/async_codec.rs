use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_from, Addressing, Frame};
use crate::error::FrameError;

/// `tokio_util` codec for the marker-delimited frame format.
///
/// Decodes with [`Addressing::Plain`] by default since the module never
/// echoes sub-opcodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoiceCodec {
    addressing: Addressing,
}

impl VoiceCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode incoming frames as members of a sub-addressed family.
    pub fn with_addressing(addressing: Addressing) -> Self {
        Self { addressing }
    }
}

/// Codec errors: framing violations or I/O from the underlying stream.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Decoder for VoiceCodec {
    type Item = Frame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(decode_from(src, self.addressing)?)
    }
}

impl Encoder<Frame> for VoiceCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Ok(item.encode(dst)?)
    }
}
