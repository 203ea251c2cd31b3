//! Reply payload decoding shared by the command implementations.

use vrlink_frame::Frame;

use crate::error::{DeviceError, Result};
use crate::types::{slot, GroupMode, RecognizerStatus, SLOT_COUNT};

/// Bytes in a recognizer status payload.
pub(crate) const RECOGNIZER_PAYLOAD: usize = 11;

/// Fail unless the reply payload holds at least `min` bytes.
pub(crate) fn require(frame: &Frame, min: usize) -> Result<&[u8]> {
    if frame.payload.len() < min {
        return Err(DeviceError::malformed(
            frame.opcode,
            format!(
                "payload has {} bytes, expected at least {min}",
                frame.payload.len()
            ),
        ));
    }
    Ok(&frame.payload)
}

/// Fail unless the reply's length field equals `length`.
pub(crate) fn require_length(frame: &Frame, length: usize) -> Result<&[u8]> {
    if frame.length() != length {
        return Err(DeviceError::malformed(
            frame.opcode,
            format!("length {} (expected {length})", frame.length()),
        ));
    }
    Ok(&frame.payload)
}

/// Split a `(record, status)` pair list.
pub(crate) fn pairs(opcode: u8, bytes: &[u8]) -> Result<Vec<(u8, u8)>> {
    if bytes.len() % 2 != 0 {
        return Err(DeviceError::malformed(
            opcode,
            format!("odd record/status list of {} bytes", bytes.len()),
        ));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect())
}

pub(crate) fn slots(bytes: &[u8]) -> [Option<u8>; SLOT_COUNT] {
    let mut out = [None; SLOT_COUNT];
    for (dst, &code) in out.iter_mut().zip(bytes) {
        *dst = slot(code);
    }
    out
}

/// Decode an 11-byte recognizer status payload.
pub(crate) fn recognizer_status(payload: &[u8]) -> RecognizerStatus {
    RecognizerStatus {
        valid: payload[0],
        slots: slots(&payload[1..=SLOT_COUNT]),
        total: payload[8],
        valid_bitmap: payload[9],
        group_mode: GroupMode::from_code(payload[10]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_pair_list_is_malformed() {
        assert_eq!(pairs(0x30, &[1, 0, 2, 0xFE]).unwrap(), vec![(1, 0), (2, 0xFE)]);
        assert!(matches!(
            pairs(0x30, &[1, 0, 2]),
            Err(DeviceError::MalformedReply { opcode: 0x30, .. })
        ));
    }

    #[test]
    fn recognizer_payload_layout() {
        let payload = [2, 0, 5, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 2, 0b11, 0xFF];
        let status = recognizer_status(&payload);
        assert_eq!(status.valid, 2);
        assert_eq!(status.slots[0], Some(0));
        assert_eq!(status.slots[1], Some(5));
        assert_eq!(status.slots[2], None);
        assert_eq!(status.total, 2);
        assert_eq!(status.group_mode, GroupMode::None);
    }

    #[test]
    fn length_check() {
        let frame = Frame::new(0x01, vec![0u8; 11]);
        assert!(require_length(&frame, 13).is_ok());
        assert!(require_length(&Frame::new(0x01, vec![0u8; 10]), 13).is_err());
        assert!(require(&frame, 12).is_err());
    }
}
