use tracing::debug;
use vrlink_frame::{opcode, Frame};
use vrlink_session::CollectPolicy;
use vrlink_transport::ByteTransport;

use crate::error::{DeviceError, Result};
use crate::module::VoiceModule;
use crate::reply;

/// Blocks in one self-test image.
pub const TEST_BLOCKS: usize = 10;

/// Bytes per self-test block.
pub const TEST_BLOCK_SIZE: usize = 20;

/// Size of a full self-test image.
pub const TEST_IMAGE_SIZE: usize = TEST_BLOCKS * TEST_BLOCK_SIZE;

impl<T: ByteTransport> VoiceModule<T> {
    /// Read the factory self-test image.
    ///
    /// The module answers with ten blocks, each tagged with its index.
    pub fn self_test_read(&mut self) -> Result<[u8; TEST_IMAGE_SIZE]> {
        let command = Frame::addressed(opcode::TEST, opcode::TEST_READ, Vec::new());
        let idle = self.session.config().test_idle_timeout;
        let collected =
            self.session
                .collect_until(&command, &CollectPolicy::FixedCount(TEST_BLOCKS), idle)?;

        let mut image = [0u8; TEST_IMAGE_SIZE];
        for frame in &collected.frames {
            let payload = reply::require(frame, TEST_BLOCK_SIZE + 1)?;
            let index = usize::from(payload[0]);
            if index >= TEST_BLOCKS {
                return Err(DeviceError::malformed(
                    frame.opcode,
                    format!("self-test block index {index} out of range"),
                ));
            }
            let start = index * TEST_BLOCK_SIZE;
            image[start..start + TEST_BLOCK_SIZE]
                .copy_from_slice(&payload[1..=TEST_BLOCK_SIZE]);
        }
        Ok(image)
    }

    /// Write a self-test image, one acknowledged block at a time.
    pub fn self_test_write(&mut self, image: &[u8; TEST_IMAGE_SIZE]) -> Result<()> {
        let idle = self.session.config().test_idle_timeout;
        let policy = CollectPolicy::single();

        for (index, block) in image.chunks_exact(TEST_BLOCK_SIZE).enumerate() {
            let mut payload = Vec::with_capacity(TEST_BLOCK_SIZE + 1);
            payload.push(index as u8);
            payload.extend_from_slice(block);

            let command = Frame::addressed(opcode::TEST, opcode::TEST_WRITE, payload);
            self.session.collect_until(&command, &policy, idle)?;
            debug!(block = index, "self-test block written");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::testing::*;
    use vrlink_session::ErrorKind;
    use vrlink_transport::{MockTransport, Reply};

    fn block(index: u8) -> Vec<u8> {
        let mut payload = vec![index];
        payload.extend(std::iter::repeat(index * 3).take(TEST_BLOCK_SIZE));
        payload
    }

    #[test]
    fn read_places_blocks_by_index() {
        let mock = MockTransport::new();
        let bytes: Vec<u8> = (0..10u8).rev().flat_map(|i| wire(0xEE, &block(i))).collect();
        mock.on_write(Reply::new().bytes(bytes));
        let mut module = module(&mock);

        let image = module.self_test_read().unwrap();
        assert_eq!(image[0], 0);
        assert_eq!(image[20], 3);
        assert_eq!(image[199], 27);
        assert_eq!(mock.written(), vec![0xAA, 0x03, 0xEE, 0x01, 0x0A]);
    }

    #[test]
    fn read_short_is_timeout() {
        let mock = MockTransport::new();
        let bytes: Vec<u8> = (0..4u8).flat_map(|i| wire(0xEE, &block(i))).collect();
        mock.on_write(Reply::new().bytes(bytes));
        let mut module = module(&mock);

        let err = module.self_test_read().unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Timeout));
    }

    #[test]
    fn write_sends_ten_indexed_blocks() {
        let mock = MockTransport::new();
        for _ in 0..10 {
            mock.on_write(reply(0xEE, &[0]));
        }
        let mut module = module(&mock);

        let mut image = [0u8; TEST_IMAGE_SIZE];
        image[40] = 0x55;
        module.self_test_write(&image).unwrap();

        let writes = mock.writes();
        assert_eq!(writes.len(), 10);
        assert_eq!(writes[2].len(), 2 + 2 + 21 + 1);
        assert_eq!(writes[2][3..6], [0x00, 2, 0x55]);
    }

    #[test]
    fn write_stops_on_foreign_frame() {
        let mock = MockTransport::new();
        mock.on_write(reply(0xEE, &[0]));
        mock.on_write(reply(0x0D, &[0, 0xFF, 1, 0, 0]));
        let mut module = module(&mock);

        let err = module.self_test_write(&[0u8; TEST_IMAGE_SIZE]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ProtocolViolation));
        assert_eq!(mock.writes().len(), 2);
    }
}
