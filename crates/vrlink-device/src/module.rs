use std::time::Duration;

use tracing::debug;
use vrlink_frame::{opcode, Frame};
use vrlink_session::{RecordSet, Session, SessionConfig};
use vrlink_transport::ByteTransport;

use crate::error::{DeviceError, Result};
use crate::reply::{self, RECOGNIZER_PAYLOAD};
use crate::types::{
    baud_code, baud_rate, GroupControl, GroupMode, IoMode, RecognizerStatus, Recognition,
    SystemSettings, MAX_PULSE_WIDTH,
};

/// Length field of a recognizer status reply.
const RECOGNIZER_REPLY_LENGTH: usize = RECOGNIZER_PAYLOAD + 2;

/// One bitmap byte flags the auto-loaded records.
const AUTO_LOAD_MAX: usize = 8;

/// Driver for one voice-recognition module.
///
/// Each method sends one command and decodes its reply. Arguments are
/// checked before anything is written to the transport.
#[derive(Debug)]
pub struct VoiceModule<T> {
    pub(crate) session: Session<T>,
}

impl<T: ByteTransport> VoiceModule<T> {
    pub fn new(transport: T) -> Self {
        Self::from_session(Session::new(transport))
    }

    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        Self::from_session(Session::with_config(transport, config))
    }

    pub fn from_session(session: Session<T>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    pub fn into_inner(self) -> T {
        self.session.into_inner()
    }

    pub(crate) fn reply_timeout(&self) -> Duration {
        self.session.config().reply_timeout
    }

    /// Send a command and require a single same-family reply.
    pub(crate) fn command(&mut self, frame: Frame) -> Result<Frame> {
        let timeout = self.reply_timeout();
        Ok(self.session.exchange(&frame, timeout)?)
    }

    /// Wait up to `timeout` for the module to report a recognized record.
    ///
    /// Returns `None` when the line stays silent.
    pub fn recognize(&mut self, timeout: Duration) -> Result<Option<Recognition>> {
        let frame = match self.session.receive_one(timeout) {
            Ok(frame) => frame,
            Err(err) if err.is_silence() => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if frame.opcode != opcode::RECOGNIZED {
            return Err(vrlink_session::SessionError::UnexpectedReply {
                expected: opcode::RECOGNIZED,
                found: frame.opcode,
            }
            .into());
        }

        let payload = reply::require(&frame, 5)?;
        let sig_len = usize::from(payload[4]);
        let signature = match sig_len {
            0 => None,
            n => Some(
                payload
                    .get(5..5 + n)
                    .ok_or_else(|| {
                        DeviceError::malformed(
                            frame.opcode,
                            format!("signature of {n} bytes is cut short"),
                        )
                    })?
                    .to_vec(),
            ),
        };

        let event = Recognition {
            group_mode: GroupMode::from_code(payload[1]),
            record: payload[2],
            slot: payload[3],
            signature,
        };
        debug!(record = event.record, slot = event.slot, "record recognized");
        Ok(Some(event))
    }

    pub fn check_system_settings(&mut self) -> Result<SystemSettings> {
        let reply = self.command(Frame::new(opcode::CHECK_SYSTEM, Vec::new()))?;
        let payload = reply::require(&reply, 6)?;

        let baud_rate = baud_rate(payload[1]).ok_or_else(|| {
            DeviceError::malformed(reply.opcode, format!("unknown baud code {}", payload[1]))
        })?;
        let io_mode = IoMode::from_code(payload[2]).ok_or_else(|| {
            DeviceError::malformed(reply.opcode, format!("unknown io mode {}", payload[2]))
        })?;
        let group_control = GroupControl::from_code(payload[5]).ok_or_else(|| {
            DeviceError::malformed(
                reply.opcode,
                format!("unknown group control {}", payload[5]),
            )
        })?;

        Ok(SystemSettings {
            baud_rate,
            io_mode,
            pulse_width: payload[3],
            auto_load: !matches!(payload[4], 0x00 | 0xFF),
            group_control,
        })
    }

    pub fn check_recognizer(&mut self) -> Result<RecognizerStatus> {
        let reply = self.command(Frame::new(opcode::CHECK_RECOGNIZER, Vec::new()))?;
        let payload = reply::require_length(&reply, RECOGNIZER_REPLY_LENGTH)?;
        Ok(reply::recognizer_status(payload))
    }

    /// Restore factory settings.
    pub fn restore_system_settings(&mut self) -> Result<()> {
        self.command(Frame::new(opcode::RESET_DEFAULT, Vec::new()))?;
        Ok(())
    }

    /// Switch the module's baud rate. The host side must follow separately.
    pub fn set_baud_rate(&mut self, rate: u32) -> Result<()> {
        let code = baud_code(rate)
            .ok_or_else(|| DeviceError::invalid(format!("unsupported baud rate {rate}")))?;
        self.command(Frame::new(opcode::SET_BAUD_RATE, vec![code]))?;
        Ok(())
    }

    pub fn set_io_mode(&mut self, mode: IoMode) -> Result<()> {
        self.command(Frame::new(opcode::SET_IO_MODE, vec![mode.code()]))?;
        Ok(())
    }

    /// Reset the given output pins; an empty list resets all of them.
    pub fn reset_io(&mut self, outputs: &[u8]) -> Result<()> {
        let payload = if outputs.is_empty() {
            vec![0xFF]
        } else {
            outputs.to_vec()
        };
        self.command(Frame::new(opcode::RESET_IO, payload))?;
        Ok(())
    }

    pub fn set_pulse_width(&mut self, level: u8) -> Result<()> {
        if level > MAX_PULSE_WIDTH {
            return Err(DeviceError::invalid(format!(
                "pulse width level {level} exceeds {MAX_PULSE_WIDTH}"
            )));
        }
        self.command(Frame::new(opcode::SET_PULSE_WIDTH, vec![level]))?;
        Ok(())
    }

    /// Records loaded at power-up; an empty list disables auto-load.
    pub fn set_auto_load(&mut self, ids: &[u8]) -> Result<()> {
        let set = RecordSet::optional(ids)?;
        if set.len() > AUTO_LOAD_MAX {
            return Err(DeviceError::invalid(format!(
                "auto-load takes at most {AUTO_LOAD_MAX} records, got {}",
                set.len()
            )));
        }
        let map = (0..set.len()).fold(0u8, |map, bit| map | (1 << bit));
        let mut payload = Vec::with_capacity(set.len() + 1);
        payload.push(map);
        payload.extend_from_slice(set.ids());
        self.command(Frame::new(opcode::SET_AUTO_LOAD, payload))?;
        Ok(())
    }

    pub fn disable_auto_load(&mut self) -> Result<()> {
        self.set_auto_load(&[])
    }
}

#[cfg(feature = "serial")]
impl VoiceModule<vrlink_transport::SerialTransport> {
    /// Open the serial port described by `config` with default timing.
    pub fn open(config: &vrlink_transport::SerialConfig) -> Result<Self> {
        let transport = vrlink_transport::SerialTransport::open(config)?;
        Ok(Self::new(transport))
    }

    /// Change the module baud rate, then move the host port to the same rate.
    ///
    /// The acknowledgement still arrives at the old rate.
    pub fn switch_baud_rate(&mut self, rate: u32) -> Result<()> {
        self.set_baud_rate(rate)?;
        self.session.get_mut().set_baud_rate(rate)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use vrlink_session::ErrorKind;
    use vrlink_transport::MockTransport;

    #[test]
    fn check_system_settings_decodes_payload() {
        let mock = MockTransport::new();
        mock.on_write(reply(0x00, &[0x00, 0x05, 0x01, 0x03, 0x01, 0x02]));
        let mut module = module(&mock);

        let settings = module.check_system_settings().unwrap();
        assert_eq!(
            settings,
            SystemSettings {
                baud_rate: 38400,
                io_mode: IoMode::Toggle,
                pulse_width: 3,
                auto_load: true,
                group_control: GroupControl::System,
            }
        );
        assert_eq!(mock.written(), vec![0xAA, 0x02, 0x00, 0x0A]);
    }

    #[test]
    fn check_recognizer_requires_length_13() {
        let mock = MockTransport::new();
        let payload = [1, 3, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 1, 0b1, 0x81];
        mock.on_write(reply(0x01, &payload));
        mock.on_write(reply(0x01, &payload[..10]));
        let mut module = module(&mock);

        let status = module.check_recognizer().unwrap();
        assert_eq!(status.valid, 1);
        assert_eq!(status.slots[0], Some(3));
        assert_eq!(status.group_mode, GroupMode::User(1));

        let err = module.check_recognizer().unwrap_err();
        assert!(matches!(err, DeviceError::MalformedReply { opcode: 0x01, .. }));
    }

    #[test]
    fn set_baud_rate_maps_codes() {
        let mock = MockTransport::new();
        mock.on_write(reply(0x11, &[0x00]));
        let mut module = module(&mock);

        module.set_baud_rate(9600).unwrap();
        assert_eq!(mock.written(), vec![0xAA, 0x03, 0x11, 0x00, 0x0A]);
    }

    #[test]
    fn invalid_arguments_send_nothing() {
        let mock = MockTransport::new();
        let mut module = module(&mock);

        assert!(matches!(
            module.set_baud_rate(115200),
            Err(DeviceError::InvalidArgument(_))
        ));
        assert!(matches!(
            module.set_pulse_width(16),
            Err(DeviceError::InvalidArgument(_))
        ));
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn reset_io_empty_means_all() {
        let mock = MockTransport::new();
        mock.on_write(reply(0x14, &[0x00]));
        mock.on_write(reply(0x14, &[0x00]));
        let mut module = module(&mock);

        module.reset_io(&[]).unwrap();
        module.reset_io(&[1, 3]).unwrap();
        let writes = mock.writes();
        assert_eq!(writes[0], vec![0xAA, 0x03, 0x14, 0xFF, 0x0A]);
        assert_eq!(writes[1], vec![0xAA, 0x04, 0x14, 0x01, 0x03, 0x0A]);
    }

    #[test]
    fn auto_load_bitmap_precedes_ids() {
        let mock = MockTransport::new();
        mock.on_write(reply(0x15, &[0x00]));
        mock.on_write(reply(0x15, &[0x00]));
        let mut module = module(&mock);

        module.set_auto_load(&[4, 9, 2]).unwrap();
        module.disable_auto_load().unwrap();
        let writes = mock.writes();
        assert_eq!(writes[0], vec![0xAA, 0x06, 0x15, 0b111, 4, 9, 2, 0x0A]);
        assert_eq!(writes[1], vec![0xAA, 0x03, 0x15, 0x00, 0x0A]);
    }

    #[test]
    fn auto_load_collapses_duplicates_and_rejects_reserved_id() {
        let mock = MockTransport::new();
        mock.on_write(reply(0x15, &[0x00]));
        let mut module = module(&mock);

        module.set_auto_load(&[4, 4, 2]).unwrap();
        assert_eq!(
            mock.writes()[0],
            vec![0xAA, 0x05, 0x15, 0b11, 4, 2, 0x0A]
        );

        let err = module.set_auto_load(&[1, 255]).unwrap_err();
        assert!(matches!(err, DeviceError::Records(_)));
        let err = module.set_auto_load(&[0, 1, 2, 3, 4, 5, 6, 7, 8]).unwrap_err();
        assert!(matches!(err, DeviceError::InvalidArgument(_)));
        assert_eq!(mock.writes().len(), 1);
    }

    #[test]
    fn recognize_decodes_signature() {
        let mock = MockTransport::new();
        mock.stage(wire(0x0D, &[0x00, 0xFF, 7, 2, 3, b'o', b'f', b'f']));
        let mut module = module(&mock);

        let event = module.recognize(TIMEOUT).unwrap().unwrap();
        assert_eq!(event.record, 7);
        assert_eq!(event.slot, 2);
        assert_eq!(event.group_mode, GroupMode::None);
        assert_eq!(event.signature_text().as_deref(), Some("off"));
    }

    #[test]
    fn recognize_waits_for_late_event() {
        let mock = MockTransport::new();
        mock.stage_after(
            Duration::from_millis(10),
            wire(0x0D, &[0x00, 0x81, 4, 0, 0]),
        );
        let mut module = module(&mock);

        let event = module.recognize(TIMEOUT).unwrap().unwrap();
        assert_eq!(event.record, 4);
        assert_eq!(event.group_mode, GroupMode::User(1));
        assert_eq!(event.signature, None);
    }

    #[test]
    fn recognize_silence_is_none() {
        let mock = MockTransport::new();
        let mut module = module(&mock);
        assert_eq!(module.recognize(TIMEOUT).unwrap(), None);
    }

    #[test]
    fn recognize_other_opcode_is_unexpected() {
        let mock = MockTransport::new();
        mock.stage(wire(0x30, &[0]));
        let mut module = module(&mock);

        let err = module.recognize(TIMEOUT).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::UnexpectedReply));
    }

    #[test]
    fn error_frame_from_module_is_unexpected_reply() {
        let mock = MockTransport::new();
        mock.on_write(reply(0xFF, &[0x01]));
        let mut module = module(&mock);

        let err = module.restore_system_settings().unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::UnexpectedReply));
        assert!(err.to_string().contains("ERROR"));
    }
}
