use std::thread;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tracing::{debug, trace, warn};
use vrlink_frame::{check_header, decode_frame, opcode_name, Addressing, Frame, HEADER_SIZE};
use vrlink_transport::ByteTransport;

use crate::config::{FrameDeadline, SessionConfig};
use crate::error::{Result, SessionError};

/// Synchronous command/response session over one byte transport.
///
/// The session owns the transport and a receive buffer. Each call runs one
/// exchange to completion (or timeout) before returning; nothing runs in the
/// background.
#[derive(Debug)]
pub struct Session<T> {
    transport: T,
    config: SessionConfig,
    tx: BytesMut,
    rx: BytesMut,
}

impl<T: ByteTransport> Session<T> {
    /// Create a session with default timing.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            tx: BytesMut::with_capacity(64),
            rx: BytesMut::with_capacity(256),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Discard everything currently buffered on the input side.
    ///
    /// Returns the number of bytes dropped.
    pub fn drain(&mut self) -> Result<usize> {
        let mut dropped = 0usize;
        while self.transport.bytes_available()? > 0 {
            match self.transport.read_byte()? {
                Some(_) => dropped += 1,
                None => break,
            }
        }
        if dropped > 0 {
            debug!(dropped, "discarded stale input");
        }
        Ok(dropped)
    }

    /// Drain stale input, then write `command` in a single transport write.
    pub fn send(&mut self, command: &Frame) -> Result<()> {
        self.drain()?;

        self.tx.clear();
        command.encode(&mut self.tx)?;
        self.transport.write(&self.tx)?;

        debug!(
            opcode = opcode_name(command.opcode),
            sub_opcode = command.sub_opcode,
            length = command.length(),
            "frame sent"
        );
        Ok(())
    }

    /// Receive one frame, waiting at most `timeout` for each read.
    pub fn receive_one(&mut self, timeout: Duration) -> Result<Frame> {
        match self.receive_frame(timeout)? {
            Some(frame) => Ok(frame),
            None => Err(SessionError::Timeout {
                waited: timeout,
                partial: 0,
            }),
        }
    }

    /// Send `command` and return its single reply.
    ///
    /// A reply from another family is discarded and reported as
    /// [`SessionError::UnexpectedReply`].
    pub fn exchange(&mut self, command: &Frame, timeout: Duration) -> Result<Frame> {
        self.send(command)?;
        let reply = self.receive_one(timeout)?;
        if reply.opcode != command.family() {
            warn!(
                expected = opcode_name(command.family()),
                found = opcode_name(reply.opcode),
                "discarding reply from another command family"
            );
            return Err(SessionError::UnexpectedReply {
                expected: command.family(),
                found: reply.opcode,
            });
        }
        Ok(reply)
    }

    /// Receive one frame; `Ok(None)` when the line stayed silent for the
    /// whole timeout. A frame that starts but does not finish is an error.
    pub(crate) fn receive_frame(&mut self, timeout: Duration) -> Result<Option<Frame>> {
        self.rx.clear();

        let header_deadline = Instant::now() + timeout;
        let got = self.read_into(HEADER_SIZE, header_deadline)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_SIZE {
            return Err(SessionError::Timeout {
                waited: timeout,
                partial: got,
            });
        }

        let length = check_header(self.rx[0], self.rx[1])?;

        let body_deadline = match self.config.frame_deadline {
            FrameDeadline::PerRead => Instant::now() + timeout,
            FrameDeadline::WholeFrame => header_deadline,
        };
        let got = self.read_into(length, body_deadline)?;
        if got < length {
            return Err(SessionError::Timeout {
                waited: timeout,
                partial: HEADER_SIZE + got,
            });
        }

        let frame = decode_frame(&self.rx, Addressing::Plain)?;
        debug!(
            opcode = opcode_name(frame.opcode),
            length,
            "frame received"
        );
        Ok(Some(frame))
    }

    /// Append up to `count` bytes to the receive buffer before `deadline`.
    fn read_into(&mut self, count: usize, deadline: Instant) -> Result<usize> {
        let mut got = 0usize;
        while got < count {
            if let Some(byte) = self.transport.read_byte()? {
                self.rx.extend_from_slice(&[byte]);
                got += 1;
                continue;
            }
            if Instant::now() >= deadline {
                trace!(got, count, "read deadline expired");
                break;
            }
            thread::sleep(self.config.poll_interval);
        }
        Ok(got)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use vrlink_transport::{MockTransport, Reply};

    const SHORT: Duration = Duration::from_millis(40);

    fn wire(frame: &Frame) -> Vec<u8> {
        frame.to_bytes().unwrap().to_vec()
    }

    fn session(mock: &MockTransport) -> Session<MockTransport> {
        Session::with_config(mock.clone(), SessionConfig::uniform(SHORT))
    }

    #[test]
    fn send_drains_stale_input_then_writes_once() {
        let mock = MockTransport::new();
        mock.stage([0xAA, 0x03, 0x0D, 0x00]);
        let mut session = session(&mock);

        session.send(&Frame::new(0x31, Vec::new())).unwrap();

        assert_eq!(mock.pending_input(), 0);
        assert_eq!(mock.writes(), vec![vec![0xAA, 0x02, 0x31, 0x0A]]);
    }

    #[test]
    fn exchange_returns_matching_reply() {
        let mock = MockTransport::new();
        mock.on_write(Reply::new().bytes(wire(&Frame::new(0x30, vec![1, 2, 0]))));
        let mut session = session(&mock);

        let reply = session
            .exchange(&Frame::new(0x30, vec![2]), SHORT)
            .unwrap();
        assert_eq!(reply.opcode, 0x30);
        assert_eq!(reply.status(), Some(1));
    }

    #[test]
    fn exchange_reply_split_across_chunks() {
        let mock = MockTransport::new();
        mock.on_write(
            Reply::new()
                .bytes([0xAA, 0x03])
                .after(Duration::from_millis(10), [0x31, 0x00, 0x0A]),
        );
        let mut session = session(&mock);

        let reply = session.exchange(&Frame::new(0x31, Vec::new()), SHORT).unwrap();
        assert_eq!(reply.payload.as_ref(), &[0x00]);
    }

    #[test]
    fn exchange_rejects_wrong_family_without_leaking() {
        let mock = MockTransport::new();
        mock.on_write(Reply::new().bytes(wire(&Frame::new(0x0D, vec![0, 1, 2, 3, 0]))));
        mock.on_write(Reply::new().bytes(wire(&Frame::new(0x31, vec![0]))));
        let mut session = session(&mock);

        let err = session
            .exchange(&Frame::new(0x30, vec![1]), SHORT)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedReply);

        let reply = session.exchange(&Frame::new(0x31, Vec::new()), SHORT).unwrap();
        assert_eq!(reply.opcode, 0x31);
    }

    #[test]
    fn silent_line_times_out() {
        let mock = MockTransport::new();
        let mut session = session(&mock);

        let err = session.exchange(&Frame::new(0x00, Vec::new()), SHORT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.is_silence());
    }

    #[test]
    fn short_header_is_timeout() {
        let mock = MockTransport::new();
        mock.on_write(Reply::new().bytes([0xAA]));
        let mut session = session(&mock);

        let err = session.exchange(&Frame::new(0x00, Vec::new()), SHORT).unwrap_err();
        assert!(matches!(err, SessionError::Timeout { partial: 1, .. }));
    }

    #[test]
    fn truncated_body_is_timeout_not_framing() {
        let mock = MockTransport::new();
        mock.on_write(Reply::new().bytes([0xAA, 0x05, 0x30, 0x01]));
        let mut session = session(&mock);

        let err = session.exchange(&Frame::new(0x30, vec![1]), SHORT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(matches!(err, SessionError::Timeout { partial: 4, .. }));
    }

    #[test]
    fn bad_markers_are_framing_errors() {
        let mock = MockTransport::new();
        mock.on_write(Reply::new().bytes([0x55, 0x02, 0x31, 0x0A]));
        mock.on_write(Reply::new().bytes([0xAA, 0x01, 0x31]));
        mock.on_write(Reply::new().bytes([0xAA, 0x02, 0x31, 0x0B]));
        let mut session = session(&mock);
        let clear = Frame::new(0x31, Vec::new());

        for _ in 0..3 {
            let err = session.exchange(&clear, SHORT).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Framing, "{err}");
        }
    }

    #[test]
    fn late_reply_is_drained_before_next_exchange() {
        let mock = MockTransport::new();
        mock.on_write(
            Reply::new().after(Duration::from_millis(60), wire(&Frame::new(0x30, vec![9]))),
        );
        mock.on_write(Reply::new().bytes(wire(&Frame::new(0x31, vec![0]))));
        let mut session = session(&mock);

        let err = session
            .exchange(&Frame::new(0x30, vec![1]), Duration::from_millis(20))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);

        thread::sleep(Duration::from_millis(80));
        assert!(mock.pending_input() > 0);

        let reply = session.exchange(&Frame::new(0x31, Vec::new()), SHORT).unwrap();
        assert_eq!(reply.opcode, 0x31);
        assert_eq!(reply.status(), Some(0));
    }

    #[test]
    fn per_read_deadline_restarts_for_body() {
        let mock = MockTransport::new();
        mock.on_write(
            Reply::new()
                .after(Duration::from_millis(25), [0xAA, 0x03])
                .after(Duration::from_millis(50), [0x31, 0x00, 0x0A]),
        );
        let mut session = session(&mock);

        let reply = session.exchange(&Frame::new(0x31, Vec::new()), SHORT).unwrap();
        assert_eq!(reply.opcode, 0x31);
    }

    #[test]
    fn whole_frame_deadline_covers_both_reads() {
        let mock = MockTransport::new();
        mock.on_write(
            Reply::new()
                .after(Duration::from_millis(25), [0xAA, 0x03])
                .after(Duration::from_millis(70), [0x31, 0x00, 0x0A]),
        );
        let mut config = SessionConfig::uniform(SHORT);
        config.frame_deadline = FrameDeadline::WholeFrame;
        let mut session = Session::with_config(mock.clone(), config);

        let err = session.exchange(&Frame::new(0x31, Vec::new()), SHORT).unwrap_err();
        assert!(matches!(err, SessionError::Timeout { partial: 2, .. }));
    }

    #[test]
    fn transport_failure_surfaces() {
        let mock = MockTransport::new();
        mock.close();
        let mut session = session(&mock);

        let err = session.send(&Frame::new(0x31, Vec::new())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn receive_one_reads_unsolicited_frames() {
        let mock = MockTransport::new();
        mock.stage(wire(&Frame::new(0x0D, vec![0, 0, 3, 0, 0])));
        let mut session = session(&mock);

        let frame = session.receive_one(SHORT).unwrap();
        assert_eq!(frame.opcode, 0x0D);
        assert_eq!(frame.payload[2], 3);
    }
}
