use std::collections::BTreeMap;

use tracing::{debug, info};
use vrlink_frame::{opcode, Frame};
use vrlink_session::{CollectPolicy, Collected, RecordSet};
use vrlink_transport::ByteTransport;

use crate::error::{DeviceError, Result};
use crate::module::VoiceModule;
use crate::reply;
use crate::types::{
    LoadOutcome, LoadResult, Prompt, RecordReport, RecordState, Signature, TrainOutcome,
    TrainResult,
};

/// Frames the module sends for a full record check.
const RECORD_CHECK_FRAMES: usize = 51;

impl<T: ByteTransport> VoiceModule<T> {
    /// Report train state of `ids`, or of every record when `ids` is empty.
    pub fn check_records(&mut self, ids: &[u8]) -> Result<RecordReport> {
        let set = RecordSet::optional(ids)?;
        let command = Frame::new(opcode::CHECK_TRAIN, set.to_payload());

        if !set.is_all() {
            let reply = self.command(command)?;
            let payload = reply::require(&reply, 1)?;
            let records = reply::pairs(reply.opcode, &payload[1..])?
                .into_iter()
                .map(|(record, state)| RecordState {
                    record,
                    state: state.into(),
                })
                .collect();
            return Ok(RecordReport {
                trained: payload[0],
                records,
            });
        }

        let idle = self.session.config().query_idle_timeout;
        let collected = self.session.collect_until(
            &command,
            &CollectPolicy::SentinelOrIdle(RECORD_CHECK_FRAMES),
            idle,
        )?;

        let mut merged = BTreeMap::new();
        for frame in &collected.frames {
            let payload = reply::require(frame, 1)?;
            for (record, state) in reply::pairs(frame.opcode, &payload[1..])? {
                merged.insert(record, state);
            }
        }
        debug!(
            frames = collected.len(),
            records = merged.len(),
            "record check complete"
        );

        Ok(RecordReport {
            trained: collected.status().unwrap_or_default(),
            records: merged
                .into_iter()
                .map(|(record, state)| RecordState {
                    record,
                    state: state.into(),
                })
                .collect(),
        })
    }

    /// Train `ids` one after another. The module prompts for each record.
    pub fn train(&mut self, ids: &[u8]) -> Result<TrainOutcome> {
        let set = RecordSet::required(ids)?;
        let collected = self.train_command(Frame::new(opcode::TRAIN, set.to_payload()))?;
        let prompts = prompts(&collected);

        let reply = last(&collected)?;
        let payload = reply::require(reply, 1)?;
        Ok(TrainOutcome {
            trained: payload[0],
            records: train_results(reply.opcode, &payload[1..])?,
            signature: None,
            prompts,
        })
    }

    /// Train one record and attach `signature` to it.
    pub fn train_with_signature(
        &mut self,
        record: u8,
        signature: &Signature,
    ) -> Result<TrainOutcome> {
        RecordSet::required(&[record])?;
        let mut payload = Vec::with_capacity(signature.as_bytes().len() + 1);
        payload.push(record);
        payload.extend_from_slice(signature.as_bytes());

        let collected = self.train_command(Frame::new(opcode::SIGNATURE_TRAIN, payload))?;
        let prompts = prompts(&collected);

        let reply = last(&collected)?;
        let payload = reply::require(reply, 3)?;
        let echoed = &payload[3..];
        Ok(TrainOutcome {
            trained: payload[0],
            records: train_results(reply.opcode, &payload[1..3])?,
            signature: (!echoed.is_empty()).then(|| echoed.to_vec()),
            prompts,
        })
    }

    pub fn set_signature(&mut self, record: u8, signature: &Signature) -> Result<()> {
        RecordSet::required(&[record])?;
        let mut payload = Vec::with_capacity(signature.as_bytes().len() + 1);
        payload.push(record);
        payload.extend_from_slice(signature.as_bytes());
        self.command(Frame::new(opcode::SET_SIGNATURE, payload))?;
        Ok(())
    }

    pub fn delete_signature(&mut self, record: u8) -> Result<()> {
        RecordSet::required(&[record])?;
        self.command(Frame::new(opcode::SET_SIGNATURE, vec![record]))?;
        Ok(())
    }

    /// Read the signature of `record`; `None` when it has none.
    pub fn check_signature(&mut self, record: u8) -> Result<Option<Vec<u8>>> {
        RecordSet::required(&[record])?;
        let reply = self.command(Frame::new(opcode::CHECK_SIGNATURE, vec![record]))?;
        let payload = reply::require(&reply, 2)?;

        let len = usize::from(payload[1]);
        if len == 0 {
            return Ok(None);
        }
        let signature = payload.get(2..2 + len).ok_or_else(|| {
            DeviceError::malformed(reply.opcode, format!("signature of {len} bytes is cut short"))
        })?;
        Ok(Some(signature.to_vec()))
    }

    /// Load records into the recognizer.
    pub fn load(&mut self, ids: &[u8]) -> Result<LoadOutcome> {
        let set = RecordSet::required(ids)?;
        let reply = self.command(Frame::new(opcode::LOAD, set.to_payload()))?;
        let payload = reply::require(&reply, 1)?;

        let records = reply::pairs(reply.opcode, &payload[1..])?
            .into_iter()
            .map(|(record, status)| LoadResult {
                record,
                status: status.into(),
            })
            .collect();
        Ok(LoadOutcome {
            loaded: payload[0],
            records,
        })
    }

    /// Remove every record from the recognizer.
    pub fn clear(&mut self) -> Result<()> {
        self.command(Frame::new(opcode::CLEAR, Vec::new()))?;
        Ok(())
    }

    fn train_command(&mut self, command: Frame) -> Result<Collected> {
        let idle = self.session.config().train_idle_timeout;
        let policy = CollectPolicy::SingleWithIdleFallback {
            diagnostics: vec![opcode::PROMPT],
        };
        Ok(self.session.collect_until(&command, &policy, idle)?)
    }
}

fn last(collected: &Collected) -> Result<&Frame> {
    // A successful single-reply collection always holds its frame.
    collected
        .last()
        .ok_or_else(|| DeviceError::malformed(opcode::TRAIN, "no reply frame"))
}

fn prompts(collected: &Collected) -> Vec<Prompt> {
    collected
        .diagnostics
        .iter()
        .filter_map(|frame| {
            let (&record, text) = frame.payload.split_first()?;
            let text = String::from_utf8_lossy(text).trim_end().to_string();
            info!(record, prompt = %text, "training prompt");
            Some(Prompt { record, text })
        })
        .collect()
}

fn train_results(opcode: u8, bytes: &[u8]) -> Result<Vec<TrainResult>> {
    Ok(reply::pairs(opcode, bytes)?
        .into_iter()
        .map(|(record, status)| TrainResult {
            record,
            status: status.into(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::module::testing::*;
    use crate::types::{LoadStatus, TrainState, TrainStatus};
    use vrlink_session::ErrorKind;
    use vrlink_transport::{MockTransport, Reply};

    #[test]
    fn check_records_subset_is_normalized() {
        let mock = MockTransport::new();
        mock.on_write(reply(0x02, &[1, 3, 1, 1, 0]));
        let mut module = module(&mock);

        let report = module.check_records(&[3, 1, 3]).unwrap();
        assert_eq!(mock.written(), vec![0xAA, 0x04, 0x02, 3, 1, 0x0A]);
        assert_eq!(report.trained, 1);
        assert_eq!(report.records[0].state, TrainState::Trained);
        assert_eq!(report.records[1].state, TrainState::Untrained);
    }

    #[test]
    fn check_records_all_merges_frames_on_idle() {
        let mock = MockTransport::new();
        let mut bytes = wire(0x02, &[2, 0, 1, 1, 1]);
        bytes.extend(wire(0x02, &[2, 3, 0, 2, 0]));
        mock.on_write(Reply::new().bytes(bytes));
        let mut module = module(&mock);

        let report = module.check_records(&[]).unwrap();
        assert_eq!(mock.written(), vec![0xAA, 0x03, 0x02, 0xFF, 0x0A]);
        let ids: Vec<u8> = report.records.iter().map(|r| r.record).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(report.trained, 2);
    }

    #[test]
    fn check_records_all_silent_is_timeout() {
        let mock = MockTransport::new();
        let mut module = module(&mock);

        let err = module.check_records(&[]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Timeout));
    }

    #[test]
    fn train_collects_prompts() {
        let mock = MockTransport::new();
        mock.on_write(
            Reply::new()
                .bytes(wire(0x0A, b"\x05Speak now\r\n"))
                .after(Duration::from_millis(20), wire(0x0A, b"\x05Speak again\r\n"))
                .after(Duration::from_millis(40), wire(0x20, &[1, 5, 0x00])),
        );
        let mut module = module(&mock);

        let outcome = module.train(&[5, 5]).unwrap();
        assert_eq!(mock.written(), vec![0xAA, 0x03, 0x20, 5, 0x0A]);
        assert_eq!(outcome.trained, 1);
        assert_eq!(outcome.records[0].status, TrainStatus::Trained);
        assert_eq!(outcome.prompts.len(), 2);
        assert_eq!(outcome.prompts[1].text, "Speak again");
    }

    #[test]
    fn train_requires_records() {
        let mock = MockTransport::new();
        let mut module = module(&mock);

        assert!(matches!(module.train(&[]), Err(DeviceError::Records(_))));
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn train_with_foreign_frame_is_protocol_violation() {
        let mock = MockTransport::new();
        mock.on_write(reply(0x0D, &[0, 0xFF, 1, 0, 0]));
        let mut module = module(&mock);

        let err = module.train(&[1]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ProtocolViolation));
    }

    #[test]
    fn signature_train_echoes_signature() {
        let mock = MockTransport::new();
        mock.on_write(reply(0x21, &[1, 2, 0xF0, b'l', b'i']));
        let mut module = module(&mock);

        let sig = Signature::text("light").unwrap();
        let outcome = module.train_with_signature(2, &sig).unwrap();
        assert_eq!(mock.written()[2..4], [0x21, 2]);
        assert_eq!(outcome.records[0].status, TrainStatus::SignatureTruncated);
        assert_eq!(outcome.signature.as_deref(), Some(&b"li"[..]));
    }

    #[test]
    fn signature_set_check_delete() {
        let mock = MockTransport::new();
        mock.on_write(reply(0x22, &[0]));
        mock.on_write(reply(0x03, &[0, 3, b'f', b'a', b'n']));
        mock.on_write(reply(0x22, &[0]));
        mock.on_write(reply(0x03, &[0, 0]));
        let mut module = module(&mock);

        module
            .set_signature(4, &Signature::text("fan").unwrap())
            .unwrap();
        assert_eq!(module.check_signature(4).unwrap(), Some(b"fan".to_vec()));
        module.delete_signature(4).unwrap();
        assert_eq!(module.check_signature(4).unwrap(), None);

        let writes = mock.writes();
        assert_eq!(writes[2], vec![0xAA, 0x03, 0x22, 4, 0x0A]);
    }

    #[test]
    fn load_reports_per_record_status() {
        let mock = MockTransport::new();
        mock.on_write(reply(0x30, &[1, 0, 0x00, 9, 0xFE]));
        let mut module = module(&mock);

        let outcome = module.load(&[0, 9, 0]).unwrap();
        assert_eq!(mock.written(), vec![0xAA, 0x04, 0x30, 0, 9, 0x0A]);
        assert_eq!(outcome.loaded, 1);
        assert_eq!(outcome.records[1].status, LoadStatus::Untrained);
    }

    #[test]
    fn clear_then_load_after_timeout() {
        let mock = MockTransport::new();
        mock.on_write(Reply::new().after(Duration::from_millis(60), wire(0x31, &[0])));
        mock.on_write(reply(0x30, &[1, 0, 0x00]));
        let mut module = module(&mock);

        let err = module.clear().unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Timeout));

        std::thread::sleep(Duration::from_millis(80));
        let outcome = module.load(&[0]).unwrap();
        assert_eq!(outcome.loaded, 1);
    }
}
