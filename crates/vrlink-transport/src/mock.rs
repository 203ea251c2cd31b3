//! Scripted in-memory transport.
//!
//! Stands in for the peripheral in tests and dry runs. Replies are queued up
//! front and released only after the next write, optionally with a delay, so
//! the stale-input drain performed before every send does not swallow them.
//! Bytes staged with [`MockTransport::stage`] are visible immediately and play
//! the part of leftovers from an earlier exchange or unsolicited frames.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::ByteTransport;

/// Bytes the scripted peripheral sends back after one write.
///
/// Each chunk carries an offset measured from the moment of the write.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    chunks: Vec<(Duration, Vec<u8>)>,
}

impl Reply {
    /// A reply with no bytes; the peripheral stays silent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes released as soon as the write lands.
    pub fn bytes(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.after(Duration::ZERO, bytes)
    }

    /// Bytes released `delay` after the write.
    pub fn after(mut self, delay: Duration, bytes: impl Into<Vec<u8>>) -> Self {
        self.chunks.push((delay, bytes.into()));
        self
    }

    /// True when the reply releases no bytes at all.
    pub fn is_silent(&self) -> bool {
        self.chunks.iter().all(|(_, bytes)| bytes.is_empty())
    }
}

#[derive(Debug, Default)]
struct MockState {
    input: VecDeque<u8>,
    scheduled: Vec<(Instant, Vec<u8>)>,
    replies: VecDeque<Reply>,
    writes: Vec<Vec<u8>>,
    closed: bool,
}

impl MockState {
    fn schedule(&mut self, due: Instant, bytes: Vec<u8>) {
        let at = self
            .scheduled
            .iter()
            .position(|(existing, _)| *existing > due)
            .unwrap_or(self.scheduled.len());
        self.scheduled.insert(at, (due, bytes));
    }

    fn release_due(&mut self) {
        let now = Instant::now();
        let due = self
            .scheduled
            .iter()
            .take_while(|(at, _)| *at <= now)
            .count();
        for (_, bytes) in self.scheduled.drain(..due) {
            self.input.extend(bytes);
        }
    }
}

/// In-memory [`ByteTransport`] driven by a script.
///
/// Cloning yields another handle onto the same script, so a test can move one
/// handle into a session and keep the other to inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make bytes readable immediately.
    pub fn stage(&self, bytes: impl Into<Vec<u8>>) {
        self.state().input.extend(bytes.into());
    }

    /// Make bytes readable after `delay`, independent of any write.
    pub fn stage_after(&self, delay: Duration, bytes: impl Into<Vec<u8>>) {
        self.state().schedule(Instant::now() + delay, bytes.into());
    }

    /// Queue the reply released by the next write that has no reply yet.
    pub fn on_write(&self, reply: Reply) {
        self.state().replies.push_back(reply);
    }

    /// Every write so far, one entry per call.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state().writes.clone()
    }

    /// Every written byte so far, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state().writes.concat()
    }

    /// Bytes readable right now.
    pub fn pending_input(&self) -> usize {
        let mut state = self.state();
        state.release_due();
        state.input.len()
    }

    /// Replies queued but not yet triggered by a write.
    pub fn queued_replies(&self) -> usize {
        self.state().replies.len()
    }

    /// Simulate the link going away; later writes fail.
    pub fn close(&self) {
        self.state().closed = true;
    }
}

impl ByteTransport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state();
        if state.closed {
            return Err(TransportError::Closed);
        }

        trace!(len = bytes.len(), "mock transport write");
        state.writes.push(bytes.to_vec());

        if let Some(reply) = state.replies.pop_front() {
            let now = Instant::now();
            for (delay, chunk) in reply.chunks {
                state.schedule(now + delay, chunk);
            }
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut state = self.state();
        state.release_due();
        Ok(state.input.pop_front())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let mut state = self.state();
        state.release_due();
        Ok(state.input.len())
    }
}
