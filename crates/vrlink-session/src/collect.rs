//! Multi-frame reply collection.
//!
//! A command may be answered by several frames. The caller picks a
//! [`CollectPolicy`] saying when the answer is complete; the session applies
//! it without knowing anything about specific opcodes.

use std::time::Duration;

use tracing::debug;
use vrlink_frame::{opcode_name, Frame};
use vrlink_transport::ByteTransport;

use crate::engine::Session;
use crate::error::{Result, SessionError};

/// When a multi-frame reply is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectPolicy {
    /// Exactly `n` in-family frames. Silence before the last is a timeout.
    FixedCount(usize),
    /// Up to `max` in-family frames; silence after at least one frame ends
    /// the reply successfully.
    SentinelOrIdle(usize),
    /// One in-family frame. Frames whose opcode is listed in `diagnostics`
    /// may arrive first and are passed through.
    SingleWithIdleFallback { diagnostics: Vec<u8> },
}

impl CollectPolicy {
    /// A single reply with no diagnostics permitted.
    pub fn single() -> Self {
        Self::SingleWithIdleFallback {
            diagnostics: Vec::new(),
        }
    }

    fn limit(&self) -> usize {
        match self {
            Self::FixedCount(n) | Self::SentinelOrIdle(n) => *n,
            Self::SingleWithIdleFallback { .. } => 1,
        }
    }
}

/// How a successful collection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The expected number of frames arrived.
    Complete,
    /// The frame limit was reached.
    Full,
    /// The line went quiet after at least one frame.
    Idle,
}

/// Frames gathered for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    /// In-family frames in arrival order.
    pub frames: Vec<Frame>,
    /// Pass-through diagnostic frames in arrival order.
    pub diagnostics: Vec<Frame>,
    pub outcome: Outcome,
}

impl Collected {
    /// Status byte of the final accepted frame.
    pub fn status(&self) -> Option<u8> {
        self.frames.last().and_then(Frame::status)
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl<T: ByteTransport> Session<T> {
    /// Send `command` and gather its reply frames under `policy`.
    ///
    /// Every accepted frame restarts the `per_frame_timeout` idle window. A
    /// frame that starts but does not finish is a timeout under every policy.
    pub fn collect_until(
        &mut self,
        command: &Frame,
        policy: &CollectPolicy,
        per_frame_timeout: Duration,
    ) -> Result<Collected> {
        self.send(command)?;

        let family = command.family();
        let limit = policy.limit();
        let mut frames = Vec::new();
        let mut diagnostics = Vec::new();

        while frames.len() < limit {
            let Some(frame) = self.receive_frame(per_frame_timeout)? else {
                return idle(family, policy, frames, diagnostics, per_frame_timeout);
            };

            if frame.opcode == family {
                frames.push(frame);
                debug!(
                    opcode = opcode_name(family),
                    received = frames.len(),
                    limit,
                    "collected reply frame"
                );
                continue;
            }

            match policy {
                CollectPolicy::SingleWithIdleFallback { diagnostics: allowed }
                    if allowed.contains(&frame.opcode) =>
                {
                    debug!(
                        opcode = opcode_name(frame.opcode),
                        len = frame.payload.len(),
                        "passing diagnostic frame through"
                    );
                    diagnostics.push(frame);
                }
                CollectPolicy::SingleWithIdleFallback { .. } => {
                    return Err(SessionError::ProtocolViolation {
                        expected: family,
                        found: frame.opcode,
                    });
                }
                CollectPolicy::FixedCount(_) | CollectPolicy::SentinelOrIdle(_) => {
                    return Err(SessionError::UnexpectedReply {
                        expected: family,
                        found: frame.opcode,
                    });
                }
            }
        }

        let outcome = match policy {
            CollectPolicy::SentinelOrIdle(_) => Outcome::Full,
            _ => Outcome::Complete,
        };
        Ok(Collected {
            frames,
            diagnostics,
            outcome,
        })
    }
}

fn idle(
    family: u8,
    policy: &CollectPolicy,
    frames: Vec<Frame>,
    diagnostics: Vec<Frame>,
    waited: Duration,
) -> Result<Collected> {
    match policy {
        CollectPolicy::SentinelOrIdle(_) if !frames.is_empty() => {
            debug!(
                opcode = opcode_name(family),
                received = frames.len(),
                "reply ended on idle"
            );
            Ok(Collected {
                frames,
                diagnostics,
                outcome: Outcome::Idle,
            })
        }
        _ => Err(SessionError::Timeout { waited, partial: 0 }),
    }
}
