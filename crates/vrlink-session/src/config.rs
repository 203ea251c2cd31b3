use std::time::Duration;

/// How the receive deadline applies across the two reads of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameDeadline {
    /// The header and the body each get a full timeout window.
    #[default]
    PerRead,
    /// One deadline covers the whole frame.
    WholeFrame,
}

/// Timing configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Wait for the single reply to a plain command.
    pub reply_timeout: Duration,
    /// Idle gap ending a multi-frame status query.
    pub query_idle_timeout: Duration,
    /// Idle gap tolerated while the user speaks during training.
    pub train_idle_timeout: Duration,
    /// Idle gap for factory self-test transfers.
    pub test_idle_timeout: Duration,
    /// Sleep between empty polls of the transport.
    pub poll_interval: Duration,
    pub frame_deadline: FrameDeadline,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_secs(1),
            query_idle_timeout: Duration::from_millis(500),
            train_idle_timeout: Duration::from_secs(8),
            test_idle_timeout: Duration::from_secs(4),
            poll_interval: Duration::from_millis(1),
            frame_deadline: FrameDeadline::PerRead,
        }
    }
}

impl SessionConfig {
    /// Scale every timeout to `timeout`, keeping the poll interval.
    ///
    /// Handy for tests and for links known to answer quickly.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            reply_timeout: timeout,
            query_idle_timeout: timeout,
            train_idle_timeout: timeout,
            test_idle_timeout: timeout,
            ..Self::default()
        }
    }
}
