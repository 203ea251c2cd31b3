//! Request/response session engine for the voice-recognition module.
//!
//! A [`Session`] owns a byte transport and runs one exchange at a time:
//! drain stale input, send a command frame, then receive either a single
//! reply or a multi-frame answer under a [`CollectPolicy`].

pub mod collect;
pub mod config;
pub mod engine;
pub mod error;
pub mod records;

pub use collect::{CollectPolicy, Collected, Outcome};
pub use config::{FrameDeadline, SessionConfig};
pub use engine::Session;
pub use error::{ErrorKind, Result, SessionError};
pub use records::{normalize, RecordError, RecordSet, ALL_RECORDS, MAX_RECORD_ID};
