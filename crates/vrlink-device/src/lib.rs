//! Typed command surface for the voice-recognition module.
//!
//! [`VoiceModule`] turns each module command into one session exchange with
//! the right collection policy and timeout, then decodes the reply into the
//! types in [`types`]. [`SharedModule`] serializes access from several
//! threads.

pub mod error;
pub mod group;
pub mod module;
mod reply;
pub mod self_test;
pub mod shared;
pub mod training;
pub mod types;

pub use error::{DeviceError, Result};
pub use module::VoiceModule;
pub use self_test::{TEST_BLOCKS, TEST_BLOCK_SIZE, TEST_IMAGE_SIZE};
pub use shared::SharedModule;
pub use types::{
    baud_code, baud_rate, GroupControl, GroupMode, IoMode, LoadOutcome, LoadResult, LoadStatus,
    Prompt, RecognizerStatus, Recognition, RecordReport, RecordState, Signature, SystemSettings,
    TrainOutcome, TrainResult, TrainState, TrainStatus, UserGroup, BAUD_RATES, MAX_PULSE_WIDTH,
    MAX_SYSTEM_GROUP, MAX_TEXT_SIGNATURE, MAX_USER_GROUP, SLOT_COUNT,
};
