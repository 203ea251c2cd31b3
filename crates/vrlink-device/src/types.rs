//! Typed views of module settings and replies.

use serde::{Deserialize, Serialize};

/// Number of slots in the recognizer and in each user group.
pub const SLOT_COUNT: usize = 7;

/// Marker for an empty recognizer or group slot.
pub const EMPTY_SLOT: u8 = 0xFF;

/// Longest signature accepted when given as text.
pub const MAX_TEXT_SIGNATURE: usize = 10;

/// Highest user group number.
pub const MAX_USER_GROUP: u8 = 7;

/// Highest system group number.
pub const MAX_SYSTEM_GROUP: u8 = 10;

/// Highest pulse width level.
pub const MAX_PULSE_WIDTH: u8 = 15;

/// Baud rates the module can be switched to.
pub const BAUD_RATES: [u32; 5] = [2400, 4800, 9600, 19200, 38400];

/// Module code for a host baud rate.
pub fn baud_code(rate: u32) -> Option<u8> {
    match rate {
        2400 => Some(1),
        4800 => Some(2),
        9600 => Some(0),
        19200 => Some(4),
        38400 => Some(5),
        _ => None,
    }
}

/// Host baud rate for a module code. Codes 0 and 3 both mean 9600.
pub fn baud_rate(code: u8) -> Option<u32> {
    match code {
        0 | 3 => Some(9600),
        1 => Some(2400),
        2 => Some(4800),
        4 => Some(19200),
        5 => Some(38400),
        _ => None,
    }
}

/// How output pins react when a record is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoMode {
    Pulse,
    Toggle,
    Set,
    Clear,
}

impl IoMode {
    pub fn code(self) -> u8 {
        match self {
            Self::Pulse => 0,
            Self::Toggle => 1,
            Self::Set => 2,
            Self::Clear => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Pulse),
            1 => Some(Self::Toggle),
            2 => Some(Self::Set),
            3 => Some(Self::Clear),
            _ => None,
        }
    }
}

/// Whether external IO pins select the active group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupControl {
    Disabled,
    User,
    System,
}

impl GroupControl {
    pub fn code(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::User => 1,
            Self::System => 2,
        }
    }

    /// 0xFF reads back as disabled.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 | 0xFF => Some(Self::Disabled),
            1 => Some(Self::User),
            2 => Some(Self::System),
            _ => None,
        }
    }
}

/// Which group, if any, is loaded in the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "group", rename_all = "snake_case")]
pub enum GroupMode {
    None,
    System(u8),
    User(u8),
}

impl GroupMode {
    pub fn from_code(code: u8) -> Self {
        match code {
            0xFF => Self::None,
            c if c & 0x80 != 0 => Self::User(c & 0x7F),
            c => Self::System(c),
        }
    }
}

/// Persistent module settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub baud_rate: u32,
    pub io_mode: IoMode,
    pub pulse_width: u8,
    pub auto_load: bool,
    pub group_control: GroupControl,
}

/// Recognizer contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizerStatus {
    /// Records currently active.
    pub valid: u8,
    /// Record per slot; `None` for an empty slot.
    pub slots: [Option<u8>; SLOT_COUNT],
    /// Records loaded, active or not.
    pub total: u8,
    /// Bit `i` set when slot `i` is active.
    pub valid_bitmap: u8,
    pub group_mode: GroupMode,
}

/// Train state of one record as reported by a record check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainState {
    Untrained,
    Trained,
    OutOfRange,
    Unknown(u8),
}

impl From<u8> for TrainState {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::Untrained,
            0x01 => Self::Trained,
            0xFF => Self::OutOfRange,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordState {
    pub record: u8,
    pub state: TrainState,
}

/// Result of a record check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReport {
    /// Trained count reported by the module.
    pub trained: u8,
    pub records: Vec<RecordState>,
}

/// Per-record result of a train command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainStatus {
    Trained,
    SignatureTruncated,
    Timeout,
    OutOfRange,
    Unknown(u8),
}

impl From<u8> for TrainStatus {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::Trained,
            0xF0 => Self::SignatureTruncated,
            0xFE => Self::Timeout,
            0xFF => Self::OutOfRange,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainResult {
    pub record: u8,
    pub status: TrainStatus,
}

/// Text the module prints while training a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub record: u8,
    pub text: String,
}

/// Result of a train command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainOutcome {
    /// Records trained successfully.
    pub trained: u8,
    pub records: Vec<TrainResult>,
    /// Signature echoed by a signature train.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
    pub prompts: Vec<Prompt>,
}

/// Per-record result of a load command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Loaded,
    AlreadyLoaded,
    RecognizerFull,
    Untrained,
    OutOfRange,
    Unknown(u8),
}

impl From<u8> for LoadStatus {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::Loaded,
            0xFC => Self::AlreadyLoaded,
            0xFD => Self::RecognizerFull,
            0xFE => Self::Untrained,
            0xFF => Self::OutOfRange,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResult {
    pub record: u8,
    pub status: LoadStatus,
}

/// Result of a load command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOutcome {
    /// Records loaded successfully.
    pub loaded: u8,
    pub records: Vec<LoadResult>,
}

/// One recognition event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    pub group_mode: GroupMode,
    pub record: u8,
    /// Recognizer slot that matched.
    pub slot: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
}

impl Recognition {
    /// Signature as text, with invalid UTF-8 replaced.
    pub fn signature_text(&self) -> Option<String> {
        self.signature
            .as_deref()
            .map(|sig| String::from_utf8_lossy(sig).into_owned())
    }
}

/// Contents of one user group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    pub group: u8,
    pub slots: [Option<u8>; SLOT_COUNT],
}

/// A record signature ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// A text signature of 1 to 10 bytes.
    pub fn text(text: &str) -> crate::Result<Self> {
        if text.is_empty() || text.len() > MAX_TEXT_SIGNATURE {
            return Err(crate::DeviceError::invalid(format!(
                "text signature must be 1..={MAX_TEXT_SIGNATURE} bytes, got {}",
                text.len()
            )));
        }
        Ok(Self(text.as_bytes().to_vec()))
    }

    /// Raw signature bytes; at most one frame payload minus the record byte.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> crate::Result<Self> {
        let bytes = bytes.into();
        let max = vrlink_frame::MAX_PAYLOAD - 1;
        if bytes.is_empty() || bytes.len() > max {
            return Err(crate::DeviceError::invalid(format!(
                "signature must be 1..={max} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

pub(crate) fn slot(code: u8) -> Option<u8> {
    (code != EMPTY_SLOT).then_some(code)
}
