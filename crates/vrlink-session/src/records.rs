//! Record-id lists as sent to the module.

use std::collections::HashSet;

/// Wire marker meaning "every record" in queries and "none" in replies.
pub const ALL_RECORDS: u8 = 0xFF;

/// Highest addressable record id.
pub const MAX_RECORD_ID: u8 = 254;

/// Errors raised while building a record-id list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The command needs at least one record id.
    #[error("at least one record id is required")]
    Empty,

    /// Id 255 is reserved by the protocol.
    #[error("record id {0} is reserved (max {MAX_RECORD_ID})")]
    Reserved(u8),
}

/// Remove duplicate ids, keeping the first occurrence of each in order.
pub fn normalize(ids: &[u8]) -> Vec<u8> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        if seen.insert(id) {
            out.push(id);
        }
    }
    out
}

/// A validated, deduplicated record-id list.
///
/// An empty set built with [`RecordSet::optional`] stands for every record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSet {
    ids: Vec<u8>,
}

impl RecordSet {
    /// Build a set that must name at least one record.
    pub fn required(ids: &[u8]) -> Result<Self, RecordError> {
        if ids.is_empty() {
            return Err(RecordError::Empty);
        }
        Self::optional(ids)
    }

    /// Build a set where an empty list means every record.
    pub fn optional(ids: &[u8]) -> Result<Self, RecordError> {
        if let Some(&id) = ids.iter().find(|&&id| id > MAX_RECORD_ID) {
            return Err(RecordError::Reserved(id));
        }
        Ok(Self {
            ids: normalize(ids),
        })
    }

    pub fn is_all(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[u8] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The ids as command payload; [`ALL_RECORDS`] when the set is "all".
    pub fn to_payload(&self) -> Vec<u8> {
        if self.is_all() {
            vec![ALL_RECORDS]
        } else {
            self.ids.clone()
        }
    }
}
