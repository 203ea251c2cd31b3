use tracing::debug;
use vrlink_frame::{opcode, Frame};
use vrlink_session::{CollectPolicy, RecordSet};
use vrlink_transport::ByteTransport;

use crate::error::{DeviceError, Result};
use crate::module::VoiceModule;
use crate::reply::{self, RECOGNIZER_PAYLOAD};
use crate::types::{
    GroupControl, RecognizerStatus, UserGroup, MAX_SYSTEM_GROUP, MAX_USER_GROUP, SLOT_COUNT,
};

/// Length field of one user group reply.
const USER_GROUP_REPLY_LENGTH: usize = 10;

/// Number of user groups reported by a full group check.
const USER_GROUP_COUNT: usize = MAX_USER_GROUP as usize + 1;

/// Query value for the group control setting.
const QUERY: u8 = 0xFF;

impl<T: ByteTransport> VoiceModule<T> {
    pub fn set_group_control(&mut self, control: GroupControl) -> Result<()> {
        self.group_command(opcode::GROUP_SET_CONTROL, vec![control.code()])?;
        Ok(())
    }

    pub fn check_group_control(&mut self) -> Result<GroupControl> {
        let reply = self.group_command(opcode::GROUP_SET_CONTROL, vec![QUERY])?;
        let payload = reply::require(&reply, 3)?;
        GroupControl::from_code(payload[2]).ok_or_else(|| {
            DeviceError::malformed(reply.opcode, format!("unknown group control {}", payload[2]))
        })
    }

    /// Assign up to seven records to user group `group`, one per slot.
    pub fn set_user_group(&mut self, group: u8, ids: &[u8]) -> Result<()> {
        check_user_group_number(group)?;
        let set = RecordSet::required(ids)?;
        if set.len() > SLOT_COUNT {
            return Err(DeviceError::invalid(format!(
                "a user group holds at most {SLOT_COUNT} records, got {}",
                set.len()
            )));
        }

        let mut payload = Vec::with_capacity(set.len() + 1);
        payload.push(group);
        payload.extend_from_slice(set.ids());
        self.group_command(opcode::GROUP_SET_USER, payload)?;
        Ok(())
    }

    /// Read one user group, or every user group when `group` is `None`.
    pub fn check_user_group(&mut self, group: Option<u8>) -> Result<Vec<UserGroup>> {
        let frames = match group {
            Some(group) => {
                check_user_group_number(group)?;
                vec![self.group_command(opcode::GROUP_CHECK_USER, vec![group])?]
            }
            None => {
                let command = Frame::addressed(opcode::GROUP, opcode::GROUP_CHECK_USER, Vec::new());
                let idle = self.session.config().query_idle_timeout;
                self.session
                    .collect_until(&command, &CollectPolicy::SentinelOrIdle(USER_GROUP_COUNT), idle)?
                    .frames
            }
        };

        frames
            .iter()
            .map(|frame| {
                let payload = reply::require_length(frame, USER_GROUP_REPLY_LENGTH)?;
                Ok(UserGroup {
                    group: payload[0],
                    slots: reply::slots(&payload[1..]),
                })
            })
            .collect()
    }

    /// Load system group `group` (0..=10) into the recognizer.
    pub fn load_system_group(&mut self, group: u8) -> Result<RecognizerStatus> {
        if group > MAX_SYSTEM_GROUP {
            return Err(DeviceError::invalid(format!(
                "system group {group} exceeds {MAX_SYSTEM_GROUP}"
            )));
        }
        self.load_group(opcode::GROUP_LOAD_SYSTEM, group)
    }

    /// Load user group `group` (0..=7) into the recognizer.
    pub fn load_user_group(&mut self, group: u8) -> Result<RecognizerStatus> {
        check_user_group_number(group)?;
        self.load_group(opcode::GROUP_LOAD_USER, group)
    }

    fn load_group(&mut self, sub_opcode: u8, group: u8) -> Result<RecognizerStatus> {
        let reply = self.group_command(sub_opcode, vec![group])?;
        let payload = reply::require(&reply, RECOGNIZER_PAYLOAD)?;

        // Group loads report the valid count through the bitmap only.
        let mut status = reply::recognizer_status(payload);
        status.valid = status.valid_bitmap.count_ones() as u8;
        debug!(group, valid = status.valid, "group loaded");
        Ok(status)
    }

    fn group_command(&mut self, sub_opcode: u8, payload: Vec<u8>) -> Result<Frame> {
        self.command(Frame::addressed(opcode::GROUP, sub_opcode, payload))
    }
}

fn check_user_group_number(group: u8) -> Result<()> {
    if group > MAX_USER_GROUP {
        return Err(DeviceError::invalid(format!(
            "user group {group} exceeds {MAX_USER_GROUP}"
        )));
    }
    Ok(())
}
