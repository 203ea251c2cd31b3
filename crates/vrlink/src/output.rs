use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use vrlink_device::{
    GroupControl, GroupMode, LoadOutcome, Recognition, RecognizerStatus, RecordReport,
    SystemSettings, TrainOutcome, UserGroup, SLOT_COUNT,
};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A command result that prints as JSON or as table rows.
pub trait Render: Serialize {
    fn headers(&self) -> Vec<&'static str>;
    fn rows(&self) -> Vec<Vec<String>>;
}

pub fn emit<R: Render>(value: &R, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(value.headers());
            for row in value.rows() {
                table.add_row(row);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let headers = value.headers();
            for row in value.rows() {
                let fields: Vec<String> = headers
                    .iter()
                    .zip(row)
                    .map(|(header, cell)| format!("{}={cell}", header.to_lowercase()))
                    .collect();
                println!("{}", fields.join(" "));
            }
        }
        OutputFormat::Raw => {
            for row in value.rows() {
                println!("{}", row.join("\t"));
            }
        }
    }
}

/// Acknowledgement for commands that return nothing but success.
#[derive(Serialize)]
pub struct Done {
    pub command: &'static str,
    pub status: &'static str,
}

impl Done {
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            status: "ok",
        }
    }
}

impl Render for Done {
    fn headers(&self) -> Vec<&'static str> {
        vec!["COMMAND", "STATUS"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![self.command.to_string(), self.status.to_string()]]
    }
}

impl Render for SystemSettings {
    fn headers(&self) -> Vec<&'static str> {
        vec!["BAUD", "IO_MODE", "PULSE_WIDTH", "AUTO_LOAD", "GROUP_CONTROL"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![
            self.baud_rate.to_string(),
            format!("{:?}", self.io_mode).to_lowercase(),
            self.pulse_width.to_string(),
            self.auto_load.to_string(),
            group_control_name(self.group_control).to_string(),
        ]]
    }
}

impl Render for RecognizerStatus {
    fn headers(&self) -> Vec<&'static str> {
        vec!["SLOT", "RECORD", "ACTIVE"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        (0..SLOT_COUNT)
            .map(|slot| {
                vec![
                    slot.to_string(),
                    slot_cell(self.slots[slot]),
                    (self.valid_bitmap & (1 << slot) != 0).to_string(),
                ]
            })
            .collect()
    }
}

impl Render for RecordReport {
    fn headers(&self) -> Vec<&'static str> {
        vec!["RECORD", "STATE"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|entry| vec![entry.record.to_string(), format!("{:?}", entry.state)])
            .collect()
    }
}

impl Render for TrainOutcome {
    fn headers(&self) -> Vec<&'static str> {
        vec!["RECORD", "STATUS", "SIGNATURE"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let signature = self
            .signature
            .as_deref()
            .map(|sig| String::from_utf8_lossy(sig).into_owned())
            .unwrap_or_default();
        self.records
            .iter()
            .map(|result| {
                vec![
                    result.record.to_string(),
                    format!("{:?}", result.status),
                    signature.clone(),
                ]
            })
            .collect()
    }
}

impl Render for LoadOutcome {
    fn headers(&self) -> Vec<&'static str> {
        vec!["RECORD", "STATUS"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|result| vec![result.record.to_string(), format!("{:?}", result.status)])
            .collect()
    }
}

impl Render for Recognition {
    fn headers(&self) -> Vec<&'static str> {
        vec!["RECORD", "SLOT", "GROUP", "SIGNATURE"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![
            self.record.to_string(),
            self.slot.to_string(),
            group_mode_cell(self.group_mode),
            self.signature_text().unwrap_or_default(),
        ]]
    }
}

impl Render for Vec<UserGroup> {
    fn headers(&self) -> Vec<&'static str> {
        vec!["GROUP", "RECORDS"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.iter()
            .map(|group| {
                let records: Vec<String> = group.slots.iter().map(|s| slot_cell(*s)).collect();
                vec![group.group.to_string(), records.join(" ")]
            })
            .collect()
    }
}

#[derive(Serialize)]
pub struct GroupControlOutput {
    pub group_control: GroupControl,
}

impl Render for GroupControlOutput {
    fn headers(&self) -> Vec<&'static str> {
        vec!["GROUP_CONTROL"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![group_control_name(self.group_control).to_string()]]
    }
}

#[derive(Serialize)]
pub struct SignatureOutput {
    pub record: u8,
    pub signature: Option<String>,
    pub signature_hex: Option<String>,
}

impl Render for SignatureOutput {
    fn headers(&self) -> Vec<&'static str> {
        vec!["RECORD", "SIGNATURE", "HEX"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![
            self.record.to_string(),
            self.signature.clone().unwrap_or_default(),
            self.signature_hex.clone().unwrap_or_default(),
        ]]
    }
}

#[derive(Serialize)]
pub struct PortsOutput {
    pub ports: Vec<String>,
}

impl Render for PortsOutput {
    fn headers(&self) -> Vec<&'static str> {
        vec!["PORT"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.ports.iter().map(|port| vec![port.clone()]).collect()
    }
}

#[derive(Serialize)]
pub struct ImageOutput {
    pub size: usize,
    pub hex: String,
}

impl Render for ImageOutput {
    fn headers(&self) -> Vec<&'static str> {
        vec!["SIZE", "HEX"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![self.size.to_string(), self.hex.clone()]]
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn slot_cell(slot: Option<u8>) -> String {
    slot.map_or_else(|| "-".to_string(), |record| record.to_string())
}

fn group_mode_cell(mode: GroupMode) -> String {
    match mode {
        GroupMode::None => "-".to_string(),
        GroupMode::System(group) => format!("system {group}"),
        GroupMode::User(group) => format!("user {group}"),
    }
}

fn group_control_name(control: GroupControl) -> &'static str {
    match control {
        GroupControl::Disabled => "disabled",
        GroupControl::User => "user",
        GroupControl::System => "system",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizer_rows_cover_every_slot() {
        let status = RecognizerStatus {
            valid: 1,
            slots: [Some(3), None, None, None, None, None, None],
            total: 1,
            valid_bitmap: 0b1,
            group_mode: GroupMode::None,
        };
        let rows = status.rows();
        assert_eq!(rows.len(), SLOT_COUNT);
        assert_eq!(rows[0], vec!["0", "3", "true"]);
        assert_eq!(rows[1], vec!["1", "-", "false"]);
    }

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(hex(&[0x0A, 0xFF, 0x00]), "0aff00");
    }

    #[test]
    fn group_mode_cells() {
        assert_eq!(group_mode_cell(GroupMode::User(2)), "user 2");
        assert_eq!(group_mode_cell(GroupMode::System(0)), "system 0");
    }
}
