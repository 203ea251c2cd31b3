//! Opcodes understood by the voice-recognition module.
//!
//! Opcodes 0x00-0x3F are host commands; the module echoes the opcode in its
//! reply. A few opcodes only ever travel from the module to the host.

/// Read baud rate, output mode, pulse width, auto-load and group settings.
pub const CHECK_SYSTEM: u8 = 0x00;
/// Read which records are loaded into the recognizer.
pub const CHECK_RECOGNIZER: u8 = 0x01;
/// Read train status of records.
pub const CHECK_TRAIN: u8 = 0x02;
/// Read the signature of one record.
pub const CHECK_SIGNATURE: u8 = 0x03;

/// Restore factory settings.
pub const RESET_DEFAULT: u8 = 0x10;
/// Change the module's serial baud rate.
pub const SET_BAUD_RATE: u8 = 0x11;
/// Select how the output pins react to a recognition.
pub const SET_IO_MODE: u8 = 0x12;
/// Set the pulse width used in pulse output mode.
pub const SET_PULSE_WIDTH: u8 = 0x13;
/// Reset output pins.
pub const RESET_IO: u8 = 0x14;
/// Configure records loaded at power-up.
pub const SET_AUTO_LOAD: u8 = 0x15;

/// Train records.
pub const TRAIN: u8 = 0x20;
/// Train one record and attach a signature.
pub const SIGNATURE_TRAIN: u8 = 0x21;
/// Set or delete a record's signature.
pub const SET_SIGNATURE: u8 = 0x22;

/// Load records into the recognizer.
pub const LOAD: u8 = 0x30;
/// Empty the recognizer.
pub const CLEAR: u8 = 0x31;
/// Group control family, sub-addressed by the `GROUP_*` constants.
pub const GROUP: u8 = 0x32;

/// Factory self-test family, sub-addressed by `TEST_READ` / `TEST_WRITE`.
pub const TEST: u8 = 0xEE;

/// Module to host: a record was recognized.
pub const RECOGNIZED: u8 = 0x0D;
/// Module to host: progress prompt while training.
pub const PROMPT: u8 = 0x0A;
/// Module to host: command rejected.
pub const ERROR: u8 = 0xFF;

/// Enable or query group control by external IO.
pub const GROUP_SET_CONTROL: u8 = 0x00;
/// Assign records to a user group.
pub const GROUP_SET_USER: u8 = 0x01;
/// Load a system group into the recognizer.
pub const GROUP_LOAD_SYSTEM: u8 = 0x02;
/// Load a user group into the recognizer.
pub const GROUP_LOAD_USER: u8 = 0x03;
/// Read user group contents.
pub const GROUP_CHECK_USER: u8 = 0x04;

/// Write one block of self-test data.
pub const TEST_WRITE: u8 = 0x00;
/// Read back all self-test data.
pub const TEST_READ: u8 = 0x01;

/// Returns a human-readable name for an opcode.
pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        CHECK_SYSTEM => "CHECK_SYSTEM",
        CHECK_RECOGNIZER => "CHECK_RECOGNIZER",
        CHECK_TRAIN => "CHECK_TRAIN",
        CHECK_SIGNATURE => "CHECK_SIGNATURE",
        RESET_DEFAULT => "RESET_DEFAULT",
        SET_BAUD_RATE => "SET_BAUD_RATE",
        SET_IO_MODE => "SET_IO_MODE",
        SET_PULSE_WIDTH => "SET_PULSE_WIDTH",
        RESET_IO => "RESET_IO",
        SET_AUTO_LOAD => "SET_AUTO_LOAD",
        TRAIN => "TRAIN",
        SIGNATURE_TRAIN => "SIGNATURE_TRAIN",
        SET_SIGNATURE => "SET_SIGNATURE",
        LOAD => "LOAD",
        CLEAR => "CLEAR",
        GROUP => "GROUP",
        TEST => "TEST",
        RECOGNIZED => "RECOGNIZED",
        PROMPT => "PROMPT",
        ERROR => "ERROR",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_cover_every_known_opcode() {
        assert_eq!(opcode_name(TRAIN), "TRAIN");
        assert_eq!(opcode_name(GROUP), "GROUP");
        assert_eq!(opcode_name(PROMPT), "PROMPT");
        assert_eq!(opcode_name(0x7F), "UNKNOWN");
    }
}
