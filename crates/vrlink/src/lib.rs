//! Driver for serial voice-recognition modules.
//!
//! vrlink speaks the module's marker-delimited command/response protocol over
//! a serial link: framing, reply collection with timeouts, and a typed command
//! surface for training, loading and recognizing voice records.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte transport abstraction (serial port, scripted mock)
//! - [`frame`]: frame encoding/decoding and the opcode table
//! - [`session`]: request/response engine and collection policies (behind `device` feature)
//! - [`device`]: typed module commands (behind `device` feature)

/// Re-export transport types.
pub mod transport {
    pub use vrlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use vrlink_frame::*;
}

/// Re-export session types (requires `device` feature).
#[cfg(feature = "device")]
pub mod session {
    pub use vrlink_session::*;
}

/// Re-export device types (requires `device` feature).
#[cfg(feature = "device")]
pub mod device {
    pub use vrlink_device::*;
}
