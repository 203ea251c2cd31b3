//! Byte transport abstraction for the voice-recognition link.
//!
//! The session engine needs exactly three capabilities from the wire:
//! - buffered write of a complete frame
//! - non-blocking read of a single byte
//! - a count of bytes currently buffered on the input side
//!
//! This is the lowest layer of vrlink. Everything else builds on top of
//! the [`ByteTransport`] trait provided here.

pub mod error;
pub mod mock;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use mock::{MockTransport, Reply};
pub use traits::ByteTransport;

#[cfg(feature = "serial")]
pub use serial::{available_ports, SerialConfig, SerialTransport, DEFAULT_BAUD_RATE};
