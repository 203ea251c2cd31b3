use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::ByteTransport;

/// Baud rate the module ships with.
pub const DEFAULT_BAUD_RATE: u32 = 38_400;

/// Timeout handed to the OS driver for the single-byte reads. Reads are only
/// issued once bytes are known to be buffered, so this is never waited out in
/// normal operation.
const DRIVER_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Serial link settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    /// Line speed. The module is always 8N1 without flow control.
    pub baud_rate: u32,
}

impl SerialConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// Serial-port transport backed by the `serialport` crate.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    path: String,
}

impl SerialTransport {
    /// Open the device at 8N1, no flow control.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(config.path.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(DRIVER_READ_TIMEOUT)
            .open()
            .map_err(|err| TransportError::Open {
                path: config.path.clone(),
                baud_rate: config.baud_rate,
                source: err.into(),
            })?;

        info!(path = %config.path, baud_rate = config.baud_rate, "opened serial port");

        Ok(Self {
            port,
            path: config.path.clone(),
        })
    }

    /// Device path this transport was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Change the line speed, e.g. after telling the module to switch rates.
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.port
            .set_baud_rate(baud_rate)
            .map_err(|err| TransportError::Io(err.into()))?;
        debug!(path = %self.path, baud_rate, "serial baud rate changed");
        Ok(())
    }
}

impl ByteTransport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.bytes_available()? == 0 {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let count = self
            .port
            .bytes_to_read()
            .map_err(|err| TransportError::Io(err.into()))?;
        Ok(count as usize)
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .finish()
    }
}

/// List serial devices visible to the OS.
pub fn available_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports().map_err(|err| TransportError::Io(err.into()))?;
    Ok(ports.into_iter().map(|port| port.port_name).collect())
}
