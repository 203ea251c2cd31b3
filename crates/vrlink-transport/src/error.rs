/// Errors that can occur in byte transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open {path} at {baud_rate} baud: {source}")]
    Open {
        path: String,
        baud_rate: u32,
        source: std::io::Error,
    },

    /// An I/O error occurred on the byte stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport has been closed.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
