use crate::error::Result;

/// A raw duplex byte stream to the peripheral.
///
/// Reads never block: callers poll [`ByteTransport::read_byte`] and decide
/// themselves how long to keep trying.
pub trait ByteTransport {
    /// Write all of `bytes` to the link.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Take one byte from the input buffer, or `None` if nothing is buffered.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Number of bytes currently buffered on the input side.
    fn bytes_available(&mut self) -> Result<usize>;
}

impl<T: ByteTransport + ?Sized> ByteTransport for &mut T {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }

    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }
}

impl<T: ByteTransport + ?Sized> ByteTransport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }

    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }
}
