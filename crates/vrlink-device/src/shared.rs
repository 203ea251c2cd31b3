use std::sync::{Arc, Mutex};
use std::time::Duration;

use vrlink_transport::ByteTransport;

use crate::error::{DeviceError, Result};
use crate::module::VoiceModule;
use crate::types::{LoadOutcome, RecognizerStatus, Recognition};

/// A module handle that can be cloned across threads.
///
/// Every call holds the lock for its whole exchange, so commands from
/// different threads never interleave on the wire.
pub struct SharedModule<T> {
    inner: Arc<Mutex<VoiceModule<T>>>,
}

impl<T> Clone for SharedModule<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ByteTransport> SharedModule<T> {
    pub fn new(module: VoiceModule<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(module)),
        }
    }

    /// Run `f` with exclusive access to the module.
    pub fn with<R>(&self, f: impl FnOnce(&mut VoiceModule<T>) -> Result<R>) -> Result<R> {
        let mut module = self.inner.lock().map_err(|_| DeviceError::LockPoisoned)?;
        f(&mut *module)
    }

    pub fn recognize(&self, timeout: Duration) -> Result<Option<Recognition>> {
        self.with(|module| module.recognize(timeout))
    }

    pub fn check_recognizer(&self) -> Result<RecognizerStatus> {
        self.with(VoiceModule::check_recognizer)
    }

    pub fn load(&self, ids: &[u8]) -> Result<LoadOutcome> {
        self.with(|module| module.load(ids))
    }

    pub fn clear(&self) -> Result<()> {
        self.with(VoiceModule::clear)
    }

    /// Recover the module once this is the last handle.
    pub fn try_unwrap(self) -> std::result::Result<VoiceModule<T>, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(|err| err.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}
