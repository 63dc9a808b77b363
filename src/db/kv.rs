use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;

use crate::error::StoreError;

/// Flat, synchronous key-value medium the content store persists into. Each
/// value is a whole serialized collection.
pub trait KeyValueStore {
    /// `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Drop `key` entirely. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store used by tests and as a throwaway backend. Reads and writes
/// can be switched off independently to exercise the failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Raw collection payloads by storage key.
    entries: RefCell<HashMap<String, String>>,
    /// When set, `set` and `remove` fail without touching `entries`.
    fail_writes: Cell<bool>,
    /// When set, `get` fails as an unreachable backend would.
    fail_reads: Cell<bool>,
}

impl MemoryStore {
    /// Empty store: every collection reads as never written.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a raw value, e.g. a corrupt payload.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Make every following `set`/`remove` fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Make every following `get` fail until switched back. `raw` still sees
    /// the stored value.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Raw value currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Error for a write attempted while writes are switched off.
    fn check_writable(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            Err(StoreError::write(
                key,
                io::Error::new(io::ErrorKind::Other, "storage quota exceeded"),
            ))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.get() {
            return Err(StoreError::read(
                key,
                io::Error::new(io::ErrorKind::Other, "storage unavailable"),
            ));
        }
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_writable(key)?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable(key)?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
