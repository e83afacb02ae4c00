//! Session registry
// The authoritative mapping from device serial to its running session.
// Discovery registers new sessions here; each session revokes its own entry
// during teardown, and removal of an absent entry is a no-op so that the
// teardown path stays idempotent.
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{session::SessionHandle, MuxdError, Result};

pub struct Registry {
    inner: RwLock<HashMap<String, Arc<SessionHandle>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Records a session under its serial. Signals a conflict if the serial
    /// is already present; the caller decides whether to replace or ignore.
    pub fn add(&self, session: Arc<SessionHandle>) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let serial = session.serial().to_string();
        if inner.contains_key(&serial) {
            return Err(MuxdError::DeviceRegistered(serial));
        }

        inner.insert(serial, session);
        Ok(())
    }

    /// Revokes a session's entry. Returns `None` when the serial is absent.
    pub fn remove(&self, serial: &str) -> Option<Arc<SessionHandle>> {
        let mut inner = self.inner.write().unwrap();
        inner.remove(serial)
    }

    pub fn get(&self, serial: &str) -> Option<Arc<SessionHandle>> {
        let inner = self.inner.read().unwrap();
        inner.get(serial).cloned()
    }

    pub fn sessions(&self) -> Vec<Arc<SessionHandle>> {
        let inner = self.inner.read().unwrap();
        inner.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops every live session. Entries are still removed by the sessions
    /// themselves as their loops wind down.
    pub fn shutdown(&self) {
        for session in self.sessions() {
            session.stop();
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}
