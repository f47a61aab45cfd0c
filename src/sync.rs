//! Shared access to a [`Head`] from the editing and playback sides
//!
//! All edits and all playback steps go through one mutex. A panic while the
//! lock was held leaves the head usable: the poisoned guard is taken over
//! rather than propagated.

use crate::score::Head;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct SharedHead {
    inner: Arc<Mutex<Head>>,
}

impl SharedHead {
    pub fn new(head: Head) -> Self {
        Self {
            inner: Arc::new(Mutex::new(head)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Head> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with the head locked
    pub fn with<R>(&self, f: impl FnOnce(&mut Head) -> R) -> R {
        let mut head = self.lock();
        f(&mut head)
    }
}
