use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::{CoreError, LinkSet, LinkStore};

/// Simple in-memory store. Holds one committed set behind a mutex; `save`
/// swaps it wholesale like the file store does.
pub struct InMemoryStore {
    inner: Mutex<LinkSet>,
    fail_saves: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_links(LinkSet::new())
    }

    pub fn with_links(links: LinkSet) -> Self {
        Self {
            inner: Mutex::new(links),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Make subsequent saves fail, leaving the committed set untouched.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkStore for InMemoryStore {
    fn load(&self) -> Result<LinkSet, CoreError> {
        let set = self
            .inner
            .lock()
            .map_err(|_| CoreError::Store("mutex poisoned".into()))?;
        Ok(set.clone())
    }

    fn save(&self, links: &LinkSet) -> Result<(), CoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CoreError::Store("write refused".into()));
        }
        let mut set = self
            .inner
            .lock()
            .map_err(|_| CoreError::Store("mutex poisoned".into()))?;
        *set = links.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LinkRecord, ShortCode};
    use std::time::SystemTime;

    #[test]
    fn load_returns_copy_of_committed_set() {
        let store = InMemoryStore::new();
        let mut local = store.load().unwrap();
        local
            .push(LinkRecord::new(
                ShortCode::new("abc123").unwrap(),
                "http://e.example".into(),
                SystemTime::UNIX_EPOCH,
            ))
            .unwrap();
        assert!(store.load().unwrap().is_empty());

        store.save(&local).unwrap();
        assert_eq!(store.load().unwrap(), local);
    }

    #[test]
    fn failed_save_keeps_previous_set() {
        let store = InMemoryStore::new();
        let mut local = LinkSet::new();
        local
            .push(LinkRecord::new(
                ShortCode::new("abc123").unwrap(),
                "http://e.example".into(),
                SystemTime::UNIX_EPOCH,
            ))
            .unwrap();
        store.set_fail_saves(true);
        assert!(matches!(store.save(&local), Err(CoreError::Store(_))));
        assert!(store.load().unwrap().is_empty());
    }
}
