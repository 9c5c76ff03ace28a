// crates/framecut-core/src/store.rs
//
// Caller-owned output handles.
//
// A finished export is parked here and the caller gets an `OutputHandle` back.
// The handle must be released exactly once when the output is no longer shown;
// replacing the displayed output releases the previous handle first so the
// store never grows without bound across repeated exports. Whatever is still
// live when the store drops is released then.

use std::collections::HashMap;

use uuid::Uuid;

use crate::media_types::Clip;

/// Opaque reference to a stored output clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutputHandle(Uuid);

impl OutputHandle {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

#[derive(Default)]
pub struct OutputStore {
    entries:  HashMap<OutputHandle, Clip>,
    released: u64,
}

impl OutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, clip: Clip) -> OutputHandle {
        let handle = OutputHandle(Uuid::new_v4());
        tracing::debug!("[store] insert {} ({} bytes)", handle.0, clip.len());
        self.entries.insert(handle, clip);
        handle
    }

    pub fn get(&self, handle: OutputHandle) -> Option<&Clip> {
        self.entries.get(&handle)
    }

    /// Release `handle`. Returns `false` for a handle that was already released
    /// (or never issued by this store). A double release is a caller bug and
    /// is logged, never a panic.
    pub fn release(&mut self, handle: OutputHandle) -> bool {
        match self.entries.remove(&handle) {
            Some(_) => {
                self.released += 1;
                true
            }
            None => {
                tracing::warn!("[store] release of unknown or already-released handle {}", handle.0);
                false
            }
        }
    }

    /// Store `clip`, releasing `previous` first when given.
    pub fn replace(&mut self, previous: Option<OutputHandle>, clip: Clip) -> OutputHandle {
        if let Some(old) = previous {
            self.release(old);
        }
        self.insert(clip)
    }

    /// Number of handles not yet released.
    pub fn live(&self) -> usize {
        self.entries.len()
    }

    /// Total releases performed over the store's lifetime.
    pub fn released(&self) -> u64 {
        self.released
    }

    pub fn release_all(&mut self) {
        let n = self.entries.len();
        self.entries.clear();
        self.released += n as u64;
    }
}

impl Drop for OutputStore {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!("[store] releasing {} live output(s) on drop", self.entries.len());
            self.release_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(n: usize) -> Clip {
        Clip::new(vec![0u8; n], "video/webm")
    }

    #[test]
    fn release_exactly_once() {
        let mut store = OutputStore::new();
        let h = store.insert(clip(4));
        assert_eq!(store.get(h).map(Clip::len), Some(4));
        assert!(store.release(h));
        assert!(!store.release(h), "second release must be rejected");
        assert!(store.get(h).is_none());
        assert_eq!(store.released(), 1);
    }

    #[test]
    fn replace_releases_prior_handle() {
        let mut store = OutputStore::new();
        let mut current = None;
        for i in 0..5 {
            current = Some(store.replace(current, clip(i + 1)));
        }
        assert_eq!(store.live(), 1);
        assert_eq!(store.released(), 4);
        assert_eq!(store.get(current.unwrap()).map(Clip::len), Some(5));
    }

    #[test]
    fn release_all_empties_store() {
        let mut store = OutputStore::new();
        store.insert(clip(1));
        store.insert(clip(2));
        store.release_all();
        assert_eq!(store.live(), 0);
        assert_eq!(store.released(), 2);
    }
}
