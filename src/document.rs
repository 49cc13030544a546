//! Ordered entry sequences — pane transcripts and the shared whiteboard.
//!
//! DESIGN
//! ======
//! A [`Sequence`] is the single primitive for ordered content. Every mutation
//! goes through [`Sequence::apply`], which runs a `current -> next`
//! transformation under the sequence's own lock, so concurrent producers
//! always compose with the latest state instead of writing back a stale
//! snapshot. The lock is a `std::sync::Mutex` and is never held across an
//! `.await`.
//!
//! [`Document`] wraps a sequence with the whiteboard lifecycle: one-time
//! seeding and the insertion callback external producers feed through.
//!
//! Every change bumps a revision counter published on a `watch` channel so
//! observers can follow changes without polling the entries. Edits that are
//! rejected or find nothing to do leave the revision where it was.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use crate::entry::{Entry, EntryKind, Role};

/// Greeting placed in an empty whiteboard on first observation.
pub const SEED_GREETING: &str = "Hello World!";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("position {position} out of range (len {len})")]
    OutOfRange { position: usize, len: usize },
}

impl crate::error::ErrorCode for DocumentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "E_POSITION_OUT_OF_RANGE",
        }
    }
}

// =============================================================================
// SEQUENCE
// =============================================================================

struct SequenceInner {
    entries: Mutex<Vec<Entry>>,
    revision: watch::Sender<u64>,
}

/// Shared, ordered, append-mostly list of entries. Cloning shares the list.
#[derive(Clone)]
pub struct Sequence {
    inner: Arc<SequenceInner>,
}

impl Sequence {
    #[must_use]
    pub fn new() -> Self {
        Self::from_entries(Vec::new())
    }

    #[must_use]
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let (revision, _) = watch::channel(0);
        Self { inner: Arc::new(SequenceInner { entries: Mutex::new(entries), revision }) }
    }

    /// Apply a transformation to the current entries atomically.
    ///
    /// This is the only mutation path. `f` returns `Err` when it left the
    /// entries untouched; the revision is bumped only on `Ok`.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns.
    pub fn apply<T, E>(&self, f: impl FnOnce(&mut Vec<Entry>) -> Result<T, E>) -> Result<T, E> {
        let result = {
            let mut entries = self
                .inner
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            f(&mut entries)
        };
        if result.is_ok() {
            self.inner.revision.send_modify(|rev| *rev += 1);
        }
        result
    }

    fn read<R>(&self, f: impl FnOnce(&[Entry]) -> R) -> R {
        let entries = self
            .inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&entries)
    }

    /// Append one entry and return its position.
    pub fn append(&self, entry: Entry) -> usize {
        let Ok(position) = self.apply(|entries| -> Result<usize, Infallible> {
            entries.push(entry);
            Ok(entries.len() - 1)
        });
        position
    }

    /// Append one entry and return everything that preceded it, as one step.
    pub fn append_with_history(&self, entry: Entry) -> Vec<Entry> {
        let Ok(history) = self.apply(|entries| -> Result<Vec<Entry>, Infallible> {
            let history = entries.clone();
            entries.push(entry);
            Ok(history)
        });
        history
    }

    /// Remove the entry at `position`; later entries shift down by one.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::OutOfRange`] without mutating when `position`
    /// is past the end.
    pub fn remove_at(&self, position: usize) -> Result<Entry, DocumentError> {
        self.apply(|entries| {
            if position >= entries.len() {
                return Err(DocumentError::OutOfRange { position, len: entries.len() });
            }
            Ok(entries.remove(position))
        })
    }

    /// Replace the entry at `position`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::OutOfRange`] without mutating when `position`
    /// is past the end.
    pub fn replace_at(&self, position: usize, entry: Entry) -> Result<Entry, DocumentError> {
        self.apply(|entries| match entries.get_mut(position) {
            Some(slot) => Ok(std::mem::replace(slot, entry)),
            None => Err(DocumentError::OutOfRange { position, len: entries.len() }),
        })
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<Entry> {
        self.read(|entries| entries.get(position).cloned())
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Entry> {
        self.read(<[Entry]>::to_vec)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read(<[Entry]>::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current revision; increases by one per change. Reads and failed
    /// edits leave it alone.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    /// Receiver notified after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// INSERTION CALLBACK
// =============================================================================

/// Sink that panes forward finished entries into. The pane never reads back.
pub trait EntrySink: Send + Sync {
    fn insert_entry(&self, entry: Entry);
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// The whiteboard: the shared, publishable sequence.
#[derive(Clone)]
pub struct Document {
    entries: Sequence,
    seeded: Arc<AtomicBool>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Sequence::new(), seeded: Arc::new(AtomicBool::new(false)) }
    }

    /// Underlying sequence, for routing submissions straight at the whiteboard.
    #[must_use]
    pub fn sequence(&self) -> &Sequence {
        &self.entries
    }

    /// Seed the greeting if this is the first observation and the board is
    /// empty. Returns `true` only when the greeting was added.
    pub fn seed_if_empty(&self) -> bool {
        if self.seeded.swap(true, Ordering::SeqCst) {
            return false;
        }
        let seeded = self
            .entries
            .apply(|entries| {
                if !entries.is_empty() {
                    return Err(());
                }
                entries.push(Entry::system_text(SEED_GREETING));
                Ok(())
            })
            .is_ok();
        if seeded {
            debug!("document: seeded greeting");
        }
        seeded
    }

    pub fn append(&self, entry: Entry) -> usize {
        let position = self.entries.append(entry);
        debug!(position, "document: appended");
        position
    }

    /// Insertion callback for external producers: `(content, kind?)`.
    pub fn insert(&self, content: impl Into<String>, kind: Option<EntryKind>) -> usize {
        self.append(Entry::new(Role::User, kind.unwrap_or_default(), content))
    }

    /// # Errors
    ///
    /// Returns [`DocumentError::OutOfRange`] when `position` is past the end.
    pub fn remove_at(&self, position: usize) -> Result<Entry, DocumentError> {
        let removed = self.entries.remove_at(position)?;
        debug!(position, "document: removed");
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns [`DocumentError::OutOfRange`] when `position` is past the end.
    pub fn replace_at(&self, position: usize, entry: Entry) -> Result<Entry, DocumentError> {
        let previous = self.entries.replace_at(position, entry)?;
        debug!(position, "document: replaced");
        Ok(previous)
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Entry> {
        self.entries.snapshot()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.entries.revision()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl EntrySink for Document {
    fn insert_entry(&self, entry: Entry) {
        self.append(entry);
    }
}

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;
