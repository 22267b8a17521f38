use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{error, trace};

use crate::error::CoreError;
use crate::handle::{HandleKind, NULL_HANDLE};

struct Association<T> {
    kind: HandleKind,
    table: T,
}

/// Process-wide map from raw handle value to the dispatch table responsible
/// for it.
///
/// An association is created exactly once, when the handle is handed back from
/// a creation call, and removed exactly once, when the handle is destroyed.
/// Every misuse (null handle, second registration, lookup or release after
/// removal) is rejected with an error and logged at `error` level rather than
/// silently routed somewhere.
///
/// Operations on different handles may run concurrently from any thread; the
/// map is sharded and the check-and-insert in [`register`](Self::register)
/// happens under the shard lock.
pub struct HandleRegistry<T> {
    entries: DashMap<u64, Association<T>>,
}

impl<T: Clone> HandleRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Bind `handle` to `table`.
    pub fn register(&self, handle: u64, kind: HandleKind, table: T) -> Result<(), CoreError> {
        if handle == NULL_HANDLE {
            error!("refusing to register null {}", kind);
            return Err(CoreError::NullHandle(kind));
        }

        match self.entries.entry(handle) {
            Entry::Occupied(existing) => {
                let existing_kind = existing.get().kind;
                error!(
                    "{} {:#x} is already registered as {}",
                    kind, handle, existing_kind
                );
                Err(CoreError::AlreadyRegistered {
                    handle,
                    kind: existing_kind,
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(Association { kind, table });
                trace!("registered {} {:#x}", kind, handle);
                Ok(())
            }
        }
    }

    /// Resolve `handle` to its table. Unknown handles are a caller bug and are
    /// logged as such.
    pub fn lookup(&self, handle: u64) -> Result<T, CoreError> {
        match self.get(handle) {
            Some(table) => Ok(table),
            None => {
                error!("lookup of unknown handle {:#x}", handle);
                Err(CoreError::UnknownHandle(handle))
            }
        }
    }

    /// Like [`lookup`](Self::lookup), but a handle registered under another
    /// kind is treated as unknown.
    pub fn lookup_kind(&self, handle: u64, expected: HandleKind) -> Result<T, CoreError> {
        match self.entries.get(&handle) {
            Some(a) if a.kind == expected => Ok(a.table.clone()),
            Some(a) => {
                error!(
                    "{:#x} is a {}, not a {}",
                    handle, a.kind, expected
                );
                Err(CoreError::UnknownHandle(handle))
            }
            None => {
                error!("lookup of unknown {} {:#x}", expected, handle);
                Err(CoreError::UnknownHandle(handle))
            }
        }
    }

    /// Quiet variant of [`lookup`](Self::lookup) for callers that expect a miss.
    pub fn get(&self, handle: u64) -> Option<T> {
        self.entries.get(&handle).map(|a| a.table.clone())
    }

    /// Remove the association for `handle`, returning its table.
    pub fn release(&self, handle: u64) -> Result<T, CoreError> {
        match self.entries.remove(&handle) {
            Some((_, association)) => {
                trace!("released {} {:#x}", association.kind, handle);
                Ok(association.table)
            }
            None => {
                error!("release of unknown or already released handle {:#x}", handle);
                Err(CoreError::UnknownHandle(handle))
            }
        }
    }

    /// Remove every association for which `pred` holds. Returns how many were
    /// removed.
    pub fn release_matching<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(HandleKind, &T) -> bool,
    {
        let mut removed = 0;
        self.entries.retain(|handle, association| {
            if pred(association.kind, &association.table) {
                trace!("released {} {:#x}", association.kind, handle);
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn contains(&self, handle: u64) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn kind_of(&self, handle: u64) -> Option<HandleKind> {
        self.entries.get(&handle).map(|a| a.kind)
    }

    /// Number of live associations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
