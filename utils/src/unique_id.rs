use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// An identifier guaranteed to be unique within the current process
/// execution. Zero is never handed out, leaving it usable as a sentinel.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniqueId(u64);

static NEXT: AtomicU64 = AtomicU64::new(1);

impl UniqueId {
    pub fn next() -> Self {
        UniqueId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UniqueId").field(&self.0).finish()
    }
}
