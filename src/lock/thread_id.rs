//! Per-thread identifiers used as lock owners.

use core::cell::Cell;
use core::num::NonZeroU32;
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "check-loom")]
use loom::thread_local;

/// Next identifier to hand out. Zero is reserved for "no owner".
static NEXT_ID: AtomicU32 = AtomicU32::new(1);

thread_local! {
    static ID: Cell<Option<NonZeroU32>> = Cell::new(None);
}

/// Returns the identifier of the calling thread.
///
/// The identifier is assigned on first use and stays the same for the lifetime of the thread. It
/// is never reused, so two live threads never compare equal.
pub(crate) fn current() -> NonZeroU32 {
    ID.with(|id| {
        if let Some(id) = id.get() {
            return id;
        }

        let fresh = NEXT_ID
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
            .ok()
            .and_then(NonZeroU32::new)
            .unwrap_or_else(|| panic!("exhausted the 32-bit thread identifier space"));
        id.set(Some(fresh));
        fresh
    })
}

#[cfg(all(test, not(feature = "check-loom")))]
mod tests {
    use std::collections::HashSet;
    use std::thread::scope;

    use super::current;

    #[test]
    fn stable_within_a_thread() {
        assert_eq!(current(), current());
    }

    #[test]
    fn distinct_across_threads() {
        let ids = scope(|s| {
            let handles = (0..16).map(|_| s.spawn(current)).collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<HashSet<_>>()
        });

        assert_eq!(ids.len(), 16);
        assert!(!ids.contains(&current()));
    }
}
