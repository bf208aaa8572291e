//! Blocking on an atomic word.
//!
//! `wait` may return spuriously, and callers must re-check the word after every return.

#[cfg(not(feature = "check-loom"))]
pub(crate) use core::sync::atomic::AtomicU32;

#[cfg(feature = "check-loom")]
pub(crate) use loom::sync::atomic::AtomicU32;

/// Blocks the calling thread while `atomic` holds `expected`.
#[cfg(not(feature = "check-loom"))]
#[inline]
pub(crate) fn wait(atomic: &AtomicU32, expected: u32) {
    atomic_wait::wait(atomic, expected);
}

/// Wakes every thread blocked in [`wait`] on `atomic`.
#[cfg(not(feature = "check-loom"))]
#[inline]
pub(crate) fn wake_all(atomic: &AtomicU32) {
    atomic_wait::wake_all(atomic);
}

// loom cannot block on an address, so a waiter yields back to the model scheduler instead.
#[cfg(feature = "check-loom")]
pub(crate) fn wait(atomic: &AtomicU32, expected: u32) {
    use core::sync::atomic::Ordering;

    if atomic.load(Ordering::Relaxed) == expected {
        loom::thread::yield_now();
    }
}

#[cfg(feature = "check-loom")]
pub(crate) fn wake_all(_atomic: &AtomicU32) {}
