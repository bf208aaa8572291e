use core::sync::atomic::Ordering::*;

#[cfg(not(feature = "check-loom"))]
use crossbeam_utils::Backoff;
use log::trace;

use super::wait::{self, AtomicU32};
use crate::lock::*;

/// A fair ticket lock.
///
/// Every [`lock`](TicketLock::lock) draws a ticket from `next_ticket` and proceeds once
/// `now_serving` reaches it, so the lock is granted in exactly the order tickets were drawn.
/// Contended waiters spin briefly and then block on `now_serving` instead of burning a core.
///
/// The counters are identities, not magnitudes: they wrap around at `u32::MAX` without harm as long
/// as fewer than 2^32 acquisitions are outstanding at once.
///
/// The lock is not reentrant. Locking it twice from one thread deadlocks, and unlocking it more
/// often than it was locked breaks it for every later caller. Prefer [`Lock<TicketLock, T>`] over
/// pairing the calls by hand.
///
/// It is tuned for two or three contending threads and does not scale to many.
#[derive(Debug)]
pub struct TicketLock {
    next_ticket: AtomicU32,
    now_serving: AtomicU32,
}

impl TicketLock {
    /// Creates a new, unlocked ticket lock.
    pub fn new() -> Self {
        Self {
            next_ticket: AtomicU32::new(0),
            now_serving: AtomicU32::new(0),
        }
    }

    /// Acquires the lock, blocking until every earlier ticket has been served.
    pub fn lock(&self) {
        let ticket = self.next_ticket.fetch_add(1, Relaxed);
        let current = self.now_serving.load(Acquire);

        if ticket != current {
            self.lock_slow(ticket, current);
        }
    }

    #[cold]
    #[inline(never)]
    fn lock_slow(&self, ticket: u32, mut current: u32) {
        trace!("ticket {ticket} waiting, now serving {current}");

        #[cfg(not(feature = "check-loom"))]
        {
            let backoff = Backoff::new();
            while !backoff.is_completed() {
                backoff.snooze();
                current = self.now_serving.load(Acquire);
                if current == ticket {
                    return;
                }
            }
        }

        while current != ticket {
            wait::wait(&self.now_serving, current);
            current = self.now_serving.load(Acquire);
        }
    }

    /// Tries to acquire the lock without waiting.
    ///
    /// Succeeds only if nobody holds the lock and nobody is queued for it, so it never jumps the
    /// queue.
    pub fn try_lock(&self) -> Result<(), WouldBlock> {
        let current = self.now_serving.load(Acquire);

        self.next_ticket
            .compare_exchange(current, current.wrapping_add(1), Acquire, Relaxed)
            .map(|_| ())
            .map_err(|_| WouldBlock)
    }

    /// Releases the lock and hands it to the next ticket in line.
    ///
    /// # Safety
    ///
    /// The lock must be held, and the holder must release it exactly once.
    pub unsafe fn unlock(&self) {
        self.now_serving.fetch_add(1, Release);
        // Every waiter watches this word, but only the next ticket may proceed.
        wait::wake_all(&self.now_serving);
    }

    /// Returns whether any ticket is outstanding.
    ///
    /// This is a snapshot for diagnostics and may be stale by the time it is returned.
    pub fn is_locked(&self) -> bool {
        self.next_ticket.load(Relaxed) != self.now_serving.load(Relaxed)
    }
}

impl Default for TicketLock {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl RawLock for TicketLock {
    type Token = ();

    fn lock(&self) {
        TicketLock::lock(self);
    }

    unsafe fn unlock(&self, _token: ()) {
        // SAFETY: the caller holds the lock, per `RawLock::unlock`'s contract.
        unsafe { TicketLock::unlock(self) };
    }
}

unsafe impl RawTryLock for TicketLock {
    fn try_lock(&self) -> Result<(), WouldBlock> {
        TicketLock::try_lock(self)
    }
}
