//! A recursive lock on top of [`TicketLock`], with suspension.
//!
//! Recursive locks are rarely the right design. They paper over call graphs that loop back into
//! code which already holds the lock, and holding a lock across a call of unbounded duration is
//! just as dangerous whether or not that call re-enters. [`RecursiveTicketLock::suspend`] exists
//! for exactly that case: give the lock up for the duration of an external call and get it back,
//! at the same depth, afterwards.

use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use core::sync::atomic::Ordering::Relaxed;

use crossbeam_utils::CachePadded;
use log::trace;

use super::thread_id;
use super::wait::AtomicU32;
use super::{TicketLock, WouldBlock};

/// Owner value of an unlocked lock. Thread ids are never zero.
const UNOWNED: u32 = 0;

/// A ticket lock that the holding thread may acquire again without deadlocking.
///
/// Cross-thread exclusion and fairness come from the embedded [`TicketLock`]. On top of it, the
/// lock tracks which thread holds it and how many times. `owner` and `recursion` are written only
/// by the thread holding (or acquiring) the ticket lock, so relaxed accesses suffice; the ticket
/// lock orders them between successive holders.
#[derive(Debug)]
pub struct RecursiveTicketLock {
    lock: TicketLock,
    owner: CachePadded<AtomicU32>,
    recursion: AtomicU32,
}

impl RecursiveTicketLock {
    /// Creates a new, unlocked lock.
    pub fn new() -> Self {
        Self {
            lock: TicketLock::new(),
            owner: CachePadded::new(AtomicU32::new(UNOWNED)),
            recursion: AtomicU32::new(0),
        }
    }

    /// Acquires the lock, or enters it once more if the calling thread already holds it.
    pub fn lock(&self) {
        let id = thread_id::current().get();

        if self.owner.load(Relaxed) != id {
            self.lock.lock();
            self.owner.store(id, Relaxed);
        }

        self.recursion.fetch_add(1, Relaxed);
    }

    /// Like [`lock`](Self::lock), but fails instead of waiting for another thread.
    pub fn try_lock(&self) -> Result<(), WouldBlock> {
        let id = thread_id::current().get();

        if self.owner.load(Relaxed) != id {
            self.lock.try_lock()?;
            self.owner.store(id, Relaxed);
        }

        self.recursion.fetch_add(1, Relaxed);
        Ok(())
    }

    /// Leaves one level of the lock, releasing it once the depth drops to zero.
    ///
    /// # Safety
    ///
    /// The calling thread must hold the lock. Every `unlock` must be paired with an earlier
    /// [`lock`](Self::lock) or successful [`try_lock`](Self::try_lock) by the same thread.
    pub unsafe fn unlock(&self) {
        if self.recursion.fetch_sub(1, Relaxed) == 1 {
            self.owner.store(UNOWNED, Relaxed);
            // SAFETY: the depth just dropped to zero, so this thread holds the ticket lock.
            unsafe { self.lock.unlock() };
        }
    }

    /// Releases the lock entirely until the returned [`Suspension`] is dropped.
    ///
    /// If the calling thread does not hold the lock, nothing happens and the suspension is a
    /// no-op. Otherwise the owner and depth are saved, cleared, and the ticket lock is released,
    /// so other threads may take the lock in the meantime. Dropping the suspension puts things
    /// back as they were; see [`Suspension`] for details.
    ///
    /// Two suspensions of the same lock by the same thread must not be alive at once.
    pub fn suspend(&self) -> Suspension<'_> {
        let id = thread_id::current().get();
        let mut owner = UNOWNED;
        let mut recursion = 0;

        if self.owner.load(Relaxed) == id {
            owner = id;
            recursion = self.recursion.load(Relaxed);
            self.owner.store(UNOWNED, Relaxed);
            self.recursion.store(0, Relaxed);
            // SAFETY: `owner` is this thread, so it holds the ticket lock.
            unsafe { self.lock.unlock() };
        }

        Suspension {
            lock: self,
            owner,
            recursion,
            _marker: PhantomData,
        }
    }

    /// Runs `f` with the lock suspended and restores it afterwards, even if `f` panics.
    pub fn suspend_while<R>(&self, f: impl FnOnce() -> R) -> R {
        let _suspension = self.suspend();
        f()
    }

    /// Returns whether the calling thread holds the lock.
    ///
    /// Meant for assertions and diagnostics. The answer about other threads' activity is a racy
    /// snapshot, so don't base synchronization decisions on it.
    pub fn is_locked(&self) -> bool {
        self.owner.load(Relaxed) == thread_id::current().get()
    }

    /// Returns how many times the calling thread has entered the lock, or 0 if it does not hold it.
    pub fn recursion_depth(&self) -> u32 {
        if self.is_locked() {
            self.recursion.load(Relaxed)
        } else {
            0
        }
    }
}

impl Default for RecursiveTicketLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Saved state of a suspended [`RecursiveTicketLock`], restored on drop.
///
/// On drop, if the thread entered the lock again while suspended, it already holds the ticket lock
/// and the saved depth is simply added on top. Otherwise the ticket lock is acquired again, waiting
/// behind any other thread that queued in the meantime, and owner and depth are restored.
///
/// A suspension is tied to the thread and scope that created it: it cannot be sent to another
/// thread, and it borrows the lock. Dropping it through [`core::mem::forget`] leaves the lock
/// released.
#[derive(Debug)]
#[must_use = "dropping a suspension immediately re-acquires the lock"]
pub struct Suspension<'a> {
    lock: &'a RecursiveTicketLock,
    owner: u32,
    recursion: u32,
    _marker: PhantomData<*const ()>,
}

impl Suspension<'_> {
    /// Returns whether the lock was not held by the suspending thread, making this a no-op.
    pub fn is_noop(&self) -> bool {
        self.owner == UNOWNED
    }
}

impl Drop for Suspension<'_> {
    fn drop(&mut self) {
        if self.is_noop() {
            return;
        }

        let lock = self.lock;
        if lock.owner.load(Relaxed) != self.owner {
            trace!("reacquiring suspended lock at depth {}", self.recursion);
            lock.lock.lock();
            lock.owner.store(self.owner, Relaxed);
        }

        lock.recursion.fetch_add(self.recursion, Relaxed);
    }
}

/// A value protected by a [`RecursiveTicketLock`].
///
/// The holding thread may lock it again while it already holds it. Since several guards of one
/// thread can be alive at once, guards only hand out shared references; use a [`Cell`] or
/// [`RefCell`] inside for mutation.
///
/// [`Cell`]: core::cell::Cell
/// [`RefCell`]: core::cell::RefCell
#[derive(Default)]
pub struct ReentrantLock<T> {
    raw: RecursiveTicketLock,
    data: T,
}

// SAFETY: `&T` is only reachable through guards, which stay on the thread holding the lock.
unsafe impl<T: Send> Sync for ReentrantLock<T> {}

impl<T> ReentrantLock<T> {
    /// Creates a new lock.
    pub fn new(data: T) -> Self {
        Self {
            raw: RecursiveTicketLock::new(),
            data,
        }
    }

    /// Destroys the lock and retrieves the lock-protected value.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Returns a mutable reference to the value. No locking is needed since we own `self`.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Acquires the lock and dereferences the inner value.
    pub fn lock(&self) -> ReentrantLockGuard<'_, T> {
        self.raw.lock();
        ReentrantLockGuard {
            lock: self,
            _marker: PhantomData,
        }
    }

    /// Tries to acquire the lock and dereferences the inner value.
    pub fn try_lock(&self) -> Result<ReentrantLockGuard<'_, T>, WouldBlock> {
        self.raw.try_lock().map(|()| ReentrantLockGuard {
            lock: self,
            _marker: PhantomData,
        })
    }

    /// Returns whether the calling thread holds the lock.
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Returns how many guards the calling thread currently holds.
    pub fn recursion_depth(&self) -> u32 {
        self.raw.recursion_depth()
    }
}

impl<T: fmt::Debug> fmt::Debug for ReentrantLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ReentrantLock");
        match self.try_lock() {
            Ok(guard) => d.field("data", &&*guard),
            Err(WouldBlock) => d.field("data", &format_args!("<locked>")),
        };
        d.finish_non_exhaustive()
    }
}

/// A guard that holds a [`ReentrantLock`] and dereferences the inner value.
#[derive(Debug)]
pub struct ReentrantLockGuard<'s, T> {
    lock: &'s ReentrantLock<T>,
    _marker: PhantomData<*const ()>,
}

// SAFETY: Reference to the guard implies reference to `T`. Thus, `T` must be `Sync`.
unsafe impl<T: Sync> Sync for ReentrantLockGuard<'_, T> {}

impl<T> Drop for ReentrantLockGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: the guard was created by a successful acquisition on this thread, and guards
        // cannot leave it.
        unsafe { self.lock.raw.unlock() };
    }
}

impl<T> Deref for ReentrantLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.lock.data
    }
}
