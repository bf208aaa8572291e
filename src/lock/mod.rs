//! Locks.

mod api;
mod recursive;
mod thread_id;
mod ticketlock;
mod wait;

pub use api::{Lock, LockGuard, RawLock, RawTryLock, WouldBlock};
pub use recursive::{RecursiveTicketLock, ReentrantLock, ReentrantLockGuard, Suspension};
pub use ticketlock::TicketLock;
