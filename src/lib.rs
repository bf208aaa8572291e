//! Fair ticket locks and a suspendable recursive lock.

#![warn(missing_docs, missing_debug_implementations)]
#![deny(warnings, unsafe_op_in_unsafe_fn)]

pub mod lock;

pub use lock::{
    Lock, LockGuard, RawLock, RawTryLock, RecursiveTicketLock, ReentrantLock,
    ReentrantLockGuard, Suspension, TicketLock, WouldBlock,
};
