mod mock;

use mock::model;
use mock::sync::atomic::{AtomicUsize, Ordering::Relaxed};
use mock::sync::Arc;
use mock::thread;
use ticketlock::{RecursiveTicketLock, ReentrantLock};

#[test]
fn nested_increments() {
    model(|| {
        let lock = Arc::new(ReentrantLock::new(AtomicUsize::new(0)));

        let handle = {
            let lock = lock.clone();
            thread::spawn(move || {
                let outer = lock.lock();
                let inner = lock.lock();
                inner.store(outer.load(Relaxed) + 1, Relaxed);
            })
        };

        {
            let outer = lock.lock();
            let inner = lock.lock();
            inner.store(outer.load(Relaxed) + 1, Relaxed);
        }

        handle.join().unwrap();
        assert_eq!(lock.lock().load(Relaxed), 2);
    });
}

#[test]
fn suspend_under_contention() {
    model(|| {
        let lock = Arc::new(RecursiveTicketLock::new());
        lock.lock();
        lock.lock();

        let suspension = lock.suspend();
        let handle = {
            let lock = lock.clone();
            thread::spawn(move || {
                lock.lock();
                assert_eq!(lock.recursion_depth(), 1);
                unsafe { lock.unlock() };
            })
        };
        drop(suspension);

        assert!(lock.is_locked());
        assert_eq!(lock.recursion_depth(), 2);
        unsafe {
            lock.unlock();
            lock.unlock();
        }

        handle.join().unwrap();
        assert!(!lock.is_locked());
    });
}

#[test]
fn suspend_while_other_thread_holds() {
    model(|| {
        let lock = Arc::new(RecursiveTicketLock::new());
        let counter = Arc::new(AtomicUsize::new(0));
        lock.lock();

        let handle = {
            let (lock, counter) = (lock.clone(), counter.clone());
            thread::spawn(move || {
                lock.lock();
                counter.store(counter.load(Relaxed) + 1, Relaxed);
                unsafe { lock.unlock() };
            })
        };

        let seen = lock.suspend_while(|| 0);
        assert_eq!(seen, 0);
        counter.store(counter.load(Relaxed) + 1, Relaxed);
        unsafe { lock.unlock() };

        handle.join().unwrap();
        assert_eq!(counter.load(Relaxed), 2);
        assert_eq!(lock.recursion_depth(), 0);
    });
}

#[test]
fn suspend_from_non_holder_is_noop() {
    model(|| {
        let lock = Arc::new(RecursiveTicketLock::new());
        lock.lock();

        let handle = {
            let lock = lock.clone();
            thread::spawn(move || {
                let suspension = lock.suspend();
                assert!(suspension.is_noop());
                assert!(!lock.is_locked());
            })
        };

        handle.join().unwrap();
        assert_eq!(lock.recursion_depth(), 1);
        unsafe { lock.unlock() };
    });
}
