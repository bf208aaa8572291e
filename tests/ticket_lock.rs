mod mock;

use mock::model;
use mock::sync::Arc;
use mock::thread;
use ticketlock::{Lock, TicketLock};

#[test]
fn two_threads_increment() {
    model(|| {
        let lock = Arc::new(Lock::<TicketLock, usize>::new(0));

        let handle = {
            let lock = lock.clone();
            thread::spawn(move || {
                let mut guard = lock.lock();
                let v = *guard;
                *guard = v + 1;
            })
        };

        {
            let mut guard = lock.lock();
            let v = *guard;
            *guard = v + 1;
        }

        handle.join().unwrap();
        assert_eq!(*lock.lock(), 2);
    });
}

#[test]
fn writes_visible_to_next_holder() {
    model(|| {
        let lock = Arc::new(Lock::<TicketLock, Vec<u32>>::new(Vec::new()));
        let mut guard = lock.lock();

        let handle = {
            let lock = lock.clone();
            thread::spawn(move || lock.lock().clone())
        };

        guard.extend([1, 2, 3]);
        drop(guard);

        assert_eq!(handle.join().unwrap(), [1, 2, 3]);
    });
}

#[test]
fn try_lock_fails_while_held() {
    model(|| {
        let lock = Arc::new(Lock::<TicketLock, u32>::new(7));
        let guard = lock.lock();

        let handle = {
            let lock = lock.clone();
            thread::spawn(move || lock.try_lock().is_err())
        };

        assert!(handle.join().unwrap());
        drop(guard);
        assert_eq!(*lock.try_lock().unwrap(), 7);
    });
}
