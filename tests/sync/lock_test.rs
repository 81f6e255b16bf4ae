/*!
 * Lock Tests
 * Mutex, condition variable and semaphore under real thread contention
 */

use agent_sync::{
    AtomicWord, ConditionVariable, Mutex, Semaphore, SharedPrimitive, SharedRegion, SyncConfig,
};
use rand::Rng;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

const AGENTS: usize = 8;
const ITERATIONS: u32 = 1_000;

#[test]
fn test_mutual_exclusion_across_attached_handles() {
    // Lock word followed by an unprotected counter word
    let region = SharedRegion::new(8);
    Mutex::attach(&region, 0).unwrap();

    let handles: Vec<_> = (0..AGENTS)
        .map(|_| {
            let region = region.clone();
            thread::spawn(move || {
                let mutex = Mutex::attach(&region, 0).unwrap();
                let counter = region.word(4).unwrap();
                for _ in 0..ITERATIONS {
                    let _guard = mutex.lock();
                    let value = counter.load(Ordering::Relaxed);
                    thread::yield_now();
                    counter.store(value + 1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    let counter = region.word(4).unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), AGENTS as u32 * ITERATIONS);
}

#[test]
fn test_mutual_exclusion_without_spinning() {
    let mutex = Mutex::new().with_config(SyncConfig::long_wait());
    let counter = AtomicWord::new(0);

    let handles: Vec<_> = (0..AGENTS)
        .map(|_| {
            let (mutex, counter) = (mutex.clone(), counter.clone());
            thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    let _guard = mutex.lock();
                    let value = counter.load(Ordering::Relaxed);
                    counter.store(value + 1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), AGENTS as u32 * ITERATIONS);
    assert!(!mutex.is_locked());
}

#[test]
fn test_semaphore_bound_of_one() {
    let sem = Semaphore::new(1, 1).unwrap();
    let holders = AtomicWord::new(0);
    let max_seen = AtomicWord::new(0);

    let handles: Vec<_> = (0..AGENTS)
        .map(|_| {
            let (sem, holders, max_seen) = (sem.clone(), holders.clone(), max_seen.clone());
            thread::spawn(move || {
                for _ in 0..200 {
                    assert!(sem.wait(Some(Duration::from_secs(10))));
                    let now = holders.fetch_add(1) + 1;
                    let mut seen = max_seen.load(Ordering::SeqCst);
                    while now > seen {
                        match max_seen.compare_exchange(seen, now) {
                            Ok(_) => break,
                            Err(actual) => seen = actual,
                        }
                    }
                    thread::yield_now();
                    holders.fetch_sub(1);
                    sem.release(1).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert_eq!(sem.count(), 1);
}

#[test]
fn test_semaphore_bounds_concurrency() {
    const PERMITS: u32 = 3;
    let sem = Semaphore::new(PERMITS, PERMITS).unwrap();
    let holders = AtomicWord::new(0);

    let handles: Vec<_> = (0..AGENTS)
        .map(|_| {
            let (sem, holders) = (sem.clone(), holders.clone());
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..100 {
                    assert!(sem.wait(None));
                    let now = holders.fetch_add(1) + 1;
                    assert!(now <= PERMITS);
                    // Random hold time to vary the interleavings
                    for _ in 0..rng.gen_range(0..4) {
                        thread::yield_now();
                    }
                    holders.fetch_sub(1);
                    sem.release(1).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(sem.count(), PERMITS);
}

#[test]
fn test_semaphore_release_many_wakes_many() {
    let sem = Semaphore::new(0, 4).unwrap();
    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let sem = sem.clone();
            thread::spawn(move || sem.wait(Some(Duration::from_secs(5))))
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    assert_eq!(sem.release(4).unwrap(), 0);

    for waiter in waiters {
        assert!(waiter.join().unwrap());
    }
    assert_eq!(sem.count(), 0);
}

#[test]
fn test_condvar_notify_all_releases_every_waiter() {
    let region = SharedRegion::new(12);
    let mutex = Mutex::attach(&region, 0).unwrap();
    let condvar = ConditionVariable::attach(&region, 4).unwrap();
    let go = region.word(8).unwrap();

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let region = region.clone();
            thread::spawn(move || {
                let mutex = Mutex::attach(&region, 0).unwrap();
                let condvar = ConditionVariable::attach(&region, 4).unwrap();
                let go = region.word(8).unwrap();
                let mut guard = mutex.lock();
                condvar.wait_until(&mut guard, Some(Duration::from_secs(5)), || {
                    go.load(Ordering::SeqCst) == 1
                })
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    {
        let _guard = mutex.lock();
        go.store(1, Ordering::SeqCst);
    }
    condvar.notify_all();

    for waiter in waiters {
        assert!(waiter.join().unwrap());
    }
}

#[test]
fn test_condvar_wait_until_times_out_with_false_condition() {
    let mutex = Mutex::new();
    let condvar = ConditionVariable::new();

    let mut guard = mutex.lock();
    assert!(!condvar.wait_until(&mut guard, Some(Duration::from_millis(30)), || false));
    drop(guard);
    assert!(!mutex.is_locked());
}
