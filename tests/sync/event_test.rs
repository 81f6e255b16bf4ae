/*!
 * Event Tests
 * Auto-reset, manual-reset and countdown events across threads
 */

use agent_sync::{
    AtomicWord, AutoResetEvent, CountdownEvent, ManualResetEvent, SharedPrimitive, SharedRegion,
};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

#[test]
fn test_auto_reset_releases_exactly_one() {
    let event = AutoResetEvent::new(false);
    let released = AtomicWord::new(0);

    let waiters: Vec<_> = (0..2)
        .map(|_| {
            let (event, released) = (event.clone(), released.clone());
            thread::spawn(move || {
                if event.wait(Some(Duration::from_millis(500))) {
                    released.fetch_add(1);
                    true
                } else {
                    false
                }
            })
        })
        .collect();

    // One set, retried until it actually lands on a parked waiter
    while !event.set() {
        thread::sleep(Duration::from_millis(1));
    }

    let results: Vec<bool> = waiters.into_iter().map(|w| w.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| **r).count(), 1);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_auto_reset_each_set_releases_one() {
    let event = AutoResetEvent::new(false);
    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let event = event.clone();
            thread::spawn(move || event.wait(Some(Duration::from_secs(5))))
        })
        .collect();

    for _ in 0..3 {
        while !event.set() {
            thread::sleep(Duration::from_millis(1));
        }
    }

    for waiter in waiters {
        assert!(waiter.join().unwrap());
    }
    assert!(!event.is_set());
}

#[test]
fn test_auto_reset_racing_setters_release_at_most_waiters() {
    const WAITERS: usize = 2;
    const SETTERS: usize = 8;

    let event = AutoResetEvent::new(false);
    let released = AtomicWord::new(0);
    let successful_sets = AtomicWord::new(0);

    let waiters: Vec<_> = (0..WAITERS)
        .map(|_| {
            let (event, released) = (event.clone(), released.clone());
            thread::spawn(move || {
                if event.wait(Some(Duration::from_millis(500))) {
                    released.fetch_add(1);
                }
            })
        })
        .collect();

    // Let the waiters park before the setters race
    thread::sleep(Duration::from_millis(50));

    let setters: Vec<_> = (0..SETTERS)
        .map(|_| {
            let (event, successful_sets) = (event.clone(), successful_sets.clone());
            thread::spawn(move || {
                for _ in 0..20 {
                    if event.set() {
                        successful_sets.fetch_add(1);
                    }
                    thread::yield_now();
                }
            })
        })
        .collect();

    for setter in setters {
        setter.join().unwrap();
    }
    for waiter in waiters {
        waiter.join().unwrap();
    }

    let released = released.load(Ordering::SeqCst);
    assert_eq!(successful_sets.load(Ordering::SeqCst), released);
    assert!(released as usize <= WAITERS);
    assert!(!event.is_set());
}

#[test]
fn test_manual_reset_stickiness() {
    let region = SharedRegion::new(ManualResetEvent::SIZE);
    let event = ManualResetEvent::attach(&region, 0).unwrap();
    event.set();

    let waiters: Vec<_> = (0..8)
        .map(|_| {
            let region = region.clone();
            thread::spawn(move || {
                let event = ManualResetEvent::attach(&region, 0).unwrap();
                (0..100).all(|_| event.wait(Some(Duration::ZERO)))
            })
        })
        .collect();

    for waiter in waiters {
        assert!(waiter.join().unwrap());
    }

    event.reset();
    assert!(!event.wait(Some(Duration::from_millis(10))));
}

#[test]
fn test_countdown_signals_waiters_exactly_once() {
    const SIGNALERS: u32 = 8;
    let countdown = CountdownEvent::new(SIGNALERS).unwrap();
    let zero_transitions = AtomicWord::new(0);

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let countdown = countdown.clone();
            thread::spawn(move || {
                let set = countdown.wait(Some(Duration::from_secs(5)));
                // Never released before the last signal
                (set, countdown.remaining_count())
            })
        })
        .collect();

    let signalers: Vec<_> = (0..SIGNALERS)
        .map(|_| {
            let (countdown, zero_transitions) = (countdown.clone(), zero_transitions.clone());
            thread::spawn(move || {
                if countdown.signal(1).unwrap() {
                    zero_transitions.fetch_add(1);
                }
            })
        })
        .collect();

    for signaler in signalers {
        signaler.join().unwrap();
    }
    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), (true, 0));
    }
    assert_eq!(zero_transitions.load(Ordering::SeqCst), 1);
    assert!(countdown.signal(1).is_err());
}

#[test]
fn test_countdown_wait_times_out_before_zero() {
    let countdown = CountdownEvent::new(2).unwrap();
    countdown.signal(1).unwrap();
    assert!(!countdown.wait(Some(Duration::from_millis(20))));
    assert_eq!(countdown.remaining_count(), 1);
}
