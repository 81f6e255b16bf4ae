/*!
 * Handle Validation Tests
 * Attaching primitives to caller-supplied regions
 */

use agent_sync::{
    encode, identify, AutoResetEvent, ConditionVariable, CountdownEvent, ManualResetEvent, Mutex,
    PrimitiveKind, Semaphore, SharedPrimitive, SharedRegion, SyncError,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::Ordering;

#[test]
fn test_mutex_over_semaphore_is_invalid_handle() {
    let sem = Semaphore::new(1, 1).unwrap();

    let err = Mutex::attach(sem.buffer(), sem.byte_offset()).unwrap_err();
    assert_eq!(
        err,
        SyncError::InvalidHandle {
            expected: PrimitiveKind::Mutex,
            word: encode(PrimitiveKind::Semaphore, 0),
        }
    );
    assert!(err.is_handle_error());
}

#[test]
fn test_misaligned_offset() {
    let region = SharedRegion::new(5);
    assert_eq!(
        Mutex::attach(&region, 1).unwrap_err(),
        SyncError::NotAligned { offset: 1 }
    );
}

#[test]
fn test_empty_region_is_out_of_range() {
    let region = SharedRegion::new(0);
    assert_eq!(
        Mutex::attach(&region, 0).unwrap_err(),
        SyncError::OutOfRange {
            offset: 0,
            required: 4,
            length: 0,
        }
    );
    assert!(matches!(
        ManualResetEvent::attach(&region, 0),
        Err(SyncError::OutOfRange { .. })
    ));
}

#[test]
fn test_multi_word_primitive_needs_full_span() {
    let region = SharedRegion::new(Semaphore::SIZE - 4);
    assert!(matches!(
        Semaphore::attach(&region, 0),
        Err(SyncError::OutOfRange { required: 16, .. })
    ));

    let region = SharedRegion::new(CountdownEvent::SIZE + 4);
    assert!(CountdownEvent::attach(&region, 4).is_ok());
    assert!(matches!(
        CountdownEvent::attach(&region, 8),
        Err(SyncError::OutOfRange { .. })
    ));
}

#[test]
fn test_sizes() {
    assert_eq!(Mutex::SIZE, 4);
    assert_eq!(ConditionVariable::SIZE, 4);
    assert_eq!(AutoResetEvent::SIZE, 4);
    assert_eq!(ManualResetEvent::SIZE, 4);
    assert_eq!(CountdownEvent::SIZE, 12);
    assert_eq!(Semaphore::SIZE, 16);
}

#[test]
fn test_primitives_side_by_side() {
    // Mutex, condvar, countdown and a payload word in one region
    let region = SharedRegion::new(24);
    let mutex = Mutex::attach(&region, 0).unwrap();
    let condvar = ConditionVariable::attach(&region, 4).unwrap();
    let countdown = CountdownEvent::new_in(&region, 8, 2).unwrap();
    let payload = region.word(20).unwrap();

    assert_eq!(identify(region.word(0).unwrap().load(Ordering::SeqCst)), Some(PrimitiveKind::Mutex));
    assert_eq!(
        identify(region.word(4).unwrap().load(Ordering::SeqCst)),
        Some(PrimitiveKind::ConditionVariable)
    );
    assert_eq!(
        identify(region.word(8).unwrap().load(Ordering::SeqCst)),
        Some(PrimitiveKind::CountdownEvent)
    );

    {
        let _guard = mutex.lock();
        payload.store(7, Ordering::SeqCst);
    }
    condvar.notify_all();
    countdown.signal(2).unwrap();

    assert_eq!(payload.load(Ordering::SeqCst), 7);
    assert!(countdown.is_set());
    assert!(!mutex.is_locked());
}

#[test]
fn test_each_kind_rejects_the_others() {
    let region = SharedRegion::new(4);
    AutoResetEvent::attach(&region, 0).unwrap();

    assert!(Mutex::attach(&region, 0).is_err());
    assert!(ConditionVariable::attach(&region, 0).is_err());
    assert!(ManualResetEvent::attach(&region, 0).is_err());
    assert!(AutoResetEvent::attach(&region, 0).is_ok());
}
