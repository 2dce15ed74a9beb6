use std::collections::VecDeque;
use std::rc::Rc;

use easy_queue::queue::{self, Local, Mode, Queue};
use easy_queue::{Error, Timeout};

#[test]
fn smoke() {
    let q = Local::create(2).unwrap();

    q.put(7, Timeout::None).unwrap();
    assert_eq!(q.get(Timeout::None).unwrap(), 7);

    q.put(8, Timeout::None).unwrap();
    assert_eq!(q.get(Timeout::None).unwrap(), 8);
    assert!(matches!(q.get(Timeout::None), Err(Error::WouldBlock)));
}

#[test]
fn zero_capacity() {
    assert!(matches!(
        Local::<u32>::create(0),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        queue::create::<u32>(0, Mode::Unsynchronized),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn fifo() {
    let q = Local::create(8).unwrap();

    for i in 0..8 {
        q.put(i, Timeout::None).unwrap();
    }
    for i in 0..8 {
        assert_eq!(q.get(Timeout::None).unwrap(), i);
    }
}

#[test]
fn overflow() {
    let q = Local::create(3).unwrap();
    for i in 0..3 {
        q.put(i, Timeout::None).unwrap();
    }

    // The timeout is ignored: nothing could ever free a slot.
    let err = q.put(3, Timeout::Infinite).unwrap_err();
    assert!(matches!(err.kind(), Error::CacheOverflow));
    assert_eq!(err.into_inner(), 3);
    assert_eq!(q.len(), 3);
}

#[test]
fn capacity_one() {
    let q = Local::create(1).unwrap();
    assert_eq!(q.capacity(), 1);

    q.put('x', Timeout::None).unwrap();
    assert!(q.is_full());
    assert!(q.put('y', Timeout::None).is_err());

    assert_eq!(q.get(Timeout::None).unwrap(), 'x');
    assert!(q.get(Timeout::None).is_err());
    assert!(q.is_empty());
}

#[test]
fn len_empty_full() {
    let q = Local::create(2).unwrap();

    assert_eq!(q.len(), 0);
    assert_eq!(q.is_empty(), true);
    assert_eq!(q.is_full(), false);
    assert_eq!(q.slack(), 2);

    q.put((), Timeout::None).unwrap();
    q.put((), Timeout::None).unwrap();

    assert_eq!(q.len(), 2);
    assert_eq!(q.is_empty(), false);
    assert_eq!(q.is_full(), true);
    assert_eq!(q.slack(), 0);
}

#[test]
fn reset() {
    let q = Local::create(4).unwrap();

    q.reset().unwrap();
    assert!(q.is_empty());

    for i in 0..3 {
        q.put(i, Timeout::None).unwrap();
    }
    q.get(Timeout::None).unwrap();

    q.reset().unwrap();
    assert!(q.is_empty());

    // Cursors start over, so a full round still comes out in order.
    for i in 10..14 {
        q.put(i, Timeout::None).unwrap();
    }
    for i in 10..14 {
        assert_eq!(q.get(Timeout::None).unwrap(), i);
    }
}

#[test]
fn reset_drops_values() {
    let q = Local::create(4).unwrap();
    let rc = Rc::new(());

    q.put(rc.clone(), Timeout::None).unwrap();
    q.put(rc.clone(), Timeout::None).unwrap();
    assert_eq!(Rc::strong_count(&rc), 3);

    q.reset().unwrap();
    assert_eq!(Rc::strong_count(&rc), 1);
}

#[test]
fn destroy() {
    let q = Local::create(2).unwrap();
    q.put(1, Timeout::None).unwrap();

    q.destroy().unwrap();

    assert!(matches!(q.destroy(), Err(Error::InvalidEntry)));
    assert!(matches!(q.get(Timeout::None), Err(Error::InvalidEntry)));
    assert!(matches!(q.reset(), Err(Error::InvalidEntry)));
    let err = q.put(2, Timeout::None).unwrap_err();
    assert!(matches!(err.kind(), Error::InvalidEntry));
}

#[test]
fn dynamic_mode() {
    let q = queue::create::<u8>(4, Mode::Unsynchronized).unwrap();
    assert_eq!(q.mode(), Mode::Unsynchronized);
    assert_eq!(q.capacity(), 4);

    let q = queue::create::<u8>(4, Mode::Synchronized).unwrap();
    assert_eq!(q.mode(), Mode::Synchronized);
}

#[test]
fn random_ops() {
    const STEPS: usize = if cfg!(miri) { 500 } else { 50_000 };
    const CAPACITY: u16 = 5;

    let q = Local::create(CAPACITY).unwrap();
    let mut model = VecDeque::new();
    let mut next = 0u32;

    for _ in 0..STEPS {
        match fastrand::u8(..10) {
            0 => {
                q.reset().unwrap();
                model.clear();
            }
            1..=5 => {
                let res = q.put(next, Timeout::None);
                if model.len() < usize::from(CAPACITY) {
                    res.unwrap();
                    model.push_back(next);
                } else {
                    assert!(matches!(res.unwrap_err().kind(), Error::CacheOverflow));
                }
                next += 1;
            }
            _ => match model.pop_front() {
                Some(v) => assert_eq!(q.get(Timeout::None).unwrap(), v),
                None => assert!(matches!(q.get(Timeout::None), Err(Error::WouldBlock))),
            },
        }

        assert_eq!(q.len(), model.len());
        assert!(q.len() <= q.capacity());
    }
}
