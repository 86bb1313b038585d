//! Background cache scheduling and delivery tests

use parking_lot::Mutex;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use subline_editor::{worker_fn, CacheConfig, CacheEvent, CacheLookup, CacheProvider};

/// Key that blocks the worker until the gate is opened
const GATE: u32 = 0;

struct Gated {
    cache: CacheProvider<u32, u32>,
    order: Arc<Mutex<Vec<u32>>>,
    open: mpsc::Sender<()>,
}

/// Single-worker cache whose worker is parked inside [`GATE`] on return
fn gated() -> Gated {
    let (open, gate) = mpsc::channel::<()>();
    let (started, running) = mpsc::channel::<()>();
    let gate = Mutex::new(gate);
    let started = Mutex::new(started);
    let order = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&order);

    let cache = CacheProvider::new(
        "gated",
        worker_fn(move |key: &u32| {
            if *key == GATE {
                let _ = started.lock().send(());
                let _ = gate.lock().recv();
            }
            log.lock().push(*key);
            Ok::<_, String>(*key + 1)
        }),
        CacheConfig::default(),
    )
    .unwrap();

    cache.schedule(GATE);
    running.recv().unwrap();
    Gated { cache, order, open }
}

#[test]
fn most_recent_request_is_served_first() {
    let Gated {
        mut cache,
        order,
        open,
    } = gated();

    cache.schedule(100);
    cache.schedule(200);
    assert_eq!(cache.pending_tasks(), 2);
    open.send(()).unwrap();

    cache.wait_for(&100);
    cache.wait_for(&200);
    assert_eq!(*order.lock(), vec![GATE, 200, 100]);
}

#[test]
fn double_schedule_computes_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut cache = CacheProvider::new(
        "counting",
        worker_fn(move |key: &u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(*key)
        }),
        CacheConfig::default(),
    )
    .unwrap();

    assert!(cache.schedule(5));
    assert!(!cache.schedule(5));
    assert!(cache.wait_for(&5).is_ready());
    assert!(!cache.schedule(5));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.stats().scheduled, 1);
}

#[test]
fn invalidated_result_is_discarded() {
    let Gated { mut cache, open, .. } = gated();

    cache.invalidate_all();
    open.send(()).unwrap();
    cache.schedule(7);
    cache.wait_for(&7);

    assert!(matches!(cache.lookup(&GATE), CacheLookup::Absent));
    assert_eq!(cache.stats().discarded, 1);
    assert_eq!(cache.stats().completed, 1);
}

#[test]
fn clear_tasks_keeps_running_and_ready_keys() {
    let Gated { mut cache, open, .. } = gated();

    cache.schedule(1);
    cache.schedule(2);
    cache.clear_tasks();
    assert_eq!(cache.pending_tasks(), 0);
    assert!(matches!(cache.lookup(&1), CacheLookup::Absent));
    assert!(matches!(cache.lookup(&GATE), CacheLookup::Pending));

    open.send(()).unwrap();
    assert_eq!(cache.wait_for(&GATE).ready().as_deref(), Some(&1));

    cache.clear_tasks();
    assert!(cache.lookup(&GATE).is_ready());
}

#[test]
fn dropping_does_not_wait_for_a_busy_worker() {
    let Gated { cache, order, open } = gated();

    let opener = thread::spawn(move || {
        thread::sleep(Duration::from_secs(2));
        let _ = open.send(());
    });

    let started = Instant::now();
    drop(cache);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(order.lock().is_empty());

    opener.join().unwrap();
}

#[test]
fn panicking_worker_leaves_key_absent() {
    let mut cache = CacheProvider::new(
        "panicky",
        worker_fn(|key: &u32| {
            assert!(*key != 13, "unlucky key");
            Ok::<_, String>(*key)
        }),
        CacheConfig { workers: 2 },
    )
    .unwrap();

    cache.schedule(13);
    assert!(matches!(cache.wait_for(&13), CacheLookup::Absent));
    assert_eq!(cache.stats().failed, 1);

    cache.schedule(14);
    assert!(cache.wait_for(&14).is_ready());
}

#[test]
fn finished_channel_reports_deliveries() {
    let mut cache = CacheProvider::new(
        "observed",
        worker_fn(|key: &u32| {
            if *key % 2 == 0 {
                Ok(*key)
            } else {
                Err(format!("odd key {key}"))
            }
        }),
        CacheConfig::default(),
    )
    .unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    cache
        .finished()
        .subscribe(move |_: &CacheProvider<u32, u32>, event: &CacheEvent<u32>| {
            sink.borrow_mut().push(event.clone());
        });

    cache.schedule(2);
    cache.wait_for(&2);
    cache.schedule(3);
    cache.wait_for(&3);

    assert_eq!(
        *seen.borrow(),
        vec![CacheEvent::Ready(2), CacheEvent::Failed(3)]
    );
}
