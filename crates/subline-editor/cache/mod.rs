//! Background computation cache
//!
//! [`CacheProvider`] computes values for keys on worker threads and caches
//! the results. Each key is in exactly one state: absent, in flight, or
//! ready. Requests are served last-in first-out so that the most recently
//! requested keys (typically what is on screen right now) finish first.
//!
//! Results reach the owner thread through [`CacheProvider::drain`], which
//! publishes a [`CacheEvent`] per finished key on the `finished` channel.
//! A result whose key was invalidated or rescheduled after the computation
//! started is discarded.

use crate::core::{EditorError, Result};
use crate::events::EventChannel;
use core::fmt;
use core::hash::Hash;
use core::marker::PhantomData;
use futures::channel::mpsc;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, trace, warn};

/// Computes one value for one key on a worker thread
pub trait Worker<K, V>: Send + Sync + 'static {
    /// Error reported for a failed computation
    type Error: fmt::Display;

    fn work(&self, key: &K) -> core::result::Result<V, Self::Error>;
}

/// Adapter turning a closure into a [`Worker`]
pub struct FnWorker<F, E> {
    work: F,
    _error: PhantomData<fn() -> E>,
}

/// Wrap a closure as a [`Worker`]
pub fn worker_fn<K, V, E, F>(work: F) -> FnWorker<F, E>
where
    F: Fn(&K) -> core::result::Result<V, E> + Send + Sync + 'static,
    E: fmt::Display + 'static,
{
    FnWorker {
        work,
        _error: PhantomData,
    }
}

impl<K, V, E, F> Worker<K, V> for FnWorker<F, E>
where
    F: Fn(&K) -> core::result::Result<V, E> + Send + Sync + 'static,
    E: fmt::Display + 'static,
{
    type Error = E;

    fn work(&self, key: &K) -> core::result::Result<V, E> {
        (self.work)(key)
    }
}

/// State of a key as seen by a consumer
#[derive(Debug)]
pub enum CacheLookup<V> {
    /// Value is available
    Ready(Arc<V>),
    /// Computation is queued or running
    Pending,
    /// Nothing known about the key
    Absent,
}

impl<V> CacheLookup<V> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The value, if ready
    pub fn ready(self) -> Option<Arc<V>> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending | Self::Absent => None,
        }
    }
}

/// Published on the owner thread for every finished key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent<K> {
    /// The key's value is now ready
    Ready(K),
    /// The computation failed; the key is absent again
    Failed(K),
}

/// Counters kept by a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Keys accepted by `schedule`
    pub scheduled: usize,
    /// Computations started by workers
    pub dispatched: usize,
    /// Results stored
    pub completed: usize,
    /// Computations that errored or panicked
    pub failed: usize,
    /// Results dropped because their key was invalidated meanwhile
    pub discarded: usize,
}

/// Provider configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Number of worker threads (at least one is started)
    pub workers: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

enum Entry<V> {
    InFlight { generation: u64 },
    Ready(Arc<V>),
}

struct State<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// Pending tasks; the last element is served first
    tasks: Vec<(K, u64)>,
    next_generation: u64,
    shutdown: bool,
    stats: CacheStats,
}

struct Shared<K, V> {
    state: Mutex<State<K, V>>,
    available: Condvar,
}

/// Keyed cache filled by background workers
pub struct CacheProvider<K, V> {
    name: &'static str,
    shared: Arc<Shared<K, V>>,
    workers: Vec<JoinHandle<()>>,
    completions: mpsc::UnboundedReceiver<CacheEvent<K>>,
    finished: EventChannel<CacheProvider<K, V>, CacheEvent<K>>,
}

impl<K, V> fmt::Debug for CacheProvider<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheProvider")
            .field("name", &self.name)
            .field("workers", &self.workers.len())
            .field("stats", &self.shared.state.lock().stats)
            .finish()
    }
}

impl<K, V> CacheProvider<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    V: Send + Sync + 'static,
{
    /// Start a provider with its worker threads
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::WorkerError`] if a thread cannot be spawned.
    pub fn new<W>(name: &'static str, worker: W, config: CacheConfig) -> Result<Self>
    where
        W: Worker<K, V>,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                entries: HashMap::new(),
                tasks: Vec::new(),
                next_generation: 0,
                shutdown: false,
                stats: CacheStats::default(),
            }),
            available: Condvar::new(),
        });
        let worker = Arc::new(worker);
        let (sender, completions) = mpsc::unbounded();

        let count = config.workers.max(1);
        let mut workers = Vec::with_capacity(count);
        for index in 0..count {
            let thread_shared = Arc::clone(&shared);
            let worker = Arc::clone(&worker);
            let sender = sender.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("{name}-worker-{index}"))
                .spawn(move || worker_loop(name, &thread_shared, &*worker, &sender));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    // Dropping the partial provider stops the workers already running
                    drop(Self {
                        name,
                        shared,
                        workers,
                        completions,
                        finished: EventChannel::new("cache-finished"),
                    });
                    return Err(EditorError::WorkerError {
                        message: format!("failed to spawn {name} worker: {err}"),
                    });
                }
            }
        }
        debug!(name, workers = count, "cache provider started");

        Ok(Self {
            name,
            shared,
            workers,
            completions,
            finished: EventChannel::new("cache-finished"),
        })
    }

    /// Channel publishing [`CacheEvent`]s from [`drain`](Self::drain)
    pub fn finished(&self) -> &EventChannel<CacheProvider<K, V>, CacheEvent<K>> {
        &self.finished
    }

    /// Request computation of `key`; no-op if it is in flight or ready
    ///
    /// Returns whether a new task was queued.
    pub fn schedule(&self, key: K) -> bool {
        let mut state = self.shared.state.lock();
        if state.shutdown || state.entries.contains_key(&key) {
            return false;
        }

        let generation = state.next_generation;
        state.next_generation += 1;
        state
            .entries
            .insert(key.clone(), Entry::InFlight { generation });
        state.tasks.push((key, generation));
        state.stats.scheduled += 1;
        drop(state);

        self.shared.available.notify_one();
        true
    }

    /// Current state of `key`
    pub fn lookup(&self, key: &K) -> CacheLookup<V> {
        match self.shared.state.lock().entries.get(key) {
            Some(Entry::Ready(value)) => CacheLookup::Ready(Arc::clone(value)),
            Some(Entry::InFlight { .. }) => CacheLookup::Pending,
            None => CacheLookup::Absent,
        }
    }

    /// Look `key` up, scheduling it when absent
    pub fn lookup_or_schedule(&self, key: &K) -> CacheLookup<V> {
        match self.lookup(key) {
            CacheLookup::Absent => {
                self.schedule(key.clone());
                CacheLookup::Pending
            }
            found => found,
        }
    }

    /// Drop every queued task; ready values and running computations stay
    pub fn clear_tasks(&self) {
        let mut state = self.shared.state.lock();
        let tasks = core::mem::take(&mut state.tasks);
        for (key, generation) in &tasks {
            if matches!(state.entries.get(key), Some(Entry::InFlight { generation: g }) if g == generation)
            {
                state.entries.remove(key);
            }
        }
        trace!(name = self.name, dropped = tasks.len(), "cleared pending tasks");
    }

    /// Forget every key matching `predicate`, ready or not
    pub fn invalidate<P>(&self, mut predicate: P)
    where
        P: FnMut(&K) -> bool,
    {
        let mut state = self.shared.state.lock();
        state.entries.retain(|key, _| !predicate(key));
        state.tasks.retain(|(key, _)| !predicate(key));
    }

    /// Forget every key
    pub fn invalidate_all(&self) {
        let mut state = self.shared.state.lock();
        state.entries.clear();
        state.tasks.clear();
        debug!(name = self.name, "cache invalidated");
    }

    /// Number of ready values
    pub fn ready_count(&self) -> usize {
        self.shared
            .state
            .lock()
            .entries
            .values()
            .filter(|entry| matches!(entry, Entry::Ready(_)))
            .count()
    }

    /// Number of queued tasks not yet picked up by a worker
    pub fn pending_tasks(&self) -> usize {
        self.shared.state.lock().tasks.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.shared.state.lock().stats
    }

    /// Deliver finished results on the calling thread
    ///
    /// Publishes one event per result that is still current and returns
    /// them in completion order.
    pub fn drain(&mut self) -> Vec<CacheEvent<K>> {
        let mut delivered = Vec::new();
        while let Ok(Some(event)) = self.completions.try_next() {
            let current = match &event {
                CacheEvent::Ready(key) => self.lookup(key).is_ready(),
                CacheEvent::Failed(_) => true,
            };
            if current {
                delivered.push(event);
            }
        }

        for event in &delivered {
            self.finished.emit(self, event.clone());
        }
        delivered
    }

    /// Drain until `key` is no longer pending
    ///
    /// Intended for tests and command-line use where there is no event loop.
    pub fn wait_for(&mut self, key: &K) -> CacheLookup<V> {
        loop {
            match self.lookup(key) {
                CacheLookup::Pending => {
                    self.drain();
                    std::thread::yield_now();
                }
                done => {
                    self.drain();
                    return done;
                }
            }
        }
    }
}

impl<K, V> Drop for CacheProvider<K, V> {
    /// Stop idle workers and detach busy ones
    ///
    /// A worker inside a computation finishes it on its own and then exits;
    /// its result is dropped with the channel.
    fn drop(&mut self) {
        self.shared.state.lock().shutdown = true;
        self.shared.available.notify_all();
        for handle in self.workers.drain(..) {
            if !handle.is_finished() {
                trace!(name = self.name, "detaching busy cache worker");
                continue;
            }
            if handle.join().is_err() {
                warn!(name = self.name, "cache worker exited abnormally");
            }
        }
    }
}

fn worker_loop<K, V, W>(
    name: &'static str,
    shared: &Shared<K, V>,
    worker: &W,
    sender: &mpsc::UnboundedSender<CacheEvent<K>>,
) where
    K: Eq + Hash + Clone + fmt::Debug,
    W: Worker<K, V>,
{
    loop {
        let (key, generation) = {
            let mut state = shared.state.lock();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(task) = state.tasks.pop() {
                    state.stats.dispatched += 1;
                    break task;
                }
                shared.available.wait(&mut state);
            }
        };

        trace!(name, ?key, "computing");
        let outcome = catch_unwind(AssertUnwindSafe(|| worker.work(&key)));

        let mut state = shared.state.lock();
        let current = matches!(
            state.entries.get(&key),
            Some(Entry::InFlight { generation: g }) if *g == generation
        );
        if !current {
            state.stats.discarded += 1;
            trace!(name, ?key, "discarding stale result");
            continue;
        }

        let event = match outcome {
            Ok(Ok(value)) => {
                state.entries.insert(key.clone(), Entry::Ready(Arc::new(value)));
                state.stats.completed += 1;
                CacheEvent::Ready(key)
            }
            Ok(Err(err)) => {
                warn!(name, ?key, %err, "background computation failed");
                state.entries.remove(&key);
                state.stats.failed += 1;
                CacheEvent::Failed(key)
            }
            Err(_) => {
                warn!(name, ?key, "background computation panicked");
                state.entries.remove(&key);
                state.stats.failed += 1;
                CacheEvent::Failed(key)
            }
        };
        // Sent under the lock so a visible result always has its message queued
        let delivered = sender.unbounded_send(event).is_ok();
        drop(state);
        if !delivered {
            return;
        }
    }
}
