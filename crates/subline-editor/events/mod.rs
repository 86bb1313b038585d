//! Synchronous change notification
//!
//! An [`EventChannel`] delivers events to subscribed handlers in priority
//! order (highest first, then subscription order). Handlers receive the
//! emitting object by shared reference, so they observe the final state of
//! the change but cannot re-enter mutation of it.
//!
//! Handlers may subscribe or unsubscribe while an emission is running. A
//! handler added during an emission is first called on the next emission; a
//! handler removed during an emission is not called again, not even later in
//! the same emission. A handler is never called after it was removed.
//!
//! # Examples
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use subline_editor::events::EventChannel;
//!
//! let channel: EventChannel<str, usize> = EventChannel::new("demo");
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let sink = Rc::clone(&seen);
//! channel.subscribe(move |source: &str, event: &usize| {
//!     sink.borrow_mut().push(format!("{source}:{event}"));
//! });
//!
//! channel.emit("grid", 3);
//! assert_eq!(*seen.borrow(), vec!["grid:3".to_string()]);
//! ```

use core::cell::{Cell, RefCell};
use core::fmt;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use tracing::{trace, warn};

/// Priority used by [`EventChannel::subscribe`]
pub const DEFAULT_PRIORITY: i32 = 0;

/// Priority for consumers that must observe a change before views do
pub const INTERNAL_PRIORITY: i32 = 100;

/// Identifier returned by [`EventChannel::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<S, E> = Box<dyn FnMut(&S, &E)>;
type Slots<S, E> = Rc<RefCell<Vec<Rc<HandlerSlot<S, E>>>>>;

/// One registered handler
struct HandlerSlot<S: ?Sized, E> {
    id: SubscriptionId,
    priority: i32,
    active: Cell<bool>,
    handler: RefCell<Handler<S, E>>,
}

/// Statistics about event delivery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventStats {
    /// Events delivered to handlers
    pub events_dispatched: usize,
    /// Individual handler invocations
    pub handler_calls: usize,
    /// Invocations skipped because the handler was already running
    pub reentrant_skips: usize,
    /// Events queued while the channel was held
    pub events_held: usize,
}

/// Ordered, re-entrancy safe observer list
pub struct EventChannel<S: ?Sized, E> {
    name: &'static str,
    slots: Slots<S, E>,
    next_id: Cell<u64>,
    held: Cell<usize>,
    pending: RefCell<VecDeque<E>>,
    stats: Cell<EventStats>,
}

impl<S: ?Sized, E> fmt::Debug for EventChannel<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("handlers", &self.handler_count())
            .field("held", &self.held.get())
            .field("stats", &self.stats.get())
            .finish()
    }
}

impl<S: ?Sized, E> EventChannel<S, E> {
    /// Create an empty channel; the name only appears in log output
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
            held: Cell::new(0),
            pending: RefCell::new(VecDeque::new()),
            stats: Cell::new(EventStats::default()),
        }
    }

    /// Channel name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Subscribe with [`DEFAULT_PRIORITY`]
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: FnMut(&S, &E) + 'static,
    {
        self.subscribe_with_priority(DEFAULT_PRIORITY, handler)
    }

    /// Subscribe a handler; higher priorities are called first
    pub fn subscribe_with_priority<F>(&self, priority: i32, handler: F) -> SubscriptionId
    where
        F: FnMut(&S, &E) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let slot = Rc::new(HandlerSlot {
            id,
            priority,
            active: Cell::new(true),
            handler: RefCell::new(Box::new(handler) as Handler<S, E>),
        });

        let mut slots = self.slots.borrow_mut();
        // Equal priorities keep subscription order
        let position = slots
            .iter()
            .position(|existing| existing.priority < priority)
            .unwrap_or(slots.len());
        slots.insert(position, slot);

        trace!(channel = self.name, ?id, priority, "handler subscribed");
        id
    }

    /// Remove a handler; returns false if it was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        remove_slot(&self.slots, id)
    }

    /// Number of subscribed handlers
    pub fn handler_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Delivery statistics
    pub fn stats(&self) -> EventStats {
        self.stats.get()
    }

    /// Queue emissions instead of delivering them until [`release`](Self::release)
    ///
    /// Holds nest; delivery resumes when every hold has been released.
    pub fn hold(&self) {
        self.held.set(self.held.get() + 1);
    }

    /// Whether emissions are currently queued
    pub fn is_held(&self) -> bool {
        self.held.get() > 0
    }

    /// Release one hold, delivering queued events in order once none remain
    pub fn release(&self, source: &S) {
        let held = self.held.get();
        if held == 0 {
            warn!(channel = self.name, "release called without a matching hold");
            return;
        }
        self.held.set(held - 1);
        if held > 1 {
            return;
        }

        loop {
            let next = self.pending.borrow_mut().pop_front();
            match next {
                Some(event) => self.deliver(source, &event),
                None => break,
            }
        }
    }

    /// Deliver an event to every handler, or queue it while held
    pub fn emit(&self, source: &S, event: E) {
        if self.is_held() {
            let mut stats = self.stats.get();
            stats.events_held += 1;
            self.stats.set(stats);
            self.pending.borrow_mut().push_back(event);
            return;
        }
        self.deliver(source, &event);
    }

    fn deliver(&self, source: &S, event: &E) {
        // Snapshot so handlers can (un)subscribe while we iterate
        let snapshot: Vec<Rc<HandlerSlot<S, E>>> = self.slots.borrow().clone();

        let mut calls = 0;
        let mut skips = 0;
        for slot in &snapshot {
            if !slot.active.get() {
                continue;
            }
            match slot.handler.try_borrow_mut() {
                Ok(mut handler) => {
                    (&mut **handler)(source, event);
                    calls += 1;
                }
                Err(_) => {
                    warn!(
                        channel = self.name,
                        id = ?slot.id,
                        "skipping re-entrant delivery to a running handler"
                    );
                    skips += 1;
                }
            }
        }

        let mut stats = self.stats.get();
        stats.events_dispatched += 1;
        stats.handler_calls += calls;
        stats.reentrant_skips += skips;
        self.stats.set(stats);
    }
}

impl<S: ?Sized + 'static, E: 'static> EventChannel<S, E> {
    /// Subscribe and get a guard that unsubscribes when dropped
    pub fn subscribe_scoped<F>(&self, priority: i32, handler: F) -> Subscription
    where
        F: FnMut(&S, &E) + 'static,
    {
        let id = self.subscribe_with_priority(priority, handler);
        let slots = Rc::downgrade(&self.slots);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(slots) = Weak::upgrade(&slots) {
                    remove_slot(&slots, id);
                }
            })),
        }
    }
}

fn remove_slot<S: ?Sized, E>(slots: &Slots<S, E>, id: SubscriptionId) -> bool {
    let mut slots = slots.borrow_mut();
    match slots.iter().position(|slot| slot.id == id) {
        Some(position) => {
            let slot = slots.remove(position);
            slot.active.set(false);
            true
        }
        None => false,
    }
}

/// Guard returned by [`EventChannel::subscribe_scoped`]
///
/// Dropping the guard unsubscribes the handler. The guard does not keep the
/// channel alive; if the channel is gone first, dropping it does nothing.
#[must_use = "dropping a Subscription unsubscribes its handler immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Keep the handler subscribed for as long as the channel lives
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.cancel.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder(log: &Log, tag: &'static str) -> impl FnMut(&(), &u32) + 'static {
        let log = Rc::clone(log);
        move |_: &(), event: &u32| log.borrow_mut().push(format!("{tag}{event}"))
    }

    #[test]
    fn priority_then_subscription_order() {
        let channel: EventChannel<(), u32> = EventChannel::new("test");
        let log: Log = Rc::default();

        channel.subscribe(recorder(&log, "a"));
        channel.subscribe_with_priority(INTERNAL_PRIORITY, recorder(&log, "internal"));
        channel.subscribe(recorder(&log, "b"));
        channel.subscribe_with_priority(-5, recorder(&log, "late"));

        channel.emit(&(), 1);
        assert_eq!(
            *log.borrow(),
            vec!["internal1", "a1", "b1", "late1"]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let channel: EventChannel<(), u32> = EventChannel::new("test");
        let log: Log = Rc::default();

        let id = channel.subscribe(recorder(&log, "a"));
        channel.emit(&(), 1);
        assert!(channel.unsubscribe(id));
        assert!(!channel.unsubscribe(id));
        channel.emit(&(), 2);

        assert_eq!(*log.borrow(), vec!["a1"]);
        assert_eq!(channel.handler_count(), 0);
    }

    #[test]
    fn handler_removed_mid_emission_is_not_called() {
        let channel: Rc<EventChannel<(), u32>> = Rc::new(EventChannel::new("test"));
        let log: Log = Rc::default();
        let victim = Rc::new(Cell::new(None));

        let remover_channel = Rc::downgrade(&channel);
        let remover_victim = Rc::clone(&victim);
        channel.subscribe(move |_: &(), _: &u32| {
            if let (Some(channel), Some(id)) = (remover_channel.upgrade(), remover_victim.get()) {
                channel.unsubscribe(id);
            }
        });
        victim.set(Some(channel.subscribe(recorder(&log, "victim"))));

        channel.emit(&(), 1);
        channel.emit(&(), 2);
        assert!(log.borrow().is_empty());
        assert_eq!(channel.handler_count(), 1);
    }

    #[test]
    fn handler_can_unsubscribe_itself() {
        let channel: Rc<EventChannel<(), u32>> = Rc::new(EventChannel::new("test"));
        let calls = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&channel);
        let counter = Rc::clone(&calls);
        let id_cell = Rc::clone(&own_id);
        let id = channel.subscribe(move |_: &(), _: &u32| {
            counter.set(counter.get() + 1);
            if let (Some(channel), Some(id)) = (weak.upgrade(), id_cell.get()) {
                channel.unsubscribe(id);
            }
        });
        own_id.set(Some(id));

        channel.emit(&(), 1);
        channel.emit(&(), 2);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn handler_added_mid_emission_waits_for_next_event() {
        let channel: Rc<EventChannel<(), u32>> = Rc::new(EventChannel::new("test"));
        let log: Log = Rc::default();
        let added = Rc::new(Cell::new(false));

        let weak = Rc::downgrade(&channel);
        let added_flag = Rc::clone(&added);
        let late_log = Rc::clone(&log);
        channel.subscribe(move |_: &(), _: &u32| {
            if added_flag.replace(true) {
                return;
            }
            if let Some(channel) = weak.upgrade() {
                channel.subscribe(recorder(&late_log, "late"));
            }
        });

        channel.emit(&(), 1);
        assert!(log.borrow().is_empty());
        channel.emit(&(), 2);
        assert_eq!(*log.borrow(), vec!["late2"]);
    }

    #[test]
    fn reentrant_emission_skips_running_handler() {
        let channel: Rc<EventChannel<(), u32>> = Rc::new(EventChannel::new("test"));
        let log: Log = Rc::default();

        let weak = Rc::downgrade(&channel);
        let inner_log = Rc::clone(&log);
        channel.subscribe(move |_: &(), event: &u32| {
            inner_log.borrow_mut().push(format!("outer{event}"));
            if *event == 1 {
                if let Some(channel) = weak.upgrade() {
                    channel.emit(&(), 2);
                }
            }
        });
        channel.subscribe(recorder(&log, "other"));

        channel.emit(&(), 1);
        assert_eq!(*log.borrow(), vec!["outer1", "other2", "other1"]);
        assert_eq!(channel.stats().reentrant_skips, 1);
    }

    #[test]
    fn held_events_are_delivered_on_release_in_order() {
        let channel: EventChannel<(), u32> = EventChannel::new("test");
        let log: Log = Rc::default();
        channel.subscribe(recorder(&log, "e"));

        channel.hold();
        channel.hold();
        channel.emit(&(), 1);
        channel.emit(&(), 2);
        channel.release(&());
        assert!(log.borrow().is_empty());
        channel.release(&());

        assert_eq!(*log.borrow(), vec!["e1", "e2"]);
        assert_eq!(channel.stats().events_held, 2);
        assert!(!channel.is_held());
    }

    #[test]
    fn scoped_subscription_unsubscribes_on_drop() {
        let channel: EventChannel<(), u32> = EventChannel::new("test");
        let log: Log = Rc::default();

        let guard = channel.subscribe_scoped(DEFAULT_PRIORITY, recorder(&log, "s"));
        channel.emit(&(), 1);
        drop(guard);
        channel.emit(&(), 2);

        assert_eq!(*log.borrow(), vec!["s1"]);
    }

    #[test]
    fn scoped_subscription_outliving_channel_is_harmless() {
        let channel: EventChannel<(), u32> = EventChannel::new("test");
        let guard = channel.subscribe_scoped(DEFAULT_PRIORITY, |_: &(), _: &u32| {});
        drop(channel);
        drop(guard);
    }
}
