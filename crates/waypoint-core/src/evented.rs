#![forbid(unsafe_code)]

//! Typed publish/subscribe hub.
//!
//! # Design
//!
//! [`Evented<E>`] keeps one ordered subscriber list in shared,
//! reference-counted storage (`Rc<RefCell<..>>`). Events are a closed enum
//! implementing [`HubEvent`]; each variant carries its own payload and maps
//! to a `Kind` discriminant that subscribers register against.
//!
//! # Invariants
//!
//! 1. Handlers for a kind fire in registration order.
//! 2. A handler removed while a dispatch is in progress is not invoked by
//!    that dispatch if it has not been reached yet.
//! 3. Handlers registered during a dispatch first fire on the next one.
//! 4. Removing something that is not registered is a no-op.
//! 5. A `once` handler is unregistered before it runs, so it fires at most
//!    once even if it re-triggers the same event.
//!
//! # Failure Modes
//!
//! A panicking handler does not abort the dispatch: every handler runs
//! inside its own `catch_unwind`, and the first panic is resumed on the
//! caller of [`Evented::trigger`] after the remaining handlers have run.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::rc::Rc;

/// An event type that can be published through an [`Evented`] hub.
pub trait HubEvent: 'static {
    /// Discriminant subscribers register against.
    type Kind: Copy + Eq + Hash + fmt::Debug + 'static;

    /// The kind of this event value.
    fn kind(&self) -> Self::Kind;
}

/// Token identifying a single registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<E> = Rc<dyn Fn(&E)>;

struct Entry<E: HubEvent> {
    id: SubscriptionId,
    kind: E::Kind,
    handler: Handler<E>,
    once: bool,
}

struct EventedInner<E: HubEvent> {
    entries: Vec<Entry<E>>,
    next_id: u64,
}

/// Publish/subscribe hub over a closed set of events.
///
/// Cloning an `Evented` creates a new handle to the **same** subscriber list.
pub struct Evented<E: HubEvent> {
    inner: Rc<RefCell<EventedInner<E>>>,
}

impl<E: HubEvent> Clone for Evented<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: HubEvent> Default for Evented<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: HubEvent> fmt::Debug for Evented<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Evented")
            .field("subscriber_count", &inner.entries.len())
            .finish()
    }
}

impl<E: HubEvent> Evented<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(EventedInner {
                entries: Vec::new(),
                next_id: 1,
            })),
        }
    }

    /// Register `handler` for `kind`.
    ///
    /// Registering the same closure twice yields two independent
    /// subscriptions that each fire.
    pub fn on(&self, kind: E::Kind, handler: impl Fn(&E) + 'static) -> SubscriptionId {
        self.register(kind, Rc::new(handler), false)
    }

    /// Register `handler` for the next firing of `kind` only.
    pub fn once(&self, kind: E::Kind, handler: impl Fn(&E) + 'static) -> SubscriptionId {
        self.register(kind, Rc::new(handler), true)
    }

    fn register(&self, kind: E::Kind, handler: Handler<E>, once: bool) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.entries.push(Entry {
            id,
            kind,
            handler,
            once,
        });
        id
    }

    /// Remove subscriptions.
    ///
    /// - `off(None, None)` clears everything.
    /// - `off(Some(kind), None)` clears every handler for `kind`.
    /// - `off(Some(kind), Some(id))` removes `id` only if it is registered for `kind`.
    /// - `off(None, Some(id))` removes `id` whatever its kind.
    ///
    /// Returns how many subscriptions were removed.
    pub fn off(&self, kind: Option<E::Kind>, id: Option<SubscriptionId>) -> usize {
        let mut inner = self.inner.borrow_mut();
        let before = inner.entries.len();
        inner.entries.retain(|entry| {
            let kind_matches = kind.is_none_or(|k| entry.kind == k);
            let id_matches = id.is_none_or(|i| entry.id == i);
            !(kind_matches && id_matches)
        });
        before - inner.entries.len()
    }

    /// Remove every subscription.
    pub fn off_all(&self) -> usize {
        self.off(None, None)
    }

    /// Number of handlers currently registered for `kind`.
    #[must_use]
    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.inner
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    /// Synchronously deliver `event` to every handler registered for its kind.
    ///
    /// Returns the number of handlers invoked. If any handler panicked, the
    /// first panic is resumed once all other handlers have run.
    pub fn trigger(&self, event: &E) -> usize {
        let kind = event.kind();

        // Snapshot so handlers may subscribe or unsubscribe re-entrantly.
        let batch: Vec<SubscriptionId> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.id)
            .collect();

        let mut invoked = 0;
        let mut first_panic: Option<Box<dyn std::any::Any + Send>> = None;

        for id in batch {
            let Some(handler) = self.claim(id) else {
                continue;
            };
            invoked += 1;
            let result = catch_unwind(AssertUnwindSafe(|| handler(event)));
            if let Err(payload) = result {
                tracing::error!(
                    target: "waypoint.evented",
                    kind = ?kind,
                    "event handler panicked during dispatch"
                );
                if first_panic.is_none() {
                    first_panic = Some(payload);
                }
            }
        }

        if let Some(payload) = first_panic {
            resume_unwind(payload);
        }
        invoked
    }

    /// Look up a handler that is still registered, unregistering it first
    /// when it is a `once` subscription.
    fn claim(&self, id: SubscriptionId) -> Option<Handler<E>> {
        let mut inner = self.inner.borrow_mut();
        let pos = inner.entries.iter().position(|entry| entry.id == id)?;
        if inner.entries[pos].once {
            Some(inner.entries.remove(pos).handler)
        } else {
            Some(Rc::clone(&inner.entries[pos].handler))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum PingKind {
        Ping,
        Pong,
    }

    #[derive(Debug)]
    enum Ping {
        Ping(u32),
        Pong,
    }

    impl HubEvent for Ping {
        type Kind = PingKind;

        fn kind(&self) -> PingKind {
            match self {
                Ping::Ping(_) => PingKind::Ping,
                Ping::Pong => PingKind::Pong,
            }
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&Ping)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        let make = move |label: &str| -> Box<dyn Fn(&Ping)> {
            let log = Rc::clone(&log_clone);
            let label = label.to_string();
            Box::new(move |_event: &Ping| log.borrow_mut().push(label.clone()))
        };
        (log, make)
    }

    #[test]
    fn handlers_fire_in_registration_order() {
        let hub = Evented::<Ping>::new();
        let (log, make) = recorder();
        let a = make("a");
        let b = make("b");
        let c = make("c");
        hub.on(PingKind::Ping, move |e| a(e));
        hub.on(PingKind::Ping, move |e| b(e));
        hub.on(PingKind::Ping, move |e| c(e));

        assert_eq!(hub.trigger(&Ping::Ping(1)), 3);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn payload_reaches_handler() {
        let hub = Evented::<Ping>::new();
        let seen = Rc::new(Cell::new(0));
        let seen_clone = Rc::clone(&seen);
        hub.on(PingKind::Ping, move |event| {
            if let Ping::Ping(n) = event {
                seen_clone.set(*n);
            }
        });
        hub.trigger(&Ping::Ping(7));
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn kinds_are_isolated() {
        let hub = Evented::<Ping>::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        hub.on(PingKind::Pong, move |_| count_clone.set(count_clone.get() + 1));

        assert_eq!(hub.trigger(&Ping::Ping(0)), 0);
        assert_eq!(hub.trigger(&Ping::Pong), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn duplicate_registrations_fire_independently() {
        let hub = Evented::<Ping>::new();
        let count = Rc::new(Cell::new(0));
        for _ in 0..2 {
            let count = Rc::clone(&count);
            hub.on(PingKind::Ping, move |_| count.set(count.get() + 1));
        }
        hub.trigger(&Ping::Ping(0));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn once_fires_a_single_time() {
        let hub = Evented::<Ping>::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        hub.once(PingKind::Ping, move |_| count_clone.set(count_clone.get() + 1));

        hub.trigger(&Ping::Ping(0));
        hub.trigger(&Ping::Ping(0));
        assert_eq!(count.get(), 1);
        assert_eq!(hub.handler_count(PingKind::Ping), 0);
    }

    #[test]
    fn once_that_retriggers_does_not_recurse() {
        let hub = Evented::<Ping>::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        let hub_clone = hub.clone();
        hub.once(PingKind::Ping, move |_| {
            count_clone.set(count_clone.get() + 1);
            hub_clone.trigger(&Ping::Ping(0));
        });
        hub.trigger(&Ping::Ping(0));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn off_variants() {
        let hub = Evented::<Ping>::new();
        let a = hub.on(PingKind::Ping, |_| {});
        hub.on(PingKind::Ping, |_| {});
        hub.on(PingKind::Pong, |_| {});

        assert_eq!(hub.off(Some(PingKind::Pong), Some(a)), 0);
        assert_eq!(hub.off(Some(PingKind::Ping), Some(a)), 1);
        assert_eq!(hub.off(Some(PingKind::Ping), Some(a)), 0);
        assert_eq!(hub.off(Some(PingKind::Ping), None), 1);
        assert_eq!(hub.handler_count(PingKind::Pong), 1);
        assert_eq!(hub.off_all(), 1);
        assert_eq!(hub.off_all(), 0);
    }

    #[test]
    fn handler_removed_mid_dispatch_is_skipped() {
        let hub = Evented::<Ping>::new();
        let (log, make) = recorder();
        let second_id = Rc::new(Cell::new(None));

        let hub_clone = hub.clone();
        let second_clone = Rc::clone(&second_id);
        let first = make("first");
        hub.on(PingKind::Ping, move |e| {
            first(e);
            if let Some(id) = second_clone.get() {
                hub_clone.off(None, Some(id));
            }
        });
        let second = make("second");
        second_id.set(Some(hub.on(PingKind::Ping, move |e| second(e))));

        assert_eq!(hub.trigger(&Ping::Ping(0)), 1);
        assert_eq!(*log.borrow(), vec!["first"]);
    }

    #[test]
    fn handler_added_mid_dispatch_waits_for_next_trigger() {
        let hub = Evented::<Ping>::new();
        let count = Rc::new(Cell::new(0));
        let hub_clone = hub.clone();
        let count_clone = Rc::clone(&count);
        hub.once(PingKind::Ping, move |_| {
            let count = Rc::clone(&count_clone);
            hub_clone.on(PingKind::Ping, move |_| count.set(count.get() + 1));
        });

        hub.trigger(&Ping::Ping(0));
        assert_eq!(count.get(), 0);
        hub.trigger(&Ping::Ping(0));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn panicking_handler_does_not_starve_siblings() {
        let hub = Evented::<Ping>::new();
        let ran = Rc::new(Cell::new(false));
        let ran_clone = Rc::clone(&ran);
        hub.on(PingKind::Ping, |_| panic!("boom"));
        hub.on(PingKind::Ping, move |_| ran_clone.set(true));

        let result = catch_unwind(AssertUnwindSafe(|| hub.trigger(&Ping::Ping(0))));
        assert!(result.is_err(), "panic should reach the trigger caller");
        assert!(ran.get(), "sibling handler should still run");
    }
}
