#![forbid(unsafe_code)]

//! Process-wide observation point for tours.
//!
//! A [`Registry`] rebroadcasts the lifecycle events of every tour built
//! against it and remembers which tour, if any, is active. Tours built with
//! [`Tour::new`](crate::Tour::new) share the per-thread [`Registry::global`]
//! instance, created on first access. Tests and embedders that want isolation
//! build their own with [`Registry::new`] and pass it to
//! [`Tour::with_registry`](crate::Tour::with_registry).
//!
//! Only one tour is meant to be active at a time. Activating a second tour
//! while the first is still running simply overwrites the pointer; ending a
//! tour clears it unconditionally. Overlapping tours are unsupported.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use waypoint_core::{Evented, SubscriptionId};

use crate::events::{TourEvent, TourEventKind};
use crate::tour::{Tour, TourInner};

struct RegistryInner {
    events: Evented<TourEvent>,
    active: RefCell<Option<Weak<TourInner>>>,
}

/// Shared handle; clones observe the same state.
#[derive(Clone)]
pub struct Registry {
    inner: Rc<RegistryInner>,
}

thread_local! {
    static GLOBAL: Registry = Registry::new();
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("active_tour", &self.active_tour().map(|t| t.id().to_string()))
            .finish()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                events: Evented::new(),
                active: RefCell::new(None),
            }),
        }
    }

    /// The shared registry of the current thread.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL.with(Registry::clone)
    }

    /// Hub carrying every rebroadcast tour event.
    pub fn events(&self) -> &Evented<TourEvent> {
        &self.inner.events
    }

    pub fn on(&self, kind: TourEventKind, handler: impl Fn(&TourEvent) + 'static) -> SubscriptionId {
        self.inner.events.on(kind, handler)
    }

    /// The currently active tour, if it is still alive.
    pub fn active_tour(&self) -> Option<Tour> {
        self.inner
            .active
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Tour::from_inner)
    }

    pub fn is_active(&self, tour: &Tour) -> bool {
        self.inner
            .active
            .borrow()
            .as_ref()
            .is_some_and(|weak| weak.ptr_eq(&tour.downgrade()))
    }

    pub(crate) fn set_active(&self, tour: &Tour) {
        *self.inner.active.borrow_mut() = Some(tour.downgrade());
    }

    pub(crate) fn clear_active(&self) {
        self.inner.active.borrow_mut().take();
    }

    pub(crate) fn rebroadcast(&self, event: &TourEvent) {
        self.inner.events.trigger(event);
    }
}
