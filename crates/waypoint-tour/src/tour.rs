#![forbid(unsafe_code)]

//! The tour state machine.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start/show──▶ Active ──cancel──▶ Cancelled ─┐
//!                        │                           ├──start──▶ Active
//!                        └────complete──▶ Completed ─┘
//! ```
//!
//! A tour owns its steps; steps point back at the tour weakly, and the
//! current-step pointer is weak as well. At most one step is open at a
//! time: showing a step always hides the previous one first.
//!
//! # Ended tours
//!
//! Once cancelled or completed, navigation (`next`, `back`, `show`) and the
//! terminal calls (`cancel`, `complete`) are ignored until [`Tour::start`]
//! runs again. Restarting replaces every destroyed step with a fresh step
//! built from the same id and options.
//!
//! # Skipping
//!
//! A step whose `show_on` predicate returns `false` is skipped in the
//! direction of travel. If the chain of skips runs off either end of the
//! step list, no step is current afterwards and the tour stays active; it
//! is not completed automatically.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use waypoint_core::{DomEvent, Evented, Host, ListenerId, ListenerTarget, SubscriptionId};

use crate::constants::{ACTIVE_CLASS, ACTIVE_TOUR_ATTRIBUTE};
use crate::error::{Result, TourError};
use crate::events::{TourEvent, TourEventKind};
use crate::modal::Modal;
use crate::options::{StepId, StepKey, StepOptions, TourOptions};
use crate::registry::Registry;
use crate::step::{Step, WeakStep};

static NEXT_TOUR_ID: AtomicU64 = AtomicU64::new(1);

const ARROW_LEFT: &str = "ArrowLeft";
const ARROW_RIGHT: &str = "ArrowRight";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourState {
    /// Constructed, never started.
    Idle,
    Active,
    Cancelled,
    Completed,
}

impl TourState {
    pub fn is_ended(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

/// Direction of travel, used when skipping steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    fn delta(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

pub(crate) struct TourInner {
    id: String,
    options: TourOptions,
    host: Host,
    registry: Registry,
    events: Evented<TourEvent>,
    modal: Modal,
    steps: RefCell<Vec<Step>>,
    current: RefCell<Option<WeakStep>>,
    state: Cell<TourState>,
    /// Tour-level listeners (keyboard navigation).
    bindings: RefCell<Vec<ListenerId>>,
    scroll_locked: Cell<bool>,
}

/// Handle to a tour. Clones refer to the same tour.
#[derive(Clone)]
pub struct Tour {
    inner: Rc<TourInner>,
}

impl fmt::Debug for Tour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tour")
            .field("id", &self.inner.id)
            .field("state", &self.inner.state.get())
            .field("steps", &self.inner.steps.borrow().len())
            .finish()
    }
}

impl Tour {
    /// Build a tour observed by the thread's global [`Registry`].
    pub fn new(host: Host, options: TourOptions) -> Tour {
        Self::with_registry(host, Registry::global(), options)
    }

    /// Build a tour observed by `registry`.
    ///
    /// Installs the tooltip defaults on the host's tooltip service.
    pub fn with_registry(host: Host, registry: Registry, options: TourOptions) -> Tour {
        let id = format!(
            "{}--{}",
            options.tour_name_or_default(),
            NEXT_TOUR_ID.fetch_add(1, Ordering::Relaxed)
        );
        host.tooltips
            .set_default_props(&options.resolved_tooltip_defaults());
        let modal = Modal::new(
            Rc::clone(&host.document),
            Rc::clone(&host.overlay),
            options.use_modal_overlay,
        );
        tracing::debug!(target: "waypoint.tour", tour_id = %id, "tour created");
        Tour {
            inner: Rc::new(TourInner {
                id,
                options,
                host,
                registry,
                events: Evented::new(),
                modal,
                steps: RefCell::new(Vec::new()),
                current: RefCell::new(None),
                state: Cell::new(TourState::Idle),
                bindings: RefCell::new(Vec::new()),
                scroll_locked: Cell::new(false),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<TourInner>) -> Tour {
        Tour { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<TourInner> {
        Rc::downgrade(&self.inner)
    }

    pub fn ptr_eq(&self, other: &Tour) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// `"{tour_name}--{n}"`, unique for the life of the process.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn options(&self) -> &TourOptions {
        &self.inner.options
    }

    pub fn state(&self) -> TourState {
        self.inner.state.get()
    }

    pub fn host(&self) -> &Host {
        &self.inner.host
    }

    pub fn modal(&self) -> &Modal {
        &self.inner.modal
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn events(&self) -> &Evented<TourEvent> {
        &self.inner.events
    }

    pub fn on(&self, kind: TourEventKind, handler: impl Fn(&TourEvent) + 'static) -> SubscriptionId {
        self.inner.events.on(kind, handler)
    }

    pub fn once(
        &self,
        kind: TourEventKind,
        handler: impl Fn(&TourEvent) + 'static,
    ) -> SubscriptionId {
        self.inner.events.once(kind, handler)
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    /// Create a step from `options` merged over the tour's default step
    /// options and append it.
    pub fn add_step(&self, options: StepOptions) -> Result<Step> {
        if let Some(id) = &options.id {
            self.ensure_unique(id)?;
        }
        let step = Step::new(options.merged_over(&self.inner.options.default_step_options));
        self.ensure_unique(step.id())?;
        step.attach(self);
        self.inner.steps.borrow_mut().push(step.clone());
        tracing::debug!(
            target: "waypoint.tour",
            tour_id = %self.inner.id,
            step_id = %step.id(),
            "step added"
        );
        Ok(step)
    }

    /// [`Tour::add_step`] with an explicit id, which overrides any id in
    /// `options`.
    pub fn add_step_with_id(&self, id: impl Into<StepId>, options: StepOptions) -> Result<Step> {
        self.add_step(options.id(id))
    }

    /// Append an existing step as-is and point it at this tour.
    pub fn adopt_step(&self, step: Step) -> Result<Step> {
        if step.is_destroyed() {
            return Err(TourError::StepDestroyed {
                id: step.id().clone(),
            });
        }
        let duplicate = self
            .inner
            .steps
            .borrow()
            .iter()
            .any(|existing| existing.id() == step.id());
        if duplicate {
            return Err(TourError::DuplicateStepId {
                id: step.id().clone(),
            });
        }
        step.attach(self);
        self.inner.steps.borrow_mut().push(step.clone());
        Ok(step)
    }

    fn ensure_unique(&self, id: &StepId) -> Result<()> {
        if self.get_by_id(id.as_str()).is_some() {
            return Err(TourError::DuplicateStepId { id: id.clone() });
        }
        Ok(())
    }

    /// Steps in navigation order.
    pub fn steps(&self) -> Vec<Step> {
        self.inner.steps.borrow().clone()
    }

    pub fn step_count(&self) -> usize {
        self.inner.steps.borrow().len()
    }

    pub fn get_by_id(&self, id: &str) -> Option<Step> {
        self.inner
            .steps
            .borrow()
            .iter()
            .find(|step| step.id().as_str() == id)
            .cloned()
    }

    pub fn current_step(&self) -> Option<Step> {
        self.inner
            .current
            .borrow()
            .as_ref()
            .and_then(WeakStep::upgrade)
    }

    /// Whether this tour is the active tour of its registry.
    pub fn is_active(&self) -> bool {
        self.inner.registry.is_active(self)
    }

    fn index_of(&self, step: &Step) -> Option<usize> {
        self.inner
            .steps
            .borrow()
            .iter()
            .position(|candidate| candidate.ptr_eq(step))
    }

    /// Position of the current step, `-1` when there is none.
    fn current_index(&self) -> isize {
        self.current_step()
            .and_then(|step| self.index_of(&step))
            .map_or(-1, |index| index as isize)
    }

    fn lookup(&self, key: &StepKey) -> Option<Step> {
        match key {
            StepKey::Index(index) => usize::try_from(*index)
                .ok()
                .and_then(|index| self.inner.steps.borrow().get(index).cloned()),
            StepKey::Id(id) => self.get_by_id(id.as_str()),
        }
    }

    /// Destroy the step with `id` and remove it. Returns whether a step was
    /// removed.
    ///
    /// Removing the current step shows the first remaining step, or ends the
    /// tour as cancelled when none remain. That ending never prompts, even
    /// with `confirm_cancel` set, unlike [`Tour::cancel`]: a declined prompt
    /// would leave an active tour with no steps.
    pub fn remove_step(&self, id: &str) -> bool {
        let current = self.current_step();
        let Some(step) = self.get_by_id(id) else {
            return false;
        };
        step.destroy();
        self.inner
            .steps
            .borrow_mut()
            .retain(|candidate| !candidate.ptr_eq(&step));
        tracing::debug!(
            target: "waypoint.tour",
            tour_id = %self.inner.id,
            step_id = %id,
            "step removed"
        );

        if current.is_some_and(|current| current.ptr_eq(&step)) {
            self.inner.current.borrow_mut().take();
            if self.step_count() > 0 {
                self.show(0usize);
            } else {
                self.done(TourState::Cancelled);
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Activate the tour and show its first step.
    ///
    /// With no steps the tour completes immediately.
    pub fn start(&self) {
        tracing::info!(target: "waypoint.tour", tour_id = %self.inner.id, "tour started");
        self.emit(TourEvent::Start { tour: self.clone() });

        if self.inner.options.disable_scroll {
            self.inner.host.scroll_lock.lock();
            self.inner.scroll_locked.set(true);
        }

        if let Some(step) = self.current_step() {
            step.hide();
        }
        self.inner.current.borrow_mut().take();
        self.revive_destroyed_steps();

        self.setup_active_tour();
        self.next();
    }

    /// Show the step after the current one, or complete the tour from the
    /// last step.
    pub fn next(&self) {
        if self.ignore_when_ended("next") {
            return;
        }
        let index = self.current_index();
        if index == self.step_count() as isize - 1 {
            self.complete();
        } else {
            self.show_with_direction(index + 1, Direction::Forward);
        }
    }

    /// Show the step before the current one.
    pub fn back(&self) {
        if self.ignore_when_ended("back") {
            return;
        }
        self.show_with_direction(self.current_index() - 1, Direction::Backward);
    }

    /// Show the step at `key`, skipping forward past steps whose `show_on`
    /// predicate is false. An unknown key does nothing.
    pub fn show(&self, key: impl Into<StepKey>) {
        self.show_with_direction(key, Direction::Forward);
    }

    pub fn show_with_direction(&self, key: impl Into<StepKey>, direction: Direction) {
        if self.ignore_when_ended("show") {
            return;
        }
        let _span = tracing::debug_span!("tour.show", tour_id = %self.inner.id).entered();
        let mut key = key.into();
        let mut skipped = false;

        loop {
            let Some(step) = self.lookup(&key) else {
                if skipped {
                    // Ran off the end while skipping; the tour stays active.
                    self.inner.current.borrow_mut().take();
                    tracing::debug!(target: "waypoint.tour", ?key, "skip chain ended without a step");
                } else {
                    tracing::debug!(target: "waypoint.tour", ?key, "no step for key");
                }
                return;
            };

            self.update_state_before_show();

            let show = step.options().show_on.as_ref().is_none_or(|predicate| predicate.evaluate());
            if !show {
                let Some(index) = self.index_of(&step) else {
                    return;
                };
                tracing::debug!(target: "waypoint.tour", step_id = %step.id(), "step skipped");
                key = StepKey::Index(index as isize + direction.delta());
                skipped = true;
                continue;
            }

            let previous = self.current_step();
            self.emit(TourEvent::Show {
                tour: self.clone(),
                step: step.clone(),
                previous,
            });
            if self.state().is_ended() {
                return;
            }

            *self.inner.current.borrow_mut() = Some(step.downgrade());
            if let Err(err) = step.show() {
                tracing::warn!(target: "waypoint.tour", step_id = %step.id(), error = %err, "step could not be shown");
            }
            return;
        }
    }

    /// Hide the current step without leaving the tour.
    pub fn hide(&self) {
        if let Some(step) = self.current_step() {
            step.hide();
        }
    }

    /// End the tour as cancelled, asking the user first when
    /// `confirm_cancel` is set. A declined prompt leaves the tour untouched.
    pub fn cancel(&self) {
        if self.ignore_when_ended("cancel") {
            return;
        }
        if self.inner.options.confirm_cancel {
            let message = self.inner.options.cancel_message();
            if !self.inner.host.document.confirm(message) {
                tracing::info!(target: "waypoint.tour", tour_id = %self.inner.id, "cancel declined");
                return;
            }
        }
        self.done(TourState::Cancelled);
    }

    /// End the tour as completed.
    pub fn complete(&self) {
        if self.ignore_when_ended("complete") {
            return;
        }
        self.done(TourState::Completed);
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ignore_when_ended(&self, op: &'static str) -> bool {
        let state = self.state();
        if state.is_ended() {
            tracing::debug!(
                target: "waypoint.tour",
                tour_id = %self.inner.id,
                op,
                ?state,
                "ignored on an ended tour"
            );
            return true;
        }
        false
    }

    fn emit(&self, event: TourEvent) {
        self.inner.registry.rebroadcast(&event);
        self.inner.events.trigger(&event);
    }

    fn revive_destroyed_steps(&self) {
        let mut steps = self.inner.steps.borrow_mut();
        for slot in steps.iter_mut().filter(|step| step.is_destroyed()) {
            *slot = slot.revive();
        }
    }

    fn update_state_before_show(&self) {
        if let Some(step) = self.current_step() {
            step.hide();
        }
        if !self.is_active() {
            self.setup_active_tour();
        }
    }

    fn setup_active_tour(&self) {
        self.inner.state.set(TourState::Active);
        self.inner.modal.create_overlay();

        let document = &self.inner.host.document;
        let body = document.body();
        document.set_attribute(body, ACTIVE_TOUR_ATTRIBUTE, &self.inner.id);
        document.add_class(body, ACTIVE_CLASS);

        self.bind_keyboard();
        self.inner.registry.set_active(self);
        self.emit(TourEvent::Active { tour: self.clone() });
    }

    fn bind_keyboard(&self) {
        if !self.inner.options.keyboard_navigation || !self.inner.bindings.borrow().is_empty() {
            return;
        }
        let weak = self.downgrade();
        let id = self.inner.host.document.add_listener(
            ListenerTarget::Window,
            "keydown",
            Rc::new(move |event: &DomEvent| {
                let Some(tour) = weak.upgrade().map(Tour::from_inner) else {
                    return;
                };
                if tour.state() != TourState::Active || tour.current_step().is_none() {
                    return;
                }
                match event.key.as_deref() {
                    Some(ARROW_RIGHT) => tour.next(),
                    Some(ARROW_LEFT) => tour.back(),
                    _ => {}
                }
            }),
        );
        self.inner.bindings.borrow_mut().push(id);
    }

    fn unbind_keyboard(&self) {
        let bindings = std::mem::take(&mut *self.inner.bindings.borrow_mut());
        for id in bindings {
            self.inner.host.document.remove_listener(id);
        }
    }

    /// Shared teardown of cancel and complete.
    fn done(&self, outcome: TourState) {
        let _span = tracing::info_span!("tour.done", tour_id = %self.inner.id, ?outcome).entered();

        for step in self.steps() {
            step.destroy();
        }
        self.unbind_keyboard();
        self.inner.current.borrow_mut().take();
        self.inner.state.set(outcome);

        if outcome == TourState::Cancelled {
            tracing::info!(target: "waypoint.tour", tour_id = %self.inner.id, "tour cancelled");
            self.emit(TourEvent::Cancel { tour: self.clone() });
        } else {
            tracing::info!(target: "waypoint.tour", tour_id = %self.inner.id, "tour completed");
            self.emit(TourEvent::Complete { tour: self.clone() });
        }

        self.inner.registry.clear_active();
        let document = &self.inner.host.document;
        let body = document.body();
        document.remove_attribute(body, ACTIVE_TOUR_ATTRIBUTE);
        document.remove_class(body, ACTIVE_CLASS);
        self.emit(TourEvent::Inactive { tour: self.clone() });

        if self.inner.scroll_locked.replace(false) {
            self.inner.host.scroll_lock.unlock_all();
        }
        self.inner.modal.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ended_states() {
        assert!(!TourState::Idle.is_ended());
        assert!(!TourState::Active.is_ended());
        assert!(TourState::Cancelled.is_ended());
        assert!(TourState::Completed.is_ended());
    }

    #[test]
    fn direction_deltas() {
        assert_eq!(Direction::Forward.delta(), 1);
        assert_eq!(Direction::Backward.delta(), -1);
        assert_eq!(Direction::default(), Direction::Forward);
    }
}
