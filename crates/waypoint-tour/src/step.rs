#![forbid(unsafe_code)]

//! A single tour stop.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──show──▶ Shown ◀──show── Hidden
//!                     │               ▲
//!                     └─────hide──────┘
//!   any ──destroy──▶ Destroyed (terminal)
//! ```
//!
//! Every side effect of [`Step::show`] (tooltip, target markers, listeners,
//! overlay opening) is undone by [`Step::hide`]. The rendered content is
//! kept across hide/show cycles and released by [`Step::destroy`].
//!
//! # Failure Modes
//!
//! - Showing a destroyed step returns [`TourError::StepDestroyed`].
//! - Showing a step that was never added to a tour returns
//!   [`TourError::Detached`].
//! - `hide` and `destroy` never fail and are idempotent.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use waypoint_core::{
    Document, ElementId, ElementSpec, Evented, Host, ListenerId, SubscriptionId, TooltipHandle,
    TooltipRequest,
};

use crate::bind;
use crate::constants::{
    BUTTON_CLASS, CANCEL_LINK_CLASS, ELEMENT_CLASS, FOOTER_CLASS, HEADER_CLASS, STEP_ATTRIBUTE,
    TARGET_CLASSES, TEXT_CLASS, TITLE_CLASS,
};
use crate::error::{Result, TourError};
use crate::events::{StepEvent, StepEventKind};
use crate::options::{ScrollTo, StepId, StepOptions, TargetRef};
use crate::tour::{Tour, TourInner};

static NEXT_STEP_ID: AtomicU64 = AtomicU64::new(1);

fn generated_step_id() -> StepId {
    StepId::from(format!("step-{}", NEXT_STEP_ID.fetch_add(1, Ordering::Relaxed)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    Created,
    Shown,
    Hidden,
    Destroyed,
}

/// Where a shown step ended up anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// The target element, or the body when centered.
    pub element: ElementId,
    /// No target was configured or the selector matched nothing.
    pub centered: bool,
}

/// Elements rendered for a step.
#[derive(Debug, Clone)]
pub(crate) struct RenderedContent {
    pub root: ElementId,
    /// One element per configured button, in order.
    pub buttons: Vec<ElementId>,
    pub cancel_link: Option<ElementId>,
}

#[derive(Debug)]
struct StepState {
    phase: StepPhase,
    target: Option<ResolvedTarget>,
    tooltip: Option<TooltipHandle>,
    content: Option<RenderedContent>,
    bindings: Vec<ListenerId>,
}

pub(crate) struct StepInner {
    id: StepId,
    options: StepOptions,
    tour: RefCell<Weak<TourInner>>,
    host: RefCell<Option<Host>>,
    events: Evented<StepEvent>,
    state: RefCell<StepState>,
}

/// Handle to a step. Clones refer to the same step.
#[derive(Clone)]
pub struct Step {
    inner: Rc<StepInner>,
}

/// Non-owning step handle used by listeners and the tour's current pointer.
#[derive(Clone)]
pub(crate) struct WeakStep(Weak<StepInner>);

impl WeakStep {
    pub(crate) fn upgrade(&self) -> Option<Step> {
        self.0.upgrade().map(|inner| Step { inner })
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.inner.id)
            .field("phase", &self.phase())
            .finish()
    }
}

impl Step {
    /// Build a step outside of a tour, for later
    /// [`Tour::adopt_step`](crate::Tour::adopt_step).
    ///
    /// Options are used as given; tour defaults are not applied. A missing
    /// id is generated.
    pub fn new(options: StepOptions) -> Step {
        let id = options.id.clone().unwrap_or_else(generated_step_id);
        Self::with_id(id, options)
    }

    pub(crate) fn with_id(id: StepId, mut options: StepOptions) -> Step {
        options.id = Some(id.clone());
        Step {
            inner: Rc::new(StepInner {
                id,
                options,
                tour: RefCell::new(Weak::new()),
                host: RefCell::new(None),
                events: Evented::new(),
                state: RefCell::new(StepState {
                    phase: StepPhase::Created,
                    target: None,
                    tooltip: None,
                    content: None,
                    bindings: Vec::new(),
                }),
            }),
        }
    }

    /// Point the step at its owning tour.
    pub(crate) fn attach(&self, tour: &Tour) {
        *self.inner.tour.borrow_mut() = tour.downgrade();
        *self.inner.host.borrow_mut() = Some(tour.host().clone());
    }

    /// A fresh, never-shown step with the same id, options and tour.
    pub(crate) fn revive(&self) -> Step {
        let step = Step::with_id(self.inner.id.clone(), self.inner.options.clone());
        *step.inner.tour.borrow_mut() = self.inner.tour.borrow().clone();
        *step.inner.host.borrow_mut() = self.inner.host.borrow().clone();
        step
    }

    pub(crate) fn downgrade(&self) -> WeakStep {
        WeakStep(Rc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &Step) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn id(&self) -> &StepId {
        &self.inner.id
    }

    /// Merged options.
    pub fn options(&self) -> &StepOptions {
        &self.inner.options
    }

    pub fn phase(&self) -> StepPhase {
        self.inner.state.borrow().phase
    }

    pub fn is_open(&self) -> bool {
        self.phase() == StepPhase::Shown
    }

    pub fn is_destroyed(&self) -> bool {
        self.phase() == StepPhase::Destroyed
    }

    /// Target resolved by the most recent show.
    pub fn target(&self) -> Option<ResolvedTarget> {
        self.inner.state.borrow().target
    }

    /// Tooltip handle while shown.
    pub fn tooltip(&self) -> Option<TooltipHandle> {
        self.inner.state.borrow().tooltip
    }

    /// Root of the rendered content, once rendered.
    pub fn content_element(&self) -> Option<ElementId> {
        self.inner
            .state
            .borrow()
            .content
            .as_ref()
            .map(|content| content.root)
    }

    /// The owning tour, if the step was added to one that is still alive.
    pub fn tour(&self) -> Option<Tour> {
        self.inner.tour.borrow().upgrade().map(Tour::from_inner)
    }

    pub(crate) fn document(&self) -> Option<Rc<dyn Document>> {
        self.inner
            .host
            .borrow()
            .as_ref()
            .map(|host| Rc::clone(&host.document))
    }

    fn host(&self) -> Option<Host> {
        self.inner.host.borrow().clone()
    }

    pub fn events(&self) -> &Evented<StepEvent> {
        &self.inner.events
    }

    pub fn on(&self, kind: StepEventKind, handler: impl Fn(&StepEvent) + 'static) -> SubscriptionId {
        self.inner.events.on(kind, handler)
    }

    pub fn once(
        &self,
        kind: StepEventKind,
        handler: impl Fn(&StepEvent) + 'static,
    ) -> SubscriptionId {
        self.inner.events.once(kind, handler)
    }

    fn emit(&self, kind: StepEventKind) {
        self.inner.events.trigger(&StepEvent {
            kind,
            step: self.clone(),
        });
    }

    fn destroyed_error(&self) -> TourError {
        TourError::StepDestroyed {
            id: self.inner.id.clone(),
        }
    }

    fn require_tour(&self) -> Result<Tour> {
        self.tour().ok_or_else(|| TourError::Detached {
            id: self.inner.id.clone(),
        })
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Attach the tooltip, mark the target, open the overlay and bind UI
    /// wiring. Showing an open step is a no-op.
    pub fn show(&self) -> Result<()> {
        match self.phase() {
            StepPhase::Destroyed => return Err(self.destroyed_error()),
            StepPhase::Shown => return Ok(()),
            StepPhase::Created | StepPhase::Hidden => {}
        }
        let host = self.host().ok_or_else(|| TourError::Detached {
            id: self.inner.id.clone(),
        })?;

        self.emit(StepEventKind::BeforeShow);
        // A before-show handler may have shown or destroyed us already.
        match self.phase() {
            StepPhase::Destroyed => return Err(self.destroyed_error()),
            StepPhase::Shown => return Ok(()),
            StepPhase::Created | StepPhase::Hidden => {}
        }

        let document = host.document.as_ref();
        let options = &self.inner.options;
        let target = self.resolve_target(document);
        let content = self.ensure_content(document);

        let handle = host.tooltips.attach(&TooltipRequest {
            step_id: self.inner.id.to_string(),
            target: target.element,
            content: content.root,
            placement: if target.centered {
                None
            } else {
                options.attach_to.as_ref().and_then(|attach| attach.on)
            },
            centered: target.centered,
            props: options.tooltip_props.clone().unwrap_or_default(),
        });

        if !target.centered {
            for class in TARGET_CLASSES {
                document.add_class(target.element, class);
            }
        }
        document.set_attribute(document.body(), STEP_ATTRIBUTE, self.inner.id.as_str());

        let tour = self.tour();
        if let Some(tour) = &tour {
            tour.modal().setup_for_step(
                (!target.centered).then_some(target.element),
                options.modal_overlay_opening_padding.unwrap_or(0),
            );
        }

        if let Some(ScrollTo::Enabled(behavior)) = options.scroll_to
            && !target.centered
        {
            document.scroll_into_view(target.element, behavior);
        }

        let exit_on_esc = tour.as_ref().is_some_and(|tour| tour.options().exit_on_esc);
        let bindings = bind::bind_step(self, document, &content, exit_on_esc);

        {
            let mut state = self.inner.state.borrow_mut();
            state.phase = StepPhase::Shown;
            state.target = Some(target);
            state.tooltip = Some(handle);
            state.bindings = bindings;
        }

        tracing::debug!(
            target: "waypoint.step",
            step_id = %self.inner.id,
            centered = target.centered,
            "step shown"
        );
        self.emit(StepEventKind::Show);
        Ok(())
    }

    /// Undo everything [`Step::show`] did. No-op unless the step is open.
    pub fn hide(&self) {
        if !self.is_open() {
            return;
        }
        self.emit(StepEventKind::BeforeHide);

        let (bindings, tooltip, target) = {
            let mut state = self.inner.state.borrow_mut();
            if state.phase != StepPhase::Shown {
                return;
            }
            state.phase = StepPhase::Hidden;
            (
                std::mem::take(&mut state.bindings),
                state.tooltip.take(),
                state.target,
            )
        };

        if let Some(host) = self.host() {
            let document = host.document.as_ref();
            for id in bindings {
                document.remove_listener(id);
            }
            if let Some(handle) = tooltip {
                host.tooltips.destroy(handle);
            }
            if let Some(target) = target.filter(|target| !target.centered) {
                for class in TARGET_CLASSES {
                    document.remove_class(target.element, class);
                }
            }
            document.remove_attribute(document.body(), STEP_ATTRIBUTE);
        }
        if let Some(tour) = self.tour() {
            tour.modal().close_opening();
        }

        tracing::debug!(target: "waypoint.step", step_id = %self.inner.id, "step hidden");
        self.emit(StepEventKind::Hide);
    }

    /// Hide if open, release rendered content and enter the terminal state.
    /// The `destroy` event fires exactly once.
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        self.hide();

        let content = {
            let mut state = self.inner.state.borrow_mut();
            if state.phase == StepPhase::Destroyed {
                return;
            }
            state.phase = StepPhase::Destroyed;
            state.content.take()
        };
        if let (Some(content), Some(document)) = (content, self.document()) {
            document.remove_element(content.root);
        }

        tracing::debug!(target: "waypoint.step", step_id = %self.inner.id, "step destroyed");
        self.emit(StepEventKind::Destroy);
        self.inner.events.off_all();
    }

    /// Cancel the owning tour.
    pub fn cancel(&self) -> Result<()> {
        self.require_tour()?.cancel();
        Ok(())
    }

    /// Complete the owning tour.
    pub fn complete(&self) -> Result<()> {
        self.require_tour()?.complete();
        Ok(())
    }

    /// Advance the owning tour.
    pub fn next(&self) -> Result<()> {
        self.require_tour()?.next();
        Ok(())
    }

    /// Step the owning tour back.
    pub fn back(&self) -> Result<()> {
        self.require_tour()?.back();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    fn resolve_target(&self, document: &dyn Document) -> ResolvedTarget {
        let element = match self.inner.options.attach_to.as_ref().map(|a| &a.element) {
            Some(TargetRef::Selector(selector)) => {
                let found = document.query_selector(selector);
                if found.is_none() {
                    tracing::debug!(
                        target: "waypoint.step",
                        step_id = %self.inner.id,
                        selector = %selector,
                        "target selector matched nothing; centering"
                    );
                }
                found
            }
            Some(TargetRef::Element(element)) => Some(*element),
            None => None,
        };
        match element {
            Some(element) => ResolvedTarget {
                element,
                centered: false,
            },
            None => ResolvedTarget {
                element: document.body(),
                centered: true,
            },
        }
    }

    fn ensure_content(&self, document: &dyn Document) -> RenderedContent {
        if let Some(content) = self.inner.state.borrow().content.clone() {
            return content;
        }
        let content = self.render_content(document);
        self.inner.state.borrow_mut().content = Some(content.clone());
        content
    }

    fn render_content(&self, document: &dyn Document) -> RenderedContent {
        let options = &self.inner.options;
        let root = document.create_element(
            document.body(),
            &ElementSpec::new("div")
                .class(ELEMENT_CLASS)
                .class(options.classes.as_deref().unwrap_or_default())
                .attr("role", "dialog")
                .attr("data-waypoint-step-id", self.inner.id.as_str()),
        );

        let show_cancel_link = options.show_cancel_link.unwrap_or(false);
        let mut cancel_link = None;
        if options.title.is_some() || show_cancel_link {
            let header = document.create_element(root, &ElementSpec::new("header").class(HEADER_CLASS));
            if let Some(title) = &options.title {
                document.create_element(header, &ElementSpec::new("h3").class(TITLE_CLASS).text(title));
            }
            if show_cancel_link {
                cancel_link = Some(document.create_element(
                    header,
                    &ElementSpec::new("a")
                        .class(CANCEL_LINK_CLASS)
                        .attr("aria-label", "Close Tour")
                        .text("×"),
                ));
            }
        }

        if let Some(text) = &options.text {
            let container = document.create_element(root, &ElementSpec::new("div").class(TEXT_CLASS));
            for paragraph in text.paragraphs() {
                document.create_element(container, &ElementSpec::new("p").text(paragraph));
            }
        }

        let mut buttons = Vec::new();
        if let Some(defs) = options.buttons.as_ref().filter(|defs| !defs.is_empty()) {
            let footer = document.create_element(root, &ElementSpec::new("footer").class(FOOTER_CLASS));
            for button in defs {
                buttons.push(document.create_element(
                    footer,
                    &ElementSpec::new("button")
                        .class(BUTTON_CLASS)
                        .class(button.classes.as_deref().unwrap_or_default())
                        .text(&button.text),
                ));
            }
        }

        RenderedContent {
            root,
            buttons,
            cancel_link,
        }
    }
}
