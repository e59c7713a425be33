#![forbid(unsafe_code)]

//! Dimmed backdrop with an opening around the current step's target.
//!
//! # Invariants
//!
//! 1. At most one backdrop exists per modal; every redraw reuses it.
//! 2. The opening is the target's bounds grown by the step padding and
//!    clipped to the viewport. Centered steps get no opening.
//! 3. While an opening is tracked, a window `resize` listener recomputes it;
//!    the listener is released whenever the opening is closed.
//! 4. [`Modal::cleanup`] leaves no backdrop, listener, or body class behind.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use waypoint_core::{
    Document, DomEvent, ElementId, ListenerId, ListenerTarget, OverlayRenderer, Rect, Sides,
};

use crate::constants::MODAL_VISIBLE_CLASS;

#[derive(Debug, Default)]
struct ModalState {
    created: bool,
    shown: bool,
    target: Option<ElementId>,
    padding: u16,
    opening: Option<Rect>,
    resize_listener: Option<ListenerId>,
}

struct ModalInner {
    document: Rc<dyn Document>,
    renderer: Rc<dyn OverlayRenderer>,
    enabled: bool,
    state: RefCell<ModalState>,
}

/// Backdrop controller owned by a tour.
pub struct Modal {
    inner: Rc<ModalInner>,
}

impl fmt::Debug for Modal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modal")
            .field("enabled", &self.inner.enabled)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

/// Opening for `target` grown by `padding` and clipped to `viewport`.
pub fn opening_rect(target: Rect, padding: u16, viewport: Rect) -> Option<Rect> {
    target.outer(Sides::all(padding)).intersection(&viewport)
}

impl Modal {
    /// A disabled modal ignores every request except [`Modal::cleanup`].
    pub fn new(
        document: Rc<dyn Document>,
        renderer: Rc<dyn OverlayRenderer>,
        enabled: bool,
    ) -> Self {
        Self {
            inner: Rc::new(ModalInner {
                document,
                renderer,
                enabled,
                state: RefCell::new(ModalState::default()),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    pub fn is_shown(&self) -> bool {
        self.inner.state.borrow().shown
    }

    /// Current opening, `None` when closed or centered.
    pub fn opening(&self) -> Option<Rect> {
        self.inner.state.borrow().opening
    }

    /// Create the backdrop, or redraw the existing one.
    pub fn create_overlay(&self) {
        if !self.inner.enabled {
            return;
        }
        let opening = {
            let mut state = self.inner.state.borrow_mut();
            state.created = true;
            state.opening
        };
        self.inner
            .renderer
            .open(self.inner.document.viewport(), opening);
        self.mark_shown();
    }

    /// Point the opening at `target` (or close it for a centered step) and
    /// show the backdrop.
    pub fn setup_for_step(&self, target: Option<ElementId>, padding: u16) {
        if !self.inner.enabled {
            self.hide();
            return;
        }
        self.unbind_resize();
        {
            let mut state = self.inner.state.borrow_mut();
            state.created = true;
            state.target = target;
            state.padding = padding;
        }
        let opening = self.position_opening();
        if target.is_some() {
            self.bind_resize();
        }
        self.mark_shown();
        tracing::debug!(
            target: "waypoint.modal",
            opening = ?opening,
            padding,
            "modal opening positioned"
        );
    }

    /// Recompute the opening from the tracked target and redraw.
    pub fn position_opening(&self) -> Option<Rect> {
        let (target, padding, created) = {
            let state = self.inner.state.borrow();
            (state.target, state.padding, state.created)
        };
        if !created {
            return None;
        }
        let viewport = self.inner.document.viewport();
        let opening = target
            .and_then(|element| self.inner.document.bounding_rect(element))
            .and_then(|rect| opening_rect(rect, padding, viewport));
        self.inner.state.borrow_mut().opening = opening;
        self.inner.renderer.open(viewport, opening);
        opening
    }

    /// Close the opening but keep the backdrop.
    pub fn close_opening(&self) {
        self.unbind_resize();
        let redraw = {
            let mut state = self.inner.state.borrow_mut();
            state.target = None;
            state.opening = None;
            state.created && state.shown
        };
        if redraw {
            self.inner
                .renderer
                .open(self.inner.document.viewport(), None);
        }
    }

    /// Hide the backdrop without destroying it.
    pub fn hide(&self) {
        self.close_opening();
        let was_shown = {
            let mut state = self.inner.state.borrow_mut();
            std::mem::replace(&mut state.shown, false)
        };
        if was_shown {
            self.inner.renderer.close();
            let document = &self.inner.document;
            document.remove_class(document.body(), MODAL_VISIBLE_CLASS);
        }
    }

    /// Remove the backdrop entirely.
    pub fn cleanup(&self) {
        self.unbind_resize();
        let created = {
            let mut state = self.inner.state.borrow_mut();
            let created = state.created;
            *state = ModalState::default();
            created
        };
        if created {
            self.inner.renderer.remove();
        }
        let document = &self.inner.document;
        document.remove_class(document.body(), MODAL_VISIBLE_CLASS);
    }

    fn mark_shown(&self) {
        let newly_shown = {
            let mut state = self.inner.state.borrow_mut();
            !std::mem::replace(&mut state.shown, true)
        };
        if newly_shown {
            let document = &self.inner.document;
            document.add_class(document.body(), MODAL_VISIBLE_CLASS);
        }
    }

    fn bind_resize(&self) {
        let weak: Weak<ModalInner> = Rc::downgrade(&self.inner);
        let id = self.inner.document.add_listener(
            ListenerTarget::Window,
            "resize",
            Rc::new(move |_event: &DomEvent| {
                if let Some(inner) = weak.upgrade() {
                    Modal { inner }.position_opening();
                }
            }),
        );
        self.inner.state.borrow_mut().resize_listener = Some(id);
    }

    fn unbind_resize(&self) {
        let listener = self.inner.state.borrow_mut().resize_listener.take();
        if let Some(id) = listener {
            self.inner.document.remove_listener(id);
        }
    }
}
