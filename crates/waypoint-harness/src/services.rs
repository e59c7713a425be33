#![forbid(unsafe_code)]

//! Recording implementations of the tooltip, overlay and scroll-lock
//! services. Each one keeps enough state to assert on what the tour engine
//! asked for.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use serde_json::Value;
use waypoint_core::{
    OverlayRenderer, Rect, ScrollLock, TooltipHandle, TooltipProps, TooltipRequest,
    TooltipService,
};

// ---------------------------------------------------------------------------
// Tooltips
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TooltipState {
    next: u64,
    defaults: TooltipProps,
    attached: BTreeMap<TooltipHandle, TooltipRequest>,
    history: Vec<TooltipRequest>,
    destroyed: usize,
}

#[derive(Debug, Default)]
pub struct RecordingTooltips {
    state: RefCell<TooltipState>,
}

impl RecordingTooltips {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tooltips attached and not yet destroyed.
    pub fn active_count(&self) -> usize {
        self.state.borrow().attached.len()
    }

    pub fn active(&self) -> Vec<TooltipRequest> {
        self.state.borrow().attached.values().cloned().collect()
    }

    /// The most recently attached tooltip that is still live.
    pub fn current(&self) -> Option<TooltipRequest> {
        self.state
            .borrow()
            .attached
            .last_key_value()
            .map(|(_, request)| request.clone())
    }

    /// Every attach request, in order.
    pub fn history(&self) -> Vec<TooltipRequest> {
        self.state.borrow().history.clone()
    }

    pub fn destroyed_count(&self) -> usize {
        self.state.borrow().destroyed
    }

    pub fn default_props(&self) -> TooltipProps {
        self.state.borrow().defaults.clone()
    }

    pub fn default_prop(&self, key: &str) -> Option<Value> {
        self.state.borrow().defaults.get(key).cloned()
    }
}

impl TooltipService for RecordingTooltips {
    fn set_default_props(&self, props: &TooltipProps) {
        self.state.borrow_mut().defaults = props.clone();
    }

    fn attach(&self, request: &TooltipRequest) -> TooltipHandle {
        let mut state = self.state.borrow_mut();
        state.next += 1;
        let handle = TooltipHandle::new(state.next);
        state.attached.insert(handle, request.clone());
        state.history.push(request.clone());
        tracing::trace!(handle = handle.raw(), step_id = %request.step_id, "tooltip attached");
        handle
    }

    fn destroy(&self, handle: TooltipHandle) {
        let mut state = self.state.borrow_mut();
        if state.attached.remove(&handle).is_some() {
            state.destroyed += 1;
        } else {
            tracing::warn!(handle = handle.raw(), "destroy of an unknown tooltip");
        }
    }
}

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
struct OverlayState {
    exists: bool,
    visible: bool,
    viewport: Rect,
    opening: Option<Rect>,
    opens: usize,
}

/// Tracks a single backdrop element.
#[derive(Debug, Default)]
pub struct RecordingOverlay {
    state: Cell<OverlayState>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backdrop elements in the page: 0 or 1.
    pub fn element_count(&self) -> usize {
        usize::from(self.state.get().exists)
    }

    pub fn is_visible(&self) -> bool {
        self.state.get().visible
    }

    pub fn opening(&self) -> Option<Rect> {
        let state = self.state.get();
        state.opening.filter(|_| state.visible)
    }

    pub fn viewport(&self) -> Rect {
        self.state.get().viewport
    }

    /// Number of `open` calls (draws and redraws).
    pub fn open_count(&self) -> usize {
        self.state.get().opens
    }
}

impl OverlayRenderer for RecordingOverlay {
    fn open(&self, viewport: Rect, opening: Option<Rect>) {
        let state = self.state.get();
        self.state.set(OverlayState {
            exists: true,
            visible: true,
            viewport,
            opening,
            opens: state.opens + 1,
        });
    }

    fn close(&self) {
        let mut state = self.state.get();
        state.visible = false;
        state.opening = None;
        self.state.set(state);
    }

    fn remove(&self) {
        let opens = self.state.get().opens;
        self.state.set(OverlayState {
            opens,
            ..OverlayState::default()
        });
    }
}

// ---------------------------------------------------------------------------
// Scroll lock
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingScrollLock {
    held: Cell<usize>,
    locks: Cell<usize>,
    releases: Cell<usize>,
}

impl RecordingScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.held.get() > 0
    }

    pub fn lock_count(&self) -> usize {
        self.locks.get()
    }

    pub fn release_count(&self) -> usize {
        self.releases.get()
    }
}

impl ScrollLock for RecordingScrollLock {
    fn lock(&self) {
        self.held.set(self.held.get() + 1);
        self.locks.set(self.locks.get() + 1);
    }

    fn unlock_all(&self) {
        self.held.set(0);
        self.releases.set(self.releases.get() + 1);
    }
}
