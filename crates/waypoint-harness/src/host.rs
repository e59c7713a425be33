#![forbid(unsafe_code)]

use std::rc::Rc;

use waypoint_core::{Document, Host, Rect};

use crate::document::HeadlessDocument;
use crate::services::{RecordingOverlay, RecordingScrollLock, RecordingTooltips};

/// A complete headless page: document plus recording services.
///
/// Keeps concrete handles for inspection while [`HeadlessHost::host`] hands
/// the same services to a tour as trait objects.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    pub document: Rc<HeadlessDocument>,
    pub tooltips: Rc<RecordingTooltips>,
    pub overlay: Rc<RecordingOverlay>,
    pub scroll_lock: Rc<RecordingScrollLock>,
}

impl HeadlessHost {
    pub fn new(viewport: Rect) -> Self {
        Self {
            document: Rc::new(HeadlessDocument::new(viewport)),
            tooltips: Rc::new(RecordingTooltips::new()),
            overlay: Rc::new(RecordingOverlay::new()),
            scroll_lock: Rc::new(RecordingScrollLock::new()),
        }
    }

    pub fn host(&self) -> Host {
        Host {
            document: self.document.clone(),
            tooltips: self.tooltips.clone(),
            overlay: self.overlay.clone(),
            scroll_lock: self.scroll_lock.clone(),
        }
    }

    /// Markers and resources a finished tour must not leave behind.
    ///
    /// Returns one line per leftover; empty when the page is clean.
    pub fn residue(&self) -> Vec<String> {
        let document = &self.document;
        let body = document.body();
        let mut residue = Vec::new();
        if self.overlay.element_count() > 0 {
            residue.push("overlay element".to_owned());
        }
        if self.tooltips.active_count() > 0 {
            residue.push(format!("{} live tooltip(s)", self.tooltips.active_count()));
        }
        if document.listener_count() > 0 {
            residue.push(format!("{} listener(s)", document.listener_count()));
        }
        if self.scroll_lock.is_locked() {
            residue.push("scroll lock".to_owned());
        }
        for class in document.classes(body) {
            if class.starts_with("waypoint-") {
                residue.push(format!("body class {class}"));
            }
        }
        for attribute in ["data-waypoint-active-tour", "data-waypoint-step"] {
            if document.attribute(body, attribute).is_some() {
                residue.push(format!("body attribute {attribute}"));
            }
        }
        residue
    }
}
