#![forbid(unsafe_code)]

//! Host service contracts.
//!
//! The tour engine never renders anything itself. Everything it touches on
//! the page goes through the traits in this module:
//!
//! - [`Document`]: element lookup, markers, listeners, prompts.
//! - [`TooltipService`]: attaches step content next to a target.
//! - [`OverlayRenderer`]: draws the dimmed backdrop and its opening.
//! - [`ScrollLock`]: freezes page scrolling while a tour runs.
//!
//! All methods take `&self`. Hosts are single-threaded and must tolerate
//! re-entrant calls: a listener invoked by [`Document`] may call straight
//! back into it (typically to remove listeners or elements).

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::geometry::Rect;

/// Opaque handle to a node owned by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Handle returned by [`Document::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Where a listener is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    /// The top-level window; receives key presses and resizes.
    Window,
    /// An element; receives events dispatched on it or bubbling up from a
    /// descendant.
    Element(ElementId),
}

/// A UI event delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    /// Event name, e.g. `"click"` or `"keydown"`.
    pub name: String,
    /// The element the event was originally dispatched on.
    pub target: ElementId,
    /// Key name for keyboard events (`"Escape"`, `"ArrowLeft"`, ...).
    pub key: Option<String>,
}

pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// Description of an element to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSpec {
    pub tag: String,
    pub classes: Vec<String>,
    pub text: Option<String>,
    pub attributes: Vec<(String, String)>,
}

impl ElementSpec {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Add one or more whitespace-separated classes.
    #[must_use]
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// How scrolling a target into view should animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
}

/// Preferred side of the target for a step's tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Placement {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    Auto,
}

impl Placement {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown placement name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePlacementError(pub String);

impl fmt::Display for ParsePlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown placement: {:?}", self.0)
    }
}

impl std::error::Error for ParsePlacementError {}

impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "auto" => Ok(Self::Auto),
            _ => Err(ParsePlacementError(s.to_string())),
        }
    }
}

/// Free-form tooltip configuration, passed to the [`TooltipService`] untouched.
pub type TooltipProps = serde_json::Map<String, serde_json::Value>;

/// Handle to an attached tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TooltipHandle(u64);

impl TooltipHandle {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Everything the tooltip service needs to show one step.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipRequest {
    /// Id of the step being shown.
    pub step_id: String,
    /// Anchor element. The document body when the step is centered.
    pub target: ElementId,
    /// Root of the rendered step content.
    pub content: ElementId,
    /// Preferred side, `None` when centered.
    pub placement: Option<Placement>,
    /// Whether the tooltip should be centered in the viewport.
    pub centered: bool,
    /// Per-step props layered over the service defaults.
    pub props: TooltipProps,
}

/// Page access used by steps, the modal and the tour.
pub trait Document {
    /// The body element; always present.
    fn body(&self) -> ElementId;

    /// Visible area in cells.
    fn viewport(&self) -> Rect;

    /// Create an element as the last child of `parent`.
    fn create_element(&self, parent: ElementId, spec: &ElementSpec) -> ElementId;

    /// Remove an element and its subtree. Unknown ids are ignored.
    fn remove_element(&self, element: ElementId);

    /// First element in document order matching `selector`.
    fn query_selector(&self, selector: &str) -> Option<ElementId>;

    /// Whether `element` matches `selector`.
    fn matches(&self, element: ElementId, selector: &str) -> bool;

    /// On-screen bounds of `element`, `None` if it is not laid out.
    fn bounding_rect(&self, element: ElementId) -> Option<Rect>;

    fn set_attribute(&self, element: ElementId, name: &str, value: &str);

    fn remove_attribute(&self, element: ElementId, name: &str);

    fn add_class(&self, element: ElementId, class: &str);

    fn remove_class(&self, element: ElementId, class: &str);

    /// Bind `listener` for `event` at `target`.
    fn add_listener(&self, target: ListenerTarget, event: &str, listener: Listener) -> ListenerId;

    /// Unbind a listener. Returns `false` if it was not bound.
    fn remove_listener(&self, id: ListenerId) -> bool;

    fn scroll_into_view(&self, element: ElementId, behavior: ScrollBehavior);

    /// Ask the user a yes/no question synchronously.
    fn confirm(&self, message: &str) -> bool;
}

/// Positions step content next to its target.
pub trait TooltipService {
    fn set_default_props(&self, props: &TooltipProps);

    fn attach(&self, request: &TooltipRequest) -> TooltipHandle;

    /// Detach a tooltip. Unknown handles are ignored.
    fn destroy(&self, handle: TooltipHandle);
}

/// Draws the dimmed backdrop behind an active tour.
pub trait OverlayRenderer {
    /// Create the backdrop if needed and draw it over `viewport`, leaving
    /// `opening` (if any) undimmed.
    fn open(&self, viewport: Rect, opening: Option<Rect>);

    /// Hide the backdrop but keep it around for reuse.
    fn close(&self);

    /// Destroy the backdrop.
    fn remove(&self);
}

/// Page scroll freezing.
pub trait ScrollLock {
    fn lock(&self);

    /// Release every lock taken through [`ScrollLock::lock`].
    fn unlock_all(&self);
}

/// The bundle of services a tour runs against.
#[derive(Clone)]
pub struct Host {
    pub document: Rc<dyn Document>,
    pub tooltips: Rc<dyn TooltipService>,
    pub overlay: Rc<dyn OverlayRenderer>,
    pub scroll_lock: Rc<dyn ScrollLock>,
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_parses_case_insensitively() {
        assert_eq!("Bottom".parse::<Placement>(), Ok(Placement::Bottom));
        assert_eq!(" top ".parse::<Placement>(), Ok(Placement::Top));
        assert!("middle".parse::<Placement>().is_err());
    }

    #[test]
    fn element_spec_splits_classes() {
        let spec = ElementSpec::new("div")
            .class("a  b")
            .class("c")
            .text("hi")
            .attr("role", "dialog");
        assert_eq!(spec.classes, vec!["a", "b", "c"]);
        assert_eq!(spec.text.as_deref(), Some("hi"));
        assert_eq!(spec.attributes, vec![("role".into(), "dialog".into())]);
    }
}
