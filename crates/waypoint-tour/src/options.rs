#![forbid(unsafe_code)]

//! Typed step and tour configuration.
//!
//! Every [`StepOptions`] field is optional. A tour's
//! `default_step_options` are combined with a step's own options by
//! [`StepOptions::merged_over`]: a field set on the step wins, an unset field
//! falls back to the default. The merge is shallow; `buttons` replaces the
//! default list rather than extending it.

use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

use serde_json::json;
use waypoint_core::{ElementId, Placement, ScrollBehavior, TooltipProps};

use crate::constants::{DEFAULT_CONFIRM_CANCEL_MESSAGE, DEFAULT_TOUR_NAME};
use crate::tour::Tour;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifier of a step, unique within its tour.
///
/// Numeric ids are stored in their decimal form, so `StepId::from(2usize)`
/// and `StepId::from("2")` are the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(String);

impl StepId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for StepId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StepId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StepId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&StepId> for StepId {
    fn from(id: &StepId) -> Self {
        id.clone()
    }
}

macro_rules! step_id_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for StepId {
            fn from(id: $ty) -> Self {
                Self(id.to_string())
            }
        })*
    };
}

step_id_from_int!(u32, u64, usize, i32, i64);

/// How [`Tour::show`](crate::Tour::show) finds a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKey {
    /// Position in the tour. Out-of-range positions (including negative
    /// ones) find nothing.
    Index(isize),
    /// Step id.
    Id(StepId),
}

impl From<usize> for StepKey {
    fn from(index: usize) -> Self {
        Self::Index(isize::try_from(index).unwrap_or(isize::MAX))
    }
}

impl From<isize> for StepKey {
    fn from(index: isize) -> Self {
        Self::Index(index)
    }
}

impl From<i32> for StepKey {
    fn from(index: i32) -> Self {
        Self::Index(index as isize)
    }
}

impl From<&str> for StepKey {
    fn from(id: &str) -> Self {
        Self::Id(StepId::from(id))
    }
}

impl From<String> for StepKey {
    fn from(id: String) -> Self {
        Self::Id(StepId::from(id))
    }
}

impl From<StepId> for StepKey {
    fn from(id: StepId) -> Self {
        Self::Id(id)
    }
}

impl From<&StepId> for StepKey {
    fn from(id: &StepId) -> Self {
        Self::Id(id.clone())
    }
}

// ---------------------------------------------------------------------------
// Step option values
// ---------------------------------------------------------------------------

/// What a step points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    /// Resolved with [`Document::query_selector`](waypoint_core::Document::query_selector)
    /// each time the step is shown.
    Selector(String),
    /// A fixed element.
    Element(ElementId),
}

/// Anchor for a step's tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachTo {
    pub element: TargetRef,
    /// Preferred side; the tooltip service decides when `None`.
    pub on: Option<Placement>,
}

impl AttachTo {
    pub fn selector(selector: impl Into<String>, on: Placement) -> Self {
        Self {
            element: TargetRef::Selector(selector.into()),
            on: Some(on),
        }
    }

    pub fn element(element: ElementId, on: Placement) -> Self {
        Self {
            element: TargetRef::Element(element),
            on: Some(on),
        }
    }
}

/// A UI event that advances the tour while the step is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceOn {
    /// Only events whose target matches this selector count. `None` accepts
    /// the event from anywhere on the page.
    pub selector: Option<String>,
    pub event: String,
}

impl AdvanceOn {
    pub fn new(selector: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
            event: event.into(),
        }
    }

    pub fn anywhere(event: impl Into<String>) -> Self {
        Self {
            selector: None,
            event: event.into(),
        }
    }
}

/// What a button (or one of its extra events) does.
#[derive(Clone)]
pub enum ButtonAction {
    Next,
    Back,
    Cancel,
    Complete,
    Show(StepKey),
    Custom(Rc<dyn Fn(&Tour)>),
}

impl ButtonAction {
    pub fn custom(action: impl Fn(&Tour) + 'static) -> Self {
        Self::Custom(Rc::new(action))
    }

    /// Perform the action on `tour`.
    pub fn run(&self, tour: &Tour) {
        match self {
            Self::Next => tour.next(),
            Self::Back => tour.back(),
            Self::Cancel => tour.cancel(),
            Self::Complete => tour.complete(),
            Self::Show(key) => tour.show(key.clone()),
            Self::Custom(action) => action(tour),
        }
    }
}

impl fmt::Debug for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => f.write_str("Next"),
            Self::Back => f.write_str("Back"),
            Self::Cancel => f.write_str("Cancel"),
            Self::Complete => f.write_str("Complete"),
            Self::Show(key) => f.debug_tuple("Show").field(key).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A button rendered in a step's footer.
#[derive(Debug, Clone)]
pub struct Button {
    pub text: String,
    pub action: ButtonAction,
    pub classes: Option<String>,
    /// Extra `(event name, action)` bindings on the button element.
    pub events: Vec<(String, ButtonAction)>,
}

impl Button {
    pub fn new(text: impl Into<String>, action: ButtonAction) -> Self {
        Self {
            text: text.into(),
            action,
            classes: None,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn classes(mut self, classes: impl Into<String>) -> Self {
        self.classes = Some(classes.into());
        self
    }

    #[must_use]
    pub fn on(mut self, event: impl Into<String>, action: ButtonAction) -> Self {
        self.events.push((event.into(), action));
        self
    }
}

/// Body text of a step.
#[derive(Clone)]
pub enum StepText {
    Plain(String),
    Paragraphs(Vec<String>),
    /// Evaluated when the step content is rendered.
    Dynamic(Rc<dyn Fn() -> String>),
}

impl StepText {
    pub fn dynamic(text: impl Fn() -> String + 'static) -> Self {
        Self::Dynamic(Rc::new(text))
    }

    /// Paragraphs to render.
    pub fn paragraphs(&self) -> Vec<String> {
        match self {
            Self::Plain(text) => vec![text.clone()],
            Self::Paragraphs(paragraphs) => paragraphs.clone(),
            Self::Dynamic(text) => vec![text()],
        }
    }
}

impl fmt::Debug for StepText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(text) => f.debug_tuple("Plain").field(text).finish(),
            Self::Paragraphs(p) => f.debug_tuple("Paragraphs").field(p).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for StepText {
    fn from(text: &str) -> Self {
        Self::Plain(text.to_string())
    }
}

impl From<String> for StepText {
    fn from(text: String) -> Self {
        Self::Plain(text)
    }
}

impl From<Vec<String>> for StepText {
    fn from(paragraphs: Vec<String>) -> Self {
        Self::Paragraphs(paragraphs)
    }
}

/// Visibility predicate; a step whose predicate returns `false` is skipped.
#[derive(Clone)]
pub struct ShowOn(Rc<dyn Fn() -> bool>);

impl ShowOn {
    pub fn new(predicate: impl Fn() -> bool + 'static) -> Self {
        Self(Rc::new(predicate))
    }

    pub fn evaluate(&self) -> bool {
        (self.0)()
    }
}

impl fmt::Debug for ShowOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShowOn(..)")
    }
}

/// Whether to scroll the target into view when the step is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTo {
    Disabled,
    Enabled(ScrollBehavior),
}

// ---------------------------------------------------------------------------
// StepOptions
// ---------------------------------------------------------------------------

/// Configuration of a single step.
#[derive(Debug, Clone, Default)]
pub struct StepOptions {
    /// Explicit id. Never inherited from the tour defaults.
    pub id: Option<StepId>,
    pub title: Option<String>,
    pub text: Option<StepText>,
    /// `None` centers the step in the viewport.
    pub attach_to: Option<AttachTo>,
    pub advance_on: Option<AdvanceOn>,
    pub buttons: Option<Vec<Button>>,
    /// Extra whitespace-separated classes on the step element.
    pub classes: Option<String>,
    pub show_on: Option<ShowOn>,
    /// Inset around the target when cutting the overlay opening.
    pub modal_overlay_opening_padding: Option<u16>,
    pub scroll_to: Option<ScrollTo>,
    pub show_cancel_link: Option<bool>,
    /// Tooltip props layered over the tour's tooltip defaults.
    pub tooltip_props: Option<TooltipProps>,
}

impl StepOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<StepId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<StepText>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn attach_to(mut self, attach_to: AttachTo) -> Self {
        self.attach_to = Some(attach_to);
        self
    }

    #[must_use]
    pub fn advance_on(mut self, advance_on: AdvanceOn) -> Self {
        self.advance_on = Some(advance_on);
        self
    }

    #[must_use]
    pub fn buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = Some(buttons);
        self
    }

    #[must_use]
    pub fn classes(mut self, classes: impl Into<String>) -> Self {
        self.classes = Some(classes.into());
        self
    }

    #[must_use]
    pub fn show_on(mut self, predicate: impl Fn() -> bool + 'static) -> Self {
        self.show_on = Some(ShowOn::new(predicate));
        self
    }

    #[must_use]
    pub fn modal_overlay_opening_padding(mut self, padding: u16) -> Self {
        self.modal_overlay_opening_padding = Some(padding);
        self
    }

    #[must_use]
    pub fn scroll_to(mut self, scroll_to: ScrollTo) -> Self {
        self.scroll_to = Some(scroll_to);
        self
    }

    #[must_use]
    pub fn show_cancel_link(mut self, show: bool) -> Self {
        self.show_cancel_link = Some(show);
        self
    }

    #[must_use]
    pub fn tooltip_props(mut self, props: TooltipProps) -> Self {
        self.tooltip_props = Some(props);
        self
    }

    /// Shallow merge: fields set on `self` win, unset fields come from
    /// `defaults`. The id is never taken from `defaults`.
    #[must_use]
    pub fn merged_over(self, defaults: &StepOptions) -> StepOptions {
        StepOptions {
            id: self.id,
            title: self.title.or_else(|| defaults.title.clone()),
            text: self.text.or_else(|| defaults.text.clone()),
            attach_to: self.attach_to.or_else(|| defaults.attach_to.clone()),
            advance_on: self.advance_on.or_else(|| defaults.advance_on.clone()),
            buttons: self.buttons.or_else(|| defaults.buttons.clone()),
            classes: self.classes.or_else(|| defaults.classes.clone()),
            show_on: self.show_on.or_else(|| defaults.show_on.clone()),
            modal_overlay_opening_padding: self
                .modal_overlay_opening_padding
                .or(defaults.modal_overlay_opening_padding),
            scroll_to: self.scroll_to.or(defaults.scroll_to),
            show_cancel_link: self.show_cancel_link.or(defaults.show_cancel_link),
            tooltip_props: self
                .tooltip_props
                .or_else(|| defaults.tooltip_props.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// TourOptions
// ---------------------------------------------------------------------------

/// Configuration captured when a tour is constructed.
#[derive(Debug, Clone)]
pub struct TourOptions {
    /// Prefix of the tour id; `"tour"` when unset.
    pub tour_name: Option<String>,
    /// Defaults for steps created through the tour.
    pub default_step_options: StepOptions,
    /// Dim the page behind each step, leaving an opening around the target.
    pub use_modal_overlay: bool,
    /// Lock page scrolling while the tour runs.
    pub disable_scroll: bool,
    /// Ask before cancelling.
    pub confirm_cancel: bool,
    pub confirm_cancel_message: Option<String>,
    /// Escape cancels the tour while a step is shown.
    pub exit_on_esc: bool,
    /// Arrow keys navigate while the tour is active.
    pub keyboard_navigation: bool,
    /// Props layered over [`default_tooltip_props`] and handed to the
    /// tooltip service as its defaults.
    pub tooltip_defaults: TooltipProps,
}

impl Default for TourOptions {
    fn default() -> Self {
        Self {
            tour_name: None,
            default_step_options: StepOptions::default(),
            use_modal_overlay: false,
            disable_scroll: false,
            confirm_cancel: false,
            confirm_cancel_message: None,
            exit_on_esc: true,
            keyboard_navigation: true,
            tooltip_defaults: TooltipProps::new(),
        }
    }
}

impl TourOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tour_name(mut self, name: impl Into<String>) -> Self {
        self.tour_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn default_step_options(mut self, defaults: StepOptions) -> Self {
        self.default_step_options = defaults;
        self
    }

    #[must_use]
    pub fn use_modal_overlay(mut self, enabled: bool) -> Self {
        self.use_modal_overlay = enabled;
        self
    }

    #[must_use]
    pub fn disable_scroll(mut self, disabled: bool) -> Self {
        self.disable_scroll = disabled;
        self
    }

    #[must_use]
    pub fn confirm_cancel(mut self, confirm: bool) -> Self {
        self.confirm_cancel = confirm;
        self
    }

    #[must_use]
    pub fn confirm_cancel_message(mut self, message: impl Into<String>) -> Self {
        self.confirm_cancel_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn exit_on_esc(mut self, enabled: bool) -> Self {
        self.exit_on_esc = enabled;
        self
    }

    #[must_use]
    pub fn keyboard_navigation(mut self, enabled: bool) -> Self {
        self.keyboard_navigation = enabled;
        self
    }

    #[must_use]
    pub fn tooltip_defaults(mut self, props: TooltipProps) -> Self {
        self.tooltip_defaults = props;
        self
    }

    pub fn tour_name_or_default(&self) -> &str {
        self.tour_name.as_deref().unwrap_or(DEFAULT_TOUR_NAME)
    }

    pub fn cancel_message(&self) -> &str {
        self.confirm_cancel_message
            .as_deref()
            .unwrap_or(DEFAULT_CONFIRM_CANCEL_MESSAGE)
    }

    /// Built-in tooltip defaults overlaid with [`Self::tooltip_defaults`].
    pub fn resolved_tooltip_defaults(&self) -> TooltipProps {
        let mut props = default_tooltip_props();
        for (key, value) in &self.tooltip_defaults {
            props.insert(key.clone(), value.clone());
        }
        props
    }
}

/// Tooltip defaults installed when a tour is constructed.
pub fn default_tooltip_props() -> TooltipProps {
    let value = json!({
        "trigger": "manual",
        "arrow": true,
        "animation": "fade",
        "duration": 420,
        "flip": true,
        "animateFill": false,
        "interactive": true,
        "hideOnClick": "toggle",
        "multiple": true,
    });
    match value {
        serde_json::Value::Object(map) => map,
        _ => TooltipProps::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_keys_from_ids_and_positions() {
        assert_eq!(StepKey::from(2usize), StepKey::Index(2));
        assert_eq!(StepKey::from(-1isize), StepKey::Index(-1));
        assert_eq!(StepKey::from("welcome"), StepKey::Id(StepId::from("welcome")));
        assert_eq!(StepId::from(7u32), StepId::from("7"));
    }

    #[test]
    fn step_keys_win_over_defaults() {
        let defaults = StepOptions::new()
            .title("Default")
            .classes("a b")
            .show_cancel_link(true)
            .modal_overlay_opening_padding(4);
        let merged = StepOptions::new()
            .id("s1")
            .title("Own")
            .show_cancel_link(false)
            .merged_over(&defaults);

        assert_eq!(merged.id, Some(StepId::from("s1")));
        assert_eq!(merged.title.as_deref(), Some("Own"));
        assert_eq!(merged.classes.as_deref(), Some("a b"));
        assert_eq!(merged.show_cancel_link, Some(false));
        assert_eq!(merged.modal_overlay_opening_padding, Some(4));
    }

    #[test]
    fn merge_never_inherits_id() {
        let defaults = StepOptions::new().id("shared");
        assert_eq!(StepOptions::new().merged_over(&defaults).id, None);
    }

    #[test]
    fn buttons_are_replaced_not_extended() {
        let defaults = StepOptions::new().buttons(vec![
            Button::new("Back", ButtonAction::Back),
            Button::new("Next", ButtonAction::Next),
        ]);
        let merged = StepOptions::new()
            .buttons(vec![Button::new("Done", ButtonAction::Complete)])
            .merged_over(&defaults);
        let buttons = merged.buttons.unwrap_or_default();
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].text, "Done");
    }

    #[test]
    fn dynamic_text_is_evaluated_on_demand() {
        let text = StepText::dynamic(|| "fresh".to_string());
        assert_eq!(text.paragraphs(), vec!["fresh"]);
        assert_eq!(
            StepText::from(vec!["a".to_string(), "b".to_string()]).paragraphs(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn tooltip_defaults_are_overlaid() {
        let mut overrides = TooltipProps::new();
        overrides.insert("duration".into(), json!(0));
        overrides.insert("maxWidth".into(), json!(500));
        let props = TourOptions::new()
            .tooltip_defaults(overrides)
            .resolved_tooltip_defaults();

        assert_eq!(props.get("duration"), Some(&json!(0)));
        assert_eq!(props.get("maxWidth"), Some(&json!(500)));
        assert_eq!(props.get("trigger"), Some(&json!("manual")));
    }

    #[test]
    fn tour_defaults() {
        let options = TourOptions::default();
        assert_eq!(options.tour_name_or_default(), "tour");
        assert_eq!(options.cancel_message(), DEFAULT_CONFIRM_CANCEL_MESSAGE);
        assert!(options.exit_on_esc);
        assert!(options.keyboard_navigation);
        assert!(!options.use_modal_overlay);
    }
}
