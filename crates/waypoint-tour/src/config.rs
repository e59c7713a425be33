#![forbid(unsafe_code)]

//! Tours as data.
//!
//! A [`TourConfig`] describes a tour's options and its steps, with buttons
//! bound to built-in actions by name. It can be loaded from TOML or JSON and
//! turned into a live [`Tour`] with [`TourConfig::build`].
//!
//! ```toml
//! tour_name = "welcome"
//! use_modal_overlay = true
//!
//! [default_step_options]
//! show_cancel_link = true
//! scroll_to = "smooth"
//!
//! [[steps]]
//! id = "intro"
//! title = "Welcome"
//! text = ["First paragraph.", "Second paragraph."]
//! attach_to = { element = ".hero", on = "bottom" }
//! buttons = [
//!     { text = "Exit", action = "cancel", classes = "secondary" },
//!     { text = "Next", action = "next" },
//! ]
//! ```
//!
//! Closures (`show_on`, custom button actions, dynamic text) have no data
//! form; add them to the built tour's steps in code.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use waypoint_core::{Host, Placement, ScrollBehavior, TooltipProps};

use crate::error::ConfigError;
use crate::options::{
    AdvanceOn, AttachTo, Button, ButtonAction, ScrollTo, StepId, StepKey, StepOptions,
    StepText, TargetRef, TourOptions,
};
use crate::registry::Registry;
use crate::tour::Tour;

// ---------------------------------------------------------------------------
// TourConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TourConfig {
    pub tour_name: Option<String>,
    pub use_modal_overlay: bool,
    pub disable_scroll: bool,
    pub confirm_cancel: bool,
    pub confirm_cancel_message: Option<String>,
    pub exit_on_esc: bool,
    pub keyboard_navigation: bool,
    pub tooltip_defaults: TooltipProps,
    pub default_step_options: StepConfig,
    pub steps: Vec<StepConfig>,
}

impl Default for TourConfig {
    fn default() -> Self {
        let options = TourOptions::default();
        Self {
            tour_name: None,
            use_modal_overlay: options.use_modal_overlay,
            disable_scroll: options.disable_scroll,
            confirm_cancel: options.confirm_cancel,
            confirm_cancel_message: None,
            exit_on_esc: options.exit_on_esc,
            keyboard_navigation: options.keyboard_navigation,
            tooltip_defaults: TooltipProps::new(),
            default_step_options: StepConfig::default(),
            steps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepConfig {
    pub id: Option<String>,
    pub title: Option<String>,
    pub text: Option<TextConfig>,
    pub attach_to: Option<AttachToConfig>,
    pub advance_on: Option<AdvanceOnConfig>,
    pub buttons: Option<Vec<ButtonConfig>>,
    pub classes: Option<String>,
    pub modal_overlay_opening_padding: Option<u16>,
    pub scroll_to: Option<ScrollToConfig>,
    pub show_cancel_link: Option<bool>,
    pub tooltip_props: Option<TooltipProps>,
}

/// A single string or a list of paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextConfig {
    Plain(String),
    Paragraphs(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachToConfig {
    /// CSS-style selector.
    pub element: String,
    #[serde(default)]
    pub on: Option<Placement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdvanceOnConfig {
    #[serde(default)]
    pub selector: Option<String>,
    pub event: String,
}

/// `true`/`false`, or a scroll behavior (`"auto"`, `"smooth"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrollToConfig {
    Flag(bool),
    Behavior(ScrollBehavior),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ButtonConfig {
    pub text: String,
    pub action: ButtonActionConfig,
    #[serde(default)]
    pub classes: Option<String>,
    /// Extra DOM events on the button, mapped to actions.
    #[serde(default)]
    pub events: BTreeMap<String, ButtonActionConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonActionConfig {
    Next,
    Back,
    Cancel,
    Complete,
    /// Show the step with this id.
    Show(String),
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl TourConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Collect every problem with the definition. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.default_step_options.id.is_some() {
            errors.push("default_step_options.id is never inherited; remove it".to_owned());
        }
        self.default_step_options
            .validate_fields("default_step_options", &mut errors);

        let mut ids = HashSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            if let Some(id) = &step.id {
                if id.trim().is_empty() {
                    errors.push(format!("steps[{index}].id must not be empty"));
                } else if !ids.insert(id.as_str()) {
                    errors.push(format!("steps[{index}].id {id:?} is used more than once"));
                }
            }
            step.validate_fields(&format!("steps[{index}]"), &mut errors);
        }

        let all_steps = std::iter::once(("default_step_options".to_owned(), &self.default_step_options))
            .chain(
                self.steps
                    .iter()
                    .enumerate()
                    .map(|(index, step)| (format!("steps[{index}]"), step)),
            );
        for (path, step) in all_steps {
            for target in step.show_targets() {
                if !ids.contains(target) {
                    errors.push(format!("{path}: button shows unknown step {target:?}"));
                }
            }
        }

        errors
    }

    pub fn to_options(&self) -> TourOptions {
        TourOptions {
            tour_name: self.tour_name.clone(),
            default_step_options: self.default_step_options.to_options(),
            use_modal_overlay: self.use_modal_overlay,
            disable_scroll: self.disable_scroll,
            confirm_cancel: self.confirm_cancel,
            confirm_cancel_message: self.confirm_cancel_message.clone(),
            exit_on_esc: self.exit_on_esc,
            keyboard_navigation: self.keyboard_navigation,
            tooltip_defaults: self.tooltip_defaults.clone(),
        }
    }

    /// Validate, then build the tour and add every step in order.
    pub fn build(&self, host: Host, registry: Registry) -> Result<Tour, ConfigError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        let tour = Tour::with_registry(host, registry, self.to_options());
        for step in &self.steps {
            tour.add_step(step.to_options())?;
        }
        tracing::debug!(
            target: "waypoint.tour",
            tour_id = %tour.id(),
            steps = self.steps.len(),
            "tour built from config"
        );
        Ok(tour)
    }
}

impl StepConfig {
    fn validate_fields(&self, path: &str, errors: &mut Vec<String>) {
        if let Some(attach) = &self.attach_to
            && attach.element.trim().is_empty()
        {
            errors.push(format!("{path}.attach_to.element must not be empty"));
        }
        if let Some(advance) = &self.advance_on {
            if advance.event.trim().is_empty() {
                errors.push(format!("{path}.advance_on.event must not be empty"));
            }
            if advance.selector.as_deref().is_some_and(|s| s.trim().is_empty()) {
                errors.push(format!("{path}.advance_on.selector must not be empty"));
            }
        }
        for (index, button) in self.buttons.iter().flatten().enumerate() {
            if button.text.trim().is_empty() {
                errors.push(format!("{path}.buttons[{index}].text must not be empty"));
            }
        }
    }

    /// Step ids referenced by `show` button actions.
    fn show_targets(&self) -> impl Iterator<Item = &str> {
        self.buttons
            .iter()
            .flatten()
            .flat_map(|button| std::iter::once(&button.action).chain(button.events.values()))
            .filter_map(|action| match action {
                ButtonActionConfig::Show(id) => Some(id.as_str()),
                _ => None,
            })
    }

    pub fn to_options(&self) -> StepOptions {
        StepOptions {
            id: self.id.as_deref().map(StepId::from),
            title: self.title.clone(),
            text: self.text.as_ref().map(|text| match text {
                TextConfig::Plain(text) => StepText::Plain(text.clone()),
                TextConfig::Paragraphs(paragraphs) => StepText::Paragraphs(paragraphs.clone()),
            }),
            attach_to: self.attach_to.as_ref().map(|attach| AttachTo {
                element: TargetRef::Selector(attach.element.clone()),
                on: attach.on,
            }),
            advance_on: self.advance_on.as_ref().map(|advance| AdvanceOn {
                selector: advance.selector.clone(),
                event: advance.event.clone(),
            }),
            buttons: self
                .buttons
                .as_ref()
                .map(|buttons| buttons.iter().map(ButtonConfig::to_button).collect()),
            classes: self.classes.clone(),
            show_on: None,
            modal_overlay_opening_padding: self.modal_overlay_opening_padding,
            scroll_to: self.scroll_to.map(|scroll| match scroll {
                ScrollToConfig::Flag(false) => ScrollTo::Disabled,
                ScrollToConfig::Flag(true) => ScrollTo::Enabled(ScrollBehavior::default()),
                ScrollToConfig::Behavior(behavior) => ScrollTo::Enabled(behavior),
            }),
            show_cancel_link: self.show_cancel_link,
            tooltip_props: self.tooltip_props.clone(),
        }
    }
}

impl ButtonConfig {
    fn to_button(&self) -> Button {
        let mut button = Button::new(self.text.clone(), self.action.to_action());
        button.classes = self.classes.clone();
        button.events = self
            .events
            .iter()
            .map(|(event, action)| (event.clone(), action.to_action()))
            .collect();
        button
    }
}

impl ButtonActionConfig {
    pub fn to_action(&self) -> ButtonAction {
        match self {
            Self::Next => ButtonAction::Next,
            Self::Back => ButtonAction::Back,
            Self::Cancel => ButtonAction::Cancel,
            Self::Complete => ButtonAction::Complete,
            Self::Show(id) => ButtonAction::Show(StepKey::from(id.as_str())),
        }
    }
}
