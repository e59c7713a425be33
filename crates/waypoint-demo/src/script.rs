#![forbid(unsafe_code)]

//! Scripted interaction with a running tour.
//!
//! Actions are written one per script entry:
//!
//! | entry            | effect                                     |
//! |------------------|--------------------------------------------|
//! | `next` / `back`  | call the tour directly                     |
//! | `cancel`         | call `Tour::cancel`                        |
//! | `complete`       | call `Tour::complete`                      |
//! | `key:<name>`     | press a key (`Escape`, `ArrowRight`, ...)  |
//! | `click:<text>`   | click the current step's button by label   |
//! | `close`          | click the current step's cancel link       |
//! | `resize:<w>x<h>` | resize the viewport                        |

use std::fmt;
use std::str::FromStr;

use waypoint_core::{Document, Rect};
use waypoint_harness::Snapshot;
use waypoint_tour::{Tour, TourState};

use crate::page::Page;
use crate::{DemoError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Next,
    Back,
    Cancel,
    Complete,
    Key(String),
    Click(String),
    Close,
    Resize { width: u16, height: u16 },
}

impl FromStr for Action {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let unknown = || DemoError::UnknownAction(s.to_owned());
        match s.split_once(':') {
            None => match s {
                "next" => Ok(Self::Next),
                "back" => Ok(Self::Back),
                "cancel" => Ok(Self::Cancel),
                "complete" => Ok(Self::Complete),
                "close" => Ok(Self::Close),
                _ => Err(unknown()),
            },
            Some(("key", key)) if !key.is_empty() => Ok(Self::Key(key.to_owned())),
            Some(("click", text)) if !text.is_empty() => Ok(Self::Click(text.to_owned())),
            Some(("resize", size)) => {
                let (width, height) = size.split_once('x').ok_or_else(unknown)?;
                Ok(Self::Resize {
                    width: width.parse().map_err(|_| unknown())?,
                    height: height.parse().map_err(|_| unknown())?,
                })
            }
            Some(_) => Err(unknown()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => f.write_str("next"),
            Self::Back => f.write_str("back"),
            Self::Cancel => f.write_str("cancel"),
            Self::Complete => f.write_str("complete"),
            Self::Key(key) => write!(f, "key:{key}"),
            Self::Click(text) => write!(f, "click:{text}"),
            Self::Close => f.write_str("close"),
            Self::Resize { width, height } => write!(f, "resize:{width}x{height}"),
        }
    }
}

/// The page after one action.
#[derive(Debug, Clone)]
pub struct Frame {
    /// `"start"` for the first frame, otherwise the action applied.
    pub label: String,
    pub step: Option<String>,
    pub state: TourState,
    pub snapshot: Snapshot,
}

impl Frame {
    fn capture(label: String, page: &Page, tour: &Tour) -> Frame {
        Frame {
            label,
            step: tour.current_step().map(|step| step.id().to_string()),
            state: tour.state(),
            snapshot: Snapshot::capture(&page.host),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "== {} | {:?} | step: {} ==",
            self.label,
            self.state,
            self.step.as_deref().unwrap_or("-")
        )?;
        write!(f, "{}", self.snapshot)
    }
}

/// Start `tour` and apply `actions` in order, capturing a frame after the
/// start and after every action.
pub fn run(page: &Page, tour: &Tour, actions: &[Action]) -> Result<Vec<Frame>> {
    let _span = tracing::info_span!("demo.script", tour_id = %tour.id(), actions = actions.len()).entered();
    tour.start();
    let mut frames = vec![Frame::capture("start".to_owned(), page, tour)];
    for action in actions {
        apply(page, tour, action)?;
        tracing::debug!(%action, state = ?tour.state(), "action applied");
        frames.push(Frame::capture(action.to_string(), page, tour));
    }
    Ok(frames)
}

fn apply(page: &Page, tour: &Tour, action: &Action) -> Result<()> {
    let document = &page.host.document;
    match action {
        Action::Next => tour.next(),
        Action::Back => tour.back(),
        Action::Cancel => tour.cancel(),
        Action::Complete => tour.complete(),
        Action::Key(key) => {
            document.press_key(key);
        }
        Action::Click(text) => {
            let step = tour.current_step().ok_or(DemoError::NoCurrentStep)?;
            let selector = format!("[data-waypoint-step-id=\"{}\"] button", step.id());
            let button = document
                .query_selector_all(&selector)
                .into_iter()
                .find(|element| document.text(*element).as_deref() == Some(text.as_str()))
                .ok_or_else(|| DemoError::NoSuchButton { text: text.clone() })?;
            document.click(button);
        }
        Action::Close => {
            let step = tour.current_step().ok_or(DemoError::NoCurrentStep)?;
            let selector = format!("[data-waypoint-step-id=\"{}\"] .waypoint-cancel-link", step.id());
            let link = document
                .query_selector(&selector)
                .ok_or_else(|| DemoError::NoSuchButton { text: "×".to_owned() })?;
            document.click(link);
        }
        Action::Resize { width, height } => {
            document.resize(Rect::from_size(*width, *height));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_parse_and_print() {
        for entry in ["next", "back", "cancel", "complete", "close", "key:Escape", "click:Next", "resize:60x20"] {
            let action: Action = entry.parse().expect("valid");
            assert_eq!(action.to_string(), entry);
        }
    }

    #[test]
    fn bad_actions_are_rejected() {
        for entry in ["", "jump", "key:", "resize:60", "resize:axb", "tap:Next"] {
            assert!(
                matches!(entry.parse::<Action>(), Err(DemoError::UnknownAction(_))),
                "{entry:?} should be rejected"
            );
        }
    }
}
