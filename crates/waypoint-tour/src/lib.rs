#![forbid(unsafe_code)]

//! Waypoint Tour
//!
//! The guided-tour engine: an ordered list of [`Step`]s driven by a
//! [`Tour`] state machine, with every side effect of showing a step undone
//! when it is hidden and every side effect of a running tour undone when it
//! ends.
//!
//! # Key Components
//!
//! - [`Tour`] - Owns the steps, the current-step pointer and navigation
//! - [`Step`] - One stop: content, target, buttons, advance/skip conditions
//! - [`Modal`] - Dimmed backdrop with an opening around the current target
//! - [`Registry`] - Rebroadcasts tour events and tracks the active tour
//! - [`StepOptions`] / [`TourOptions`] - Typed configuration with a shallow
//!   defaults merge
//!
//! # How it fits in the system
//! The engine talks to the page only through the `waypoint-core` host
//! traits. `waypoint-harness` implements them headlessly for tests and the
//! demo; an embedding UI implements them for real.
//!
//! # Feature Flags
//!
//! - `config`: [`TourConfig`] loading from TOML and JSON.

mod bind;
#[cfg(feature = "config")]
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod modal;
pub mod options;
pub mod registry;
pub mod step;
pub mod tour;

#[cfg(feature = "config")]
pub use config::{StepConfig, TourConfig};
#[cfg(feature = "config")]
pub use error::ConfigError;
pub use error::{Result, TourError};
pub use events::{StepEvent, StepEventKind, TourEvent, TourEventKind};
pub use modal::Modal;
pub use options::{
    AdvanceOn, AttachTo, Button, ButtonAction, ScrollTo, ShowOn, StepId, StepKey, StepOptions,
    StepText, TargetRef, TourOptions, default_tooltip_props,
};
pub use registry::Registry;
pub use step::{ResolvedTarget, Step, StepPhase};
pub use tour::{Direction, Tour, TourState};
