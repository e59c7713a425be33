#![forbid(unsafe_code)]

//! Waypoint public facade crate.
//!
//! Re-exports the tour engine and the host contracts it is written against,
//! plus a prelude for day-to-day use. Enable the `harness` feature (on by
//! default) for the headless host, and `config` for loading tours from
//! TOML or JSON.

// --- Core re-exports -------------------------------------------------------

pub use waypoint_core::{
    Document, DomEvent, ElementId, ElementSpec, Host, ListenerTarget, OverlayRenderer, Placement,
    Rect, ScrollBehavior, ScrollLock, TooltipProps, TooltipRequest, TooltipService,
};

// --- Tour re-exports -------------------------------------------------------

pub use waypoint_tour::{
    AdvanceOn, AttachTo, Button, ButtonAction, Registry, Result, ScrollTo, Step, StepEvent,
    StepEventKind, StepId, StepOptions, StepText, Tour, TourError, TourEvent, TourEventKind,
    TourOptions, TourState,
};

#[cfg(feature = "config")]
pub use waypoint_tour::{ConfigError, TourConfig};

// --- Harness re-exports ----------------------------------------------------

#[cfg(feature = "harness")]
pub use waypoint_harness::{HeadlessHost, Snapshot};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AttachTo, Button, ButtonAction, Host, Placement, Rect, Registry, Step, StepOptions, Tour,
        TourEventKind, TourOptions, TourState,
    };

    #[cfg(feature = "harness")]
    pub use crate::HeadlessHost;

    pub use crate::{core, tour};
}

pub use waypoint_core as core;
pub use waypoint_tour as tour;

#[cfg(feature = "harness")]
pub use waypoint_harness as harness;

#[cfg(all(test, feature = "harness"))]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_is_enough_for_a_tour() {
        let page = HeadlessHost::new(Rect::from_size(40, 12));
        let tour = Tour::with_registry(page.host(), Registry::new(), TourOptions::new());
        tour.add_step(
            StepOptions::new()
                .text("Hello")
                .buttons(vec![Button::new("Done", ButtonAction::Complete)]),
        )
        .expect("add step");

        tour.start();
        assert_eq!(tour.state(), TourState::Active);
        tour.complete();
        assert!(page.residue().is_empty());
    }
}
