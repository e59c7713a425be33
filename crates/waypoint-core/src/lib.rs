#![forbid(unsafe_code)]

//! Core: geometry, the typed event hub, and host service contracts.
//!
//! # Role in Waypoint
//! `waypoint-core` is the bottom layer. It has no notion of tours or steps;
//! it defines the primitives the tour engine (`waypoint-tour`) is written
//! against and that hosts (`waypoint-harness`, or an embedding UI) implement.
//!
//! # Primary responsibilities
//! - **Rect / Sides**: cell-space geometry for targets and overlay openings.
//! - **Evented**: ordered, re-entrancy-safe publish/subscribe over a closed
//!   event enum.
//! - **Host**: the `Document`, `TooltipService`, `OverlayRenderer` and
//!   `ScrollLock` traits.

pub mod evented;
pub mod geometry;
pub mod host;

pub use evented::{Evented, HubEvent, SubscriptionId};
pub use geometry::{Rect, Sides};
pub use host::{
    Document, DomEvent, ElementId, ElementSpec, Host, Listener, ListenerId, ListenerTarget,
    OverlayRenderer, Placement, ScrollBehavior, ScrollLock, TooltipHandle, TooltipProps,
    TooltipRequest, TooltipService,
};
