#![forbid(unsafe_code)]

//! Headless host services for driving tours without a UI.
//!
//! [`HeadlessHost`] bundles an in-memory [`HeadlessDocument`] with recording
//! tooltip, overlay and scroll-lock services. Tests build a page, hand
//! [`HeadlessHost::host`] to a tour, simulate clicks and key presses, then
//! assert on what was left behind ([`HeadlessHost::residue`]) or on a text
//! [`Snapshot`] of the screen.

pub mod document;
pub mod host;
pub mod selector;
pub mod services;
pub mod snapshot;

pub use document::HeadlessDocument;
pub use host::HeadlessHost;
pub use selector::{Selector, SelectorError};
pub use services::{RecordingOverlay, RecordingScrollLock, RecordingTooltips};
pub use snapshot::Snapshot;
