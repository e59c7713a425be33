#![forbid(unsafe_code)]

//! Marker names written to the page while a tour runs.

/// Body attribute holding the id of the active tour.
pub const ACTIVE_TOUR_ATTRIBUTE: &str = "data-waypoint-active-tour";

/// Body attribute holding the id of the step currently shown.
pub const STEP_ATTRIBUTE: &str = "data-waypoint-step";

/// Body class present while any tour is active.
pub const ACTIVE_CLASS: &str = "waypoint-active";

/// Body class present while the modal backdrop is visible.
pub const MODAL_VISIBLE_CLASS: &str = "waypoint-modal-is-visible";

/// Classes added to a step's target while the step is shown.
pub const TARGET_CLASSES: [&str; 2] = ["waypoint-enabled", "waypoint-target"];

/// Class on the root of every rendered step.
pub const ELEMENT_CLASS: &str = "waypoint-element";

pub const HEADER_CLASS: &str = "waypoint-header";
pub const TITLE_CLASS: &str = "waypoint-title";
pub const TEXT_CLASS: &str = "waypoint-text";
pub const FOOTER_CLASS: &str = "waypoint-footer";
pub const BUTTON_CLASS: &str = "waypoint-button";
pub const CANCEL_LINK_CLASS: &str = "waypoint-cancel-link";

/// Default prompt for `confirm_cancel`.
pub const DEFAULT_CONFIRM_CANCEL_MESSAGE: &str = "Are you sure you want to stop the tour?";

/// Name used in tour ids when no tour name is configured.
pub const DEFAULT_TOUR_NAME: &str = "tour";
