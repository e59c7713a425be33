#![forbid(unsafe_code)]

//! The landing page the welcome tour walks through.

use waypoint_core::{Document, ElementId, ElementSpec, Rect};
use waypoint_harness::HeadlessHost;

/// Smallest viewport the layout fits in.
pub const MIN_WIDTH: u16 = 40;
pub const MIN_HEIGHT: u16 = 16;

#[derive(Debug, Clone)]
pub struct Page {
    pub host: HeadlessHost,
    pub welcome: ElementId,
    pub including: ElementId,
    pub example: ElementId,
    pub followup: ElementId,
}

/// Lay out the landing page in a `width` x `height` viewport.
///
/// Dimensions below [`MIN_WIDTH`] x [`MIN_HEIGHT`] are raised to the
/// minimum.
pub fn layout(width: u16, height: u16) -> Page {
    let width = width.max(MIN_WIDTH);
    let height = height.max(MIN_HEIGHT);
    let host = HeadlessHost::new(Rect::from_size(width, height));
    let document = &host.document;
    let body = document.body();

    let half = width / 2;
    let section = |class: &str, text: &str, bounds: Rect| {
        document.insert(body, &ElementSpec::new("section").class(class).text(text), bounds)
    };

    let welcome = section("hero-welcome", "Waypoint", Rect::new(2, 1, width - 4, 4));
    let including = section("hero-including", "Including", Rect::new(2, 6, half - 3, 4));
    let example = section("hero-example", "Example", Rect::new(half + 1, 6, half - 3, 4));
    let followup = section(
        "hero-followup",
        "Star the project",
        Rect::new(2, height - 4, width - 4, 3),
    );

    Page {
        host,
        welcome,
        including,
        example,
        followup,
    }
}
