#![forbid(unsafe_code)]

//! UI wiring installed while a step is shown.
//!
//! Every binding is a listener registered through the host
//! [`Document`]; the ids are handed back to the step, which removes them on
//! hide. Listeners hold only a weak reference to their step and do nothing
//! once the step is no longer open, so a late event after teardown is inert
//! even if the host delivers it.

use std::rc::Rc;

use waypoint_core::{Document, DomEvent, ElementId, Listener, ListenerId, ListenerTarget};

use crate::options::{AdvanceOn, Button, ButtonAction};
use crate::step::{RenderedContent, Step, WeakStep};
use crate::tour::Tour;

const ESCAPE_KEY: &str = "Escape";

/// Wrap `f` so it only runs while the step is open and its tour is alive.
fn step_listener(step: &Step, f: impl Fn(&Step, &Tour, &DomEvent) + 'static) -> Listener {
    let weak: WeakStep = step.downgrade();
    Rc::new(move |event: &DomEvent| {
        let Some(step) = weak.upgrade() else {
            return;
        };
        if !step.is_open() {
            return;
        }
        match step.tour() {
            Some(tour) => f(&step, &tour, event),
            None => tracing::warn!(
                target: "waypoint.step",
                step_id = %step.id(),
                event = %event.name,
                "ignoring UI event for a step whose tour is gone"
            ),
        }
    })
}

fn action_listener(step: &Step, action: ButtonAction) -> Listener {
    step_listener(step, move |_step, tour, _event| action.run(tour))
}

/// Bind every interaction the step's content and options call for.
pub(crate) fn bind_step(
    step: &Step,
    document: &dyn Document,
    content: &RenderedContent,
    exit_on_esc: bool,
) -> Vec<ListenerId> {
    let mut bindings = Vec::new();

    let buttons = step.options().buttons.as_deref().unwrap_or_default();
    for (button, element) in buttons.iter().zip(&content.buttons) {
        bindings.extend(bind_button(step, document, button, *element));
    }

    if let Some(link) = content.cancel_link {
        bindings.push(bind_cancel_link(step, document, link));
    }

    if let Some(advance_on) = &step.options().advance_on {
        bindings.push(bind_advance(step, document, advance_on));
    }

    if exit_on_esc {
        bindings.push(bind_escape(step, document));
    }

    bindings
}

pub(crate) fn bind_button(
    step: &Step,
    document: &dyn Document,
    button: &Button,
    element: ElementId,
) -> Vec<ListenerId> {
    let target = ListenerTarget::Element(element);
    let mut ids = vec![document.add_listener(
        target,
        "click",
        action_listener(step, button.action.clone()),
    )];
    for (event, action) in &button.events {
        ids.push(document.add_listener(target, event, action_listener(step, action.clone())));
    }
    ids
}

pub(crate) fn bind_cancel_link(step: &Step, document: &dyn Document, link: ElementId) -> ListenerId {
    document.add_listener(
        ListenerTarget::Element(link),
        "click",
        action_listener(step, ButtonAction::Cancel),
    )
}

/// Bind the advance trigger.
///
/// When the selector already matches an element, the listener goes on that
/// element. Otherwise it is delegated to the body and the selector is
/// checked against the event target at dispatch time, which covers elements
/// created after the step was shown.
pub(crate) fn bind_advance(step: &Step, document: &dyn Document, advance_on: &AdvanceOn) -> ListenerId {
    let found = advance_on
        .selector
        .as_deref()
        .and_then(|selector| document.query_selector(selector));
    let anchor = found.unwrap_or_else(|| document.body());
    // Only a delegated listener needs to filter by selector.
    let filter = advance_on.selector.clone().filter(|_| found.is_none());

    let listener = step_listener(step, move |step, tour, event| {
        let matched = match filter.as_deref() {
            None => true,
            Some(selector) => step
                .document()
                .is_some_and(|document| document.matches(event.target, selector)),
        };
        if matched {
            tracing::debug!(
                target: "waypoint.step",
                step_id = %step.id(),
                event = %event.name,
                "advance trigger fired"
            );
            tour.next();
        }
    });

    document.add_listener(ListenerTarget::Element(anchor), &advance_on.event, listener)
}

pub(crate) fn bind_escape(step: &Step, document: &dyn Document) -> ListenerId {
    let listener = step_listener(step, |_step, tour, event| {
        if event.key.as_deref() == Some(ESCAPE_KEY) {
            tour.cancel();
        }
    });
    document.add_listener(ListenerTarget::Window, "keydown", listener)
}
