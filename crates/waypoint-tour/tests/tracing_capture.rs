#![forbid(unsafe_code)]

//! Structured logging emitted by the tour lifecycle.
//!
//! Covers:
//! - `tour started` at INFO on `waypoint.tour` with the tour id
//! - `tour.done` span wrapping the ending events, carrying the outcome
//! - `cancel declined` when the confirm prompt is refused
//! - step transitions logged at DEBUG on `waypoint.step`
//!
//! Run:
//!   cargo test -p waypoint-tour --test tracing_capture

use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use waypoint_core::Rect;
use waypoint_harness::HeadlessHost;
use waypoint_tour::{Registry, StepOptions, Tour, TourOptions};

// ── Capture layer ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    message: String,
    fields: Vec<(String, String)>,
    parent_span_name: Option<String>,
}

impl CapturedEvent {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().expect("span lock").push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let message = visitor
            .0
            .iter()
            .find(|(key, _)| key == "message")
            .map(|(_, value)| value.clone())
            .unwrap_or_default();
        let parent_span_name = ctx.event_span(event).map(|span| span.name().to_string());
        self.events.lock().expect("event lock").push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message,
            fields: visitor.0,
            parent_span_name,
        });
    }
}

type Captured = (Vec<CapturedSpan>, Vec<CapturedEvent>);

fn capture(run: impl FnOnce()) -> Captured {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = Capture {
        spans: Arc::clone(&spans),
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, run);
    let spans = spans.lock().expect("span lock").clone();
    let events = events.lock().expect("event lock").clone();
    (spans, events)
}

fn two_step_tour(host: &HeadlessHost, options: TourOptions) -> Tour {
    let tour = Tour::with_registry(host.host(), Registry::new(), options);
    for id in ["first", "second"] {
        tour.add_step(StepOptions::new().id(id).text(id)).expect("add step");
    }
    tour
}

// ═══════════════════════════════════════════════════════════════════════════
// 1. Start and end
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn start_is_logged_with_the_tour_id() {
    let host = HeadlessHost::new(Rect::from_size(80, 24));
    let mut tour_id = String::new();
    let (_, events) = capture(|| {
        let tour = two_step_tour(&host, TourOptions::new().tour_name("logged"));
        tour_id = tour.id().to_owned();
        tour.start();
    });

    let started = events
        .iter()
        .find(|event| event.message == "tour started")
        .expect("tour started event");
    assert_eq!(started.level, tracing::Level::INFO);
    assert_eq!(started.target, "waypoint.tour");
    assert_eq!(started.field("tour_id"), Some(tour_id.as_str()));
}

#[test]
fn endings_are_logged_inside_the_done_span() {
    let host = HeadlessHost::new(Rect::from_size(80, 24));
    let (spans, events) = capture(|| {
        let tour = two_step_tour(&host, TourOptions::new());
        tour.start();
        tour.cancel();
    });

    let done = spans
        .iter()
        .find(|span| span.name == "tour.done")
        .expect("tour.done span");
    assert!(
        done.fields.iter().any(|(key, value)| key == "outcome" && value == "Cancelled"),
        "{:?}",
        done.fields
    );

    let cancelled = events
        .iter()
        .find(|event| event.message == "tour cancelled")
        .expect("tour cancelled event");
    assert_eq!(cancelled.level, tracing::Level::INFO);
    assert_eq!(cancelled.parent_span_name.as_deref(), Some("tour.done"));
    assert!(events.iter().all(|event| event.message != "tour completed"));
}

#[test]
fn completion_is_logged_once() {
    let host = HeadlessHost::new(Rect::from_size(80, 24));
    let (_, events) = capture(|| {
        let tour = two_step_tour(&host, TourOptions::new());
        tour.start();
        tour.next();
        tour.next();
        tour.complete();
    });

    let completed = events
        .iter()
        .filter(|event| event.message == "tour completed")
        .count();
    assert_eq!(completed, 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// 2. Cancel confirmation
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn declined_cancel_is_logged_and_nothing_ends() {
    let host = HeadlessHost::new(Rect::from_size(80, 24));
    host.document.queue_confirm(false);
    let (spans, events) = capture(|| {
        let tour = two_step_tour(&host, TourOptions::new().confirm_cancel(true));
        tour.start();
        tour.cancel();
    });

    assert!(events.iter().any(|event| event.message == "cancel declined"));
    assert!(spans.iter().all(|span| span.name != "tour.done"));
}

// ═══════════════════════════════════════════════════════════════════════════
// 3. Step transitions
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn step_transitions_are_debug_events() {
    let host = HeadlessHost::new(Rect::from_size(80, 24));
    let (spans, events) = capture(|| {
        let tour = two_step_tour(&host, TourOptions::new());
        tour.start();
        tour.next();
    });

    assert!(spans.iter().any(|span| span.name == "tour.show"));
    let step_events: Vec<&CapturedEvent> = events
        .iter()
        .filter(|event| event.target == "waypoint.step")
        .collect();
    assert!(!step_events.is_empty());
    let hidden = step_events
        .iter()
        .find(|event| event.message == "step hidden")
        .expect("step hidden event");
    assert_eq!(hidden.level, tracing::Level::DEBUG);
    assert_eq!(hidden.field("step_id"), Some("first"));
}
