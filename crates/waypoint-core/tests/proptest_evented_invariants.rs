//! Property-based invariant tests for the event hub and geometry helpers.
//!
//! 1. `trigger` invokes exactly the live handlers for the event's kind, in
//!    registration order, checked against a simple model.
//! 2. `once` handlers fire at most once.
//! 3. `off` removes exactly what it reports.
//! 4. `intersection` stays inside both rectangles.
//! 5. `outer` contains the original rectangle.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use waypoint_core::{Evented, HubEvent, Rect, Sides, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Alpha,
    Beta,
}

#[derive(Debug)]
struct Signal(Kind);

impl HubEvent for Signal {
    type Kind = Kind;

    fn kind(&self) -> Kind {
        self.0
    }
}

// ── Strategies ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Subscribe { kind: Kind, once: bool },
    Off(usize),
    Trigger(Kind),
}

fn kind_strategy() -> impl Strategy<Value = Kind> {
    prop_oneof![Just(Kind::Alpha), Just(Kind::Beta)]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (kind_strategy(), any::<bool>()).prop_map(|(kind, once)| Op::Subscribe { kind, once }),
        1 => (0usize..16).prop_map(Op::Off),
        3 => kind_strategy().prop_map(Op::Trigger),
    ]
}

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (0u16..200, 0u16..200, 0u16..100, 0u16..100).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

// ═════════════════════════════════════════════════════════════════════════
// 1-3. Dispatch matches the model
// ═════════════════════════════════════════════════════════════════════════

struct ModelEntry {
    tag: usize,
    id: SubscriptionId,
    kind: Kind,
    once: bool,
}

proptest! {
    #[test]
    fn dispatch_matches_model(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let hub: Evented<Signal> = Evented::new();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut model: Vec<ModelEntry> = Vec::new();
        let mut next_tag = 0usize;

        for op in &ops {
            match *op {
                Op::Subscribe { kind, once } => {
                    let tag = next_tag;
                    next_tag += 1;
                    let log = Rc::clone(&fired);
                    let handler = move |_: &Signal| log.borrow_mut().push(tag);
                    let id = if once { hub.once(kind, handler) } else { hub.on(kind, handler) };
                    model.push(ModelEntry { tag, id, kind, once });
                }
                Op::Off(index) => {
                    if model.is_empty() {
                        continue;
                    }
                    let entry = model.remove(index % model.len());
                    prop_assert_eq!(hub.off(Some(entry.kind), Some(entry.id)), 1);
                    prop_assert_eq!(hub.off(None, Some(entry.id)), 0);
                }
                Op::Trigger(kind) => {
                    fired.borrow_mut().clear();
                    let invoked = hub.trigger(&Signal(kind));

                    let expected: Vec<usize> = model
                        .iter()
                        .filter(|entry| entry.kind == kind)
                        .map(|entry| entry.tag)
                        .collect();
                    prop_assert_eq!(&*fired.borrow(), &expected);
                    prop_assert_eq!(invoked, expected.len());

                    model.retain(|entry| !(entry.kind == kind && entry.once));
                }
            }

            for kind in [Kind::Alpha, Kind::Beta] {
                let live = model.iter().filter(|entry| entry.kind == kind).count();
                prop_assert_eq!(hub.handler_count(kind), live);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1b. Handlers added during dispatch wait for the next trigger
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reentrant_subscriptions_defer(rounds in 1usize..6) {
        let hub: Evented<Signal> = Evented::new();
        let count = Rc::new(RefCell::new(0usize));
        {
            let hub2 = hub.clone();
            let count = Rc::clone(&count);
            hub.on(Kind::Alpha, move |_| {
                let count = Rc::clone(&count);
                hub2.on(Kind::Beta, move |_| *count.borrow_mut() += 1);
            });
        }

        for _ in 0..rounds {
            hub.trigger(&Signal(Kind::Alpha));
        }
        prop_assert_eq!(hub.handler_count(Kind::Beta), rounds);
        prop_assert_eq!(hub.trigger(&Signal(Kind::Beta)), rounds);
        prop_assert_eq!(*count.borrow(), rounds);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4-5. Geometry
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn intersection_is_inside_both(a in rect_strategy(), b in rect_strategy()) {
        if let Some(common) = a.intersection(&b) {
            prop_assert!(!common.is_empty());
            for rect in [a, b] {
                prop_assert!(common.x >= rect.x && common.right() <= rect.right());
                prop_assert!(common.y >= rect.y && common.bottom() <= rect.bottom());
            }
        }
    }

    #[test]
    fn outer_contains_the_original(rect in rect_strategy(), margin in 0u16..10) {
        let grown = rect.outer(Sides::all(margin));
        prop_assert!(grown.x <= rect.x && grown.y <= rect.y);
        prop_assert!(grown.right() >= rect.right() && grown.bottom() >= rect.bottom());
    }
}
