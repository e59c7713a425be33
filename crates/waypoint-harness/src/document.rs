#![forbid(unsafe_code)]

//! In-memory [`Document`] for tests and the demo.
//!
//! The document is a plain node tree rooted at a body element that covers the
//! viewport. Elements created by tests can be given bounds with
//! [`HeadlessDocument::set_bounds`]; elements without bounds have no layout
//! and [`Document::bounding_rect`] returns `None` for them.
//!
//! # Dispatch
//!
//! [`HeadlessDocument::dispatch`] delivers an event to listeners on the
//! target, then on each ancestor up to the body, then on the window. The set
//! of listeners is captured before the first call; a listener removed while
//! the event is in flight is skipped, and one added while it is in flight
//! does not see it.
//!
//! # Prompts
//!
//! [`Document::confirm`] answers from a queue filled with
//! [`HeadlessDocument::queue_confirm`], falling back to a default answer
//! (`true`). Every prompt message is recorded.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use waypoint_core::{
    Document, DomEvent, ElementId, ElementSpec, Listener, ListenerId, ListenerTarget, Rect,
    ScrollBehavior,
};

use crate::selector::{Selector, Tree};

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    bounds: Option<Rect>,
}

impl Node {
    fn new(spec: &ElementSpec, parent: Option<ElementId>) -> Self {
        let mut classes: Vec<String> = Vec::new();
        for class in &spec.classes {
            if !classes.contains(class) {
                classes.push(class.clone());
            }
        }
        Self {
            tag: spec.tag.to_ascii_lowercase(),
            classes,
            attributes: spec.attributes.iter().cloned().collect(),
            text: spec.text.clone(),
            parent,
            children: Vec::new(),
            bounds: None,
        }
    }
}

struct ListenerEntry {
    id: ListenerId,
    target: ListenerTarget,
    event: String,
    listener: Listener,
}

struct Nodes(BTreeMap<ElementId, Node>);

impl Tree for Nodes {
    fn tag(&self, element: ElementId) -> Option<&str> {
        self.0.get(&element).map(|node| node.tag.as_str())
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.0
            .get(&element)?
            .attributes
            .get(name)
            .map(String::as_str)
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.0
            .get(&element)
            .is_some_and(|node| node.classes.iter().any(|c| c == class))
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.0.get(&element).and_then(|node| node.parent)
    }
}

struct State {
    viewport: Rect,
    body: ElementId,
    nodes: Nodes,
    next_element: u64,
    listeners: Vec<ListenerEntry>,
    next_listener: u64,
    confirm_answers: VecDeque<bool>,
    default_confirm: bool,
    prompts: Vec<String>,
    scrolls: Vec<(ElementId, ScrollBehavior)>,
}

impl State {
    /// Depth-first, document order, starting at `root` (inclusive).
    fn walk(&self, root: ElementId) -> Vec<ElementId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(element) = stack.pop() {
            let Some(node) = self.nodes.0.get(&element) else {
                continue;
            };
            order.push(element);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    fn node_mut(&mut self, element: ElementId) -> Option<&mut Node> {
        let node = self.nodes.0.get_mut(&element);
        if node.is_none() {
            tracing::trace!(element = element.raw(), "operation on a missing element ignored");
        }
        node
    }
}

pub struct HeadlessDocument {
    state: RefCell<State>,
}

impl std::fmt::Debug for HeadlessDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("HeadlessDocument")
            .field("viewport", &state.viewport)
            .field("elements", &state.nodes.0.len())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl HeadlessDocument {
    /// An empty page whose body covers `viewport`.
    pub fn new(viewport: Rect) -> Self {
        let body = ElementId::new(1);
        let mut node = Node::new(&ElementSpec::new("body"), None);
        node.bounds = Some(viewport);
        let mut nodes = BTreeMap::new();
        nodes.insert(body, node);
        Self {
            state: RefCell::new(State {
                viewport,
                body,
                nodes: Nodes(nodes),
                next_element: 2,
                listeners: Vec::new(),
                next_listener: 1,
                confirm_answers: VecDeque::new(),
                default_confirm: true,
                prompts: Vec::new(),
                scrolls: Vec::new(),
            }),
        }
    }

    /// Create an element with layout.
    pub fn insert(&self, parent: ElementId, spec: &ElementSpec, bounds: Rect) -> ElementId {
        let element = self.create_element(parent, spec);
        self.set_bounds(element, Some(bounds));
        element
    }

    pub fn set_bounds(&self, element: ElementId, bounds: Option<Rect>) {
        if let Some(node) = self.state.borrow_mut().node_mut(element) {
            node.bounds = bounds;
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Deliver an event to `target`, its ancestors, then the window.
    /// Returns how many listeners ran.
    pub fn dispatch(&self, target: ElementId, name: &str, key: Option<&str>) -> usize {
        let event = DomEvent {
            name: name.to_owned(),
            target,
            key: key.map(str::to_owned),
        };

        let queued: Vec<ListenerId> = {
            let state = self.state.borrow();
            let mut path = Vec::new();
            let mut cursor = state.nodes.0.contains_key(&target).then_some(target);
            while let Some(element) = cursor {
                path.push(ListenerTarget::Element(element));
                cursor = state.nodes.parent(element);
            }
            path.push(ListenerTarget::Window);

            path.iter()
                .flat_map(|hop| {
                    state
                        .listeners
                        .iter()
                        .filter(move |entry| entry.target == *hop && entry.event == name)
                        .map(|entry| entry.id)
                })
                .collect()
        };

        let mut delivered = 0;
        for id in queued {
            let listener = self
                .state
                .borrow()
                .listeners
                .iter()
                .find(|entry| entry.id == id)
                .map(|entry| entry.listener.clone());
            if let Some(listener) = listener {
                listener(&event);
                delivered += 1;
            }
        }
        tracing::trace!(event = name, target = target.raw(), delivered, "dispatched");
        delivered
    }

    pub fn click(&self, element: ElementId) -> usize {
        self.dispatch(element, "click", None)
    }

    /// A `keydown` on the body, which bubbles to the window.
    pub fn press_key(&self, key: &str) -> usize {
        let body = self.body();
        self.dispatch(body, "keydown", Some(key))
    }

    /// Change the viewport and fire `resize` on the window.
    pub fn resize(&self, viewport: Rect) -> usize {
        let body = {
            let mut state = self.state.borrow_mut();
            state.viewport = viewport;
            let body = state.body;
            if let Some(node) = state.node_mut(body) {
                node.bounds = Some(viewport);
            }
            body
        };
        self.dispatch(body, "resize", None)
    }

    // -----------------------------------------------------------------------
    // Prompts
    // -----------------------------------------------------------------------

    /// Answer the next [`Document::confirm`] prompt with `answer`.
    pub fn queue_confirm(&self, answer: bool) {
        self.state.borrow_mut().confirm_answers.push_back(answer);
    }

    /// Answer used when the queue is empty.
    pub fn set_default_confirm(&self, answer: bool) {
        self.state.borrow_mut().default_confirm = answer;
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.borrow().prompts.clone()
    }

    pub fn scrolls(&self) -> Vec<(ElementId, ScrollBehavior)> {
        self.state.borrow().scrolls.clone()
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn exists(&self, element: ElementId) -> bool {
        self.state.borrow().nodes.0.contains_key(&element)
    }

    /// Elements in the document, body included.
    pub fn element_count(&self) -> usize {
        self.state.borrow().nodes.0.len()
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn listener_count_for(&self, target: ListenerTarget, event: &str) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|entry| entry.target == target && entry.event == event)
            .count()
    }

    pub fn tag(&self, element: ElementId) -> Option<String> {
        self.state.borrow().nodes.tag(element).map(str::to_owned)
    }

    pub fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .attribute(element, name)
            .map(str::to_owned)
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.state.borrow().nodes.has_class(element, class)
    }

    pub fn classes(&self, element: ElementId) -> Vec<String> {
        self.state
            .borrow()
            .nodes
            .0
            .get(&element)
            .map(|node| node.classes.clone())
            .unwrap_or_default()
    }

    /// The element's own text.
    pub fn text(&self, element: ElementId) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .0
            .get(&element)
            .and_then(|node| node.text.clone())
    }

    /// Text of the element and its descendants in document order.
    pub fn text_content(&self, element: ElementId) -> Vec<String> {
        let state = self.state.borrow();
        state
            .walk(element)
            .into_iter()
            .filter_map(|element| state.nodes.0.get(&element)?.text.clone())
            .collect()
    }

    pub fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.state
            .borrow()
            .nodes
            .0
            .get(&element)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.state.borrow().nodes.parent(element)
    }

    /// Every element matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Vec<ElementId> {
        let Some(selector) = parse_logged(selector) else {
            return Vec::new();
        };
        let state = self.state.borrow();
        state
            .walk(state.body)
            .into_iter()
            .filter(|element| selector.matches(&state.nodes, *element))
            .collect()
    }
}

fn parse_logged(selector: &str) -> Option<Selector> {
    Selector::parse(selector)
        .inspect_err(|err| {
            tracing::warn!(selector, error = %err, "invalid selector matches nothing");
        })
        .ok()
}

impl Document for HeadlessDocument {
    fn body(&self) -> ElementId {
        self.state.borrow().body
    }

    fn viewport(&self) -> Rect {
        self.state.borrow().viewport
    }

    fn create_element(&self, parent: ElementId, spec: &ElementSpec) -> ElementId {
        let mut state = self.state.borrow_mut();
        let parent = if state.nodes.0.contains_key(&parent) {
            parent
        } else {
            state.body
        };
        let element = ElementId::new(state.next_element);
        state.next_element += 1;
        state.nodes.0.insert(element, Node::new(spec, Some(parent)));
        if let Some(node) = state.node_mut(parent) {
            node.children.push(element);
        }
        element
    }

    fn remove_element(&self, element: ElementId) {
        let mut state = self.state.borrow_mut();
        if element == state.body {
            return;
        }
        let parent = state.nodes.parent(element);
        for removed in state.walk(element) {
            state.nodes.0.remove(&removed);
            state
                .listeners
                .retain(|entry| entry.target != ListenerTarget::Element(removed));
        }
        if let Some(parent) = parent
            && let Some(node) = state.node_mut(parent)
        {
            node.children.retain(|child| *child != element);
        }
    }

    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        let selector = parse_logged(selector)?;
        let state = self.state.borrow();
        state
            .walk(state.body)
            .into_iter()
            .find(|element| selector.matches(&state.nodes, *element))
    }

    fn matches(&self, element: ElementId, selector: &str) -> bool {
        let Some(selector) = parse_logged(selector) else {
            return false;
        };
        let state = self.state.borrow();
        state.nodes.0.contains_key(&element) && selector.matches(&state.nodes, element)
    }

    fn bounding_rect(&self, element: ElementId) -> Option<Rect> {
        self.state.borrow().nodes.0.get(&element)?.bounds
    }

    fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.state.borrow_mut().node_mut(element) {
            node.attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    fn remove_attribute(&self, element: ElementId, name: &str) {
        if let Some(node) = self.state.borrow_mut().node_mut(element) {
            node.attributes.remove(name);
        }
    }

    fn add_class(&self, element: ElementId, class: &str) {
        if let Some(node) = self.state.borrow_mut().node_mut(element)
            && !node.classes.iter().any(|c| c == class)
        {
            node.classes.push(class.to_owned());
        }
    }

    fn remove_class(&self, element: ElementId, class: &str) {
        if let Some(node) = self.state.borrow_mut().node_mut(element) {
            node.classes.retain(|c| c != class);
        }
    }

    fn add_listener(&self, target: ListenerTarget, event: &str, listener: Listener) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId::new(state.next_listener);
        state.next_listener += 1;
        state.listeners.push(ListenerEntry {
            id,
            target,
            event: event.to_owned(),
            listener,
        });
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|entry| entry.id != id);
        state.listeners.len() != before
    }

    fn scroll_into_view(&self, element: ElementId, behavior: ScrollBehavior) {
        self.state.borrow_mut().scrolls.push((element, behavior));
    }

    fn confirm(&self, message: &str) -> bool {
        let mut state = self.state.borrow_mut();
        state.prompts.push(message.to_owned());
        let fallback = state.default_confirm;
        state.confirm_answers.pop_front().unwrap_or(fallback)
    }
}
