#![forbid(unsafe_code)]

//! A small CSS selector subset for the headless document.
//!
//! Supported: type selectors (`button`), `#id`, `.class`, `[attr]`,
//! `[attr=value]` / `[attr="value"]`, the universal selector `*`,
//! descendant combinators (whitespace) and selector lists (`a, b`).
//! Anything else is rejected with a [`SelectorError`].

use thiserror::Error;
use waypoint_core::ElementId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected {found:?} at offset {offset} in selector {input:?}")]
    Unexpected {
        input: String,
        offset: usize,
        found: char,
    },
    #[error("unterminated attribute selector in {input:?}")]
    Unterminated { input: String },
}

/// Read access to a node tree, as needed for matching.
pub trait Tree {
    fn tag(&self, element: ElementId) -> Option<&str>;
    fn attribute(&self, element: ElementId, name: &str) -> Option<&str>;
    fn has_class(&self, element: ElementId, class: &str) -> bool;
    fn parent(&self, element: ElementId) -> Option<ElementId>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty()
    }

    fn matches(&self, tree: &dyn Tree, element: ElementId) -> bool {
        if let Some(tag) = &self.tag
            && tree.tag(element).is_none_or(|actual| !actual.eq_ignore_ascii_case(tag))
        {
            return false;
        }
        if let Some(id) = &self.id
            && tree.attribute(element, "id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|class| tree.has_class(element, class)) {
            return false;
        }
        self.attributes.iter().all(|(name, value)| {
            match (tree.attribute(element, name), value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            }
        })
    }
}

/// Compounds joined by descendant combinators; the last one is the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
}

impl Complex {
    fn matches(&self, tree: &dyn Tree, element: ElementId) -> bool {
        let Some((subject, ancestors)) = self.compounds.split_last() else {
            return false;
        };
        if !subject.matches(tree, element) {
            return false;
        }
        let mut cursor = tree.parent(element);
        for compound in ancestors.iter().rev() {
            loop {
                let Some(candidate) = cursor else {
                    return false;
                };
                cursor = tree.parent(candidate);
                if compound.matches(tree, candidate) {
                    break;
                }
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Selector, SelectorError> {
        let mut alternatives = Vec::new();
        for part in split_list(input)? {
            alternatives.push(parse_complex(input, part)?);
        }
        if alternatives.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Selector { alternatives })
    }

    pub fn matches(&self, tree: &dyn Tree, element: ElementId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| complex.matches(tree, element))
    }
}

/// Split on top-level commas, leaving commas inside `[...]` alone.
fn split_list(input: &str) -> Result<Vec<(usize, &str)>, SelectorError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (offset, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if depth > 0 => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push((start, &input[start..offset]));
                start = offset + 1;
            }
            _ => {}
        }
    }
    if depth > 0 || quote.is_some() {
        return Err(SelectorError::Unterminated {
            input: input.to_owned(),
        });
    }
    parts.push((start, &input[start..]));
    Ok(parts
        .into_iter()
        .filter(|(_, part)| !part.trim().is_empty())
        .collect())
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

fn parse_complex(input: &str, (base, part): (usize, &str)) -> Result<Complex, SelectorError> {
    let unexpected = |offset: usize, found: char| SelectorError::Unexpected {
        input: input.to_owned(),
        offset: base + offset,
        found,
    };

    let chars: Vec<(usize, char)> = part.char_indices().collect();
    let mut compounds = Vec::new();
    let mut current = Compound::default();
    let mut i = 0;

    let read_ident = |i: &mut usize| -> String {
        let mut ident = String::new();
        while let Some(&(_, ch)) = chars.get(*i) {
            if !is_ident_char(ch) {
                break;
            }
            ident.push(ch);
            *i += 1;
        }
        ident
    };

    while let Some(&(offset, ch)) = chars.get(i) {
        match ch {
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    compounds.push(std::mem::take(&mut current));
                }
                i += 1;
            }
            '*' => i += 1,
            '#' | '.' => {
                i += 1;
                let ident = read_ident(&mut i);
                if ident.is_empty() {
                    return Err(unexpected(offset, ch));
                }
                if ch == '#' {
                    current.id = Some(ident);
                } else {
                    current.classes.push(ident);
                }
            }
            '[' => {
                i += 1;
                let name = read_ident(&mut i);
                if name.is_empty() {
                    return Err(unexpected(offset, ch));
                }
                let value = match chars.get(i) {
                    Some(&(_, ']')) => None,
                    Some(&(_, '=')) => {
                        i += 1;
                        let mut value = String::new();
                        match chars.get(i) {
                            Some(&(_, q @ ('"' | '\''))) => {
                                i += 1;
                                loop {
                                    match chars.get(i) {
                                        Some(&(_, c)) if c == q => {
                                            i += 1;
                                            break;
                                        }
                                        Some(&(_, c)) => {
                                            value.push(c);
                                            i += 1;
                                        }
                                        None => {
                                            return Err(SelectorError::Unterminated {
                                                input: input.to_owned(),
                                            });
                                        }
                                    }
                                }
                            }
                            _ => value = read_ident(&mut i),
                        }
                        Some(value)
                    }
                    Some(&(at, found)) => return Err(unexpected(at, found)),
                    None => {
                        return Err(SelectorError::Unterminated {
                            input: input.to_owned(),
                        });
                    }
                };
                match chars.get(i) {
                    Some(&(_, ']')) => i += 1,
                    Some(&(at, found)) => return Err(unexpected(at, found)),
                    None => {
                        return Err(SelectorError::Unterminated {
                            input: input.to_owned(),
                        });
                    }
                }
                current.attributes.push((name, value));
            }
            c if is_ident_char(c) => {
                if current.tag.is_some() || !current.is_empty() {
                    return Err(unexpected(offset, ch));
                }
                current.tag = Some(read_ident(&mut i));
            }
            _ => return Err(unexpected(offset, ch)),
        }
    }
    if !current.is_empty() {
        compounds.push(current);
    }
    if compounds.is_empty() {
        // A bare `*` matches everything.
        compounds.push(Compound::default());
    }
    Ok(Complex { compounds })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    type Node = (
        &'static str,
        Vec<&'static str>,
        Vec<(&'static str, &'static str)>,
        Option<ElementId>,
    );

    struct Fixture {
        nodes: HashMap<ElementId, Node>,
    }

    impl Tree for Fixture {
        fn tag(&self, element: ElementId) -> Option<&str> {
            self.nodes.get(&element).map(|node| node.0)
        }

        fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
            self.nodes
                .get(&element)?
                .2
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
        }

        fn has_class(&self, element: ElementId, class: &str) -> bool {
            self.nodes
                .get(&element)
                .is_some_and(|node| node.1.iter().any(|candidate| *candidate == class))
        }

        fn parent(&self, element: ElementId) -> Option<ElementId> {
            self.nodes.get(&element).and_then(|node| node.3)
        }
    }

    fn fixture() -> Fixture {
        let body = ElementId::new(1);
        let nav = ElementId::new(2);
        let button = ElementId::new(3);
        let mut nodes = HashMap::new();
        nodes.insert(body, ("body", vec![], vec![], None));
        nodes.insert(nav, ("nav", vec!["top", "bar"], vec![("id", "menu")], Some(body)));
        nodes.insert(
            button,
            ("button", vec!["primary"], vec![("data-role", "go now")], Some(nav)),
        );
        Fixture { nodes }
    }

    fn hits(selector: &str, element: u64) -> bool {
        Selector::parse(selector)
            .expect("valid selector")
            .matches(&fixture(), ElementId::new(element))
    }

    #[test]
    fn simple_selectors() {
        assert!(hits("button", 3));
        assert!(hits("BUTTON", 3));
        assert!(hits(".primary", 3));
        assert!(hits("#menu", 2));
        assert!(hits("nav.top.bar", 2));
        assert!(!hits("nav.top.missing", 2));
        assert!(hits("*", 1));
    }

    #[test]
    fn attribute_selectors() {
        assert!(hits("[data-role]", 3));
        assert!(hits("[data-role=\"go now\"]", 3));
        assert!(!hits("[data-role=go]", 3));
        assert!(hits("[id=menu]", 2));
    }

    #[test]
    fn descendants_and_lists() {
        assert!(hits("nav button", 3));
        assert!(hits("body .primary", 3));
        assert!(!hits("button nav", 2));
        assert!(hits(".nothing, #menu", 2));
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse("[data-role"),
            Err(SelectorError::Unterminated { .. })
        ));
        assert!(matches!(
            Selector::parse("a > b"),
            Err(SelectorError::Unexpected { found: '>', .. })
        ));
        assert!(matches!(
            Selector::parse(".#"),
            Err(SelectorError::Unexpected { found: '.', .. })
        ));
    }
}
