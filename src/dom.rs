//! Query helpers over a parsed page.
//!
//! Extractors receive the document (or an element to scope to) explicitly,
//! so they can run against any HTML without a live browser.

use scraper::{ElementRef, Html, Selector};

use crate::error::StructuralViolation;

/// Something selectors can be run against: a whole document or the
/// descendants of one element.
pub trait QueryScope<'a>: Copy {
    fn query(self, selector: &Selector) -> Vec<ElementRef<'a>>;
}

impl<'a> QueryScope<'a> for &'a Html {
    fn query(self, selector: &Selector) -> Vec<ElementRef<'a>> {
        self.select(selector).collect()
    }
}

impl<'a> QueryScope<'a> for ElementRef<'a> {
    fn query(self, selector: &Selector) -> Vec<ElementRef<'a>> {
        self.select(selector).collect()
    }
}

/// How many elements a selector matched.
#[derive(Debug)]
pub enum Matches<'a> {
    Zero,
    One(ElementRef<'a>),
    Many(usize),
}

pub fn matches<'a>(scope: impl QueryScope<'a>, selector: &Selector) -> Matches<'a> {
    let mut found = scope.query(selector);
    match found.len() {
        0 => Matches::Zero,
        1 => Matches::One(found.remove(0)),
        n => Matches::Many(n),
    }
}

/// Text of an element with surrounding whitespace removed.
pub fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Untrimmed text of every match, concatenated in document order.
pub fn joined_text<'a>(scope: impl QueryScope<'a>, selector: &Selector) -> String {
    scope
        .query(selector)
        .into_iter()
        .flat_map(|element| element.text())
        .collect()
}

/// Trimmed text of the single element `selector` matches, `None` when it
/// matches nothing. Several matches are a structural violation built by
/// `too_many`.
pub fn optional_text<'a>(
    scope: impl QueryScope<'a>,
    selector: &Selector,
    too_many: impl FnOnce() -> StructuralViolation,
) -> Result<Option<String>, StructuralViolation> {
    match matches(scope, selector) {
        Matches::Zero => Ok(None),
        Matches::One(element) => Ok(Some(trimmed_text(element))),
        Matches::Many(_) => Err(too_many()),
    }
}

/// Element siblings of `element` in document order.
pub fn sibling_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    let id = element.id();
    element
        .parent()
        .into_iter()
        .flat_map(|parent| parent.children())
        .filter(move |node| node.id() != id)
        .filter_map(ElementRef::wrap)
}

pub fn parse_selector(css: &str) -> Result<Selector, StructuralViolation> {
    Selector::parse(css).map_err(|e| StructuralViolation::InvalidSelector(format!("{css}: {e}")))
}
