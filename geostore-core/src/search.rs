//! Attribute predicates and result visitors.

use std::collections::HashSet;

use crate::Element;

/// Receives elements found by a search.
///
/// Any `FnMut(&Element)` closure is a visitor.
pub trait ElementVisitor {
    /// Called once per matching element.
    fn visit(&mut self, element: &Element);
}

impl<F> ElementVisitor for F
where
    F: FnMut(&Element),
{
    fn visit(&mut self, element: &Element) {
        self(element);
    }
}

/// Term predicate over element tags.
///
/// Terms are whitespace-separated words, matched case-insensitively against
/// the words of every tag value and against every tag key. An element matches
/// when it holds none of the `not` terms, all of the `and` terms and, when any
/// `or` terms are given, at least one of those.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use geostore_core::{Element, Tags, TermQuery};
///
/// let cafe = Element::point(
///     1,
///     Tags::from([("amenity".into(), "cafe".into()), ("name".into(), "Blue Door".into())]),
///     Coord { x: 0.0, y: 0.0 },
/// );
///
/// assert!(TermQuery::new("", "cafe", "door window").matches(&cafe));
/// assert!(!TermQuery::new("blue", "", "").matches(&cafe));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermQuery {
    not_terms: Vec<String>,
    and_terms: Vec<String>,
    or_terms: Vec<String>,
}

impl TermQuery {
    /// Build a query from three whitespace-separated term lists.
    #[must_use]
    pub fn new(not_terms: &str, and_terms: &str, or_terms: &str) -> Self {
        Self {
            not_terms: split_terms(not_terms),
            and_terms: split_terms(and_terms),
            or_terms: split_terms(or_terms),
        }
    }

    /// A query matching every element.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Whether `element` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        let words = element_terms(element);
        let holds = |term: &String| words.contains(term.as_str());
        !self.not_terms.iter().any(holds)
            && self.and_terms.iter().all(holds)
            && (self.or_terms.is_empty() || self.or_terms.iter().any(holds))
    }
}

fn split_terms(terms: &str) -> Vec<String> {
    terms.split_whitespace().map(str::to_lowercase).collect()
}

fn element_terms(element: &Element) -> HashSet<String> {
    element
        .tags
        .iter()
        .flat_map(|(key, value)| {
            std::iter::once(key.to_lowercase()).chain(value.split_whitespace().map(str::to_lowercase))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tags;
    use geo::Coord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn park() -> Element {
        Element::point(
            4,
            Tags::from([
                ("leisure".into(), "park".into()),
                ("name".into(), "Victoria Park".into()),
            ]),
            Coord { x: 0.0, y: 0.0 },
        )
    }

    #[rstest]
    #[case("", "", "", true)]
    #[case("", "park victoria", "", true)]
    #[case("", "park garden", "", false)]
    #[case("", "", "garden PARK", true)]
    #[case("", "", "garden lake", false)]
    #[case("victoria", "park", "", false)]
    #[case("", "leisure", "", true)]
    fn evaluates_term_lists(
        park: Element,
        #[case] not_terms: &str,
        #[case] and_terms: &str,
        #[case] or_terms: &str,
        #[case] expected: bool,
    ) {
        let query = TermQuery::new(not_terms, and_terms, or_terms);
        assert_eq!(query.matches(&park), expected);
    }

    #[rstest]
    fn closures_are_visitors(park: Element) {
        let mut seen = Vec::new();
        let mut visitor = |element: &Element| seen.push(element.id);
        let visitor: &mut dyn ElementVisitor = &mut visitor;
        visitor.visit(&park);
        assert_eq!(seen, vec![4]);
    }
}
