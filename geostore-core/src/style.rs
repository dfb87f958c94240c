//! Element retention rules consulted by stores.
//!
//! The coordinator passes a [`StyleProvider`] through to stores without
//! inspecting it. Stores ask it, level by level, whether an element should be
//! kept.

use std::collections::HashSet;

use crate::{Element, LodRange};

/// Decides whether an element is styled, and therefore kept, at a level.
pub trait StyleProvider {
    /// Whether `element` has a style at `level_of_detail`.
    fn has_style(&self, element: &Element, level_of_detail: u8) -> bool;
}

/// Keeps every element at every level.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllStyle;

impl StyleProvider for AcceptAllStyle {
    fn has_style(&self, _element: &Element, _level_of_detail: u8) -> bool {
        true
    }
}

/// Keeps elements carrying at least one of the configured tag keys, within an
/// optional level range.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use geostore_core::{Element, StyleProvider, Tags, style::TagKeyStyle};
///
/// let style = TagKeyStyle::new(["highway", "building"]);
/// let road = Element::point(1, Tags::from([("highway".into(), "stop".into())]), Coord { x: 0.0, y: 0.0 });
/// let bench = Element::point(2, Tags::from([("amenity".into(), "bench".into())]), Coord { x: 0.0, y: 0.0 });
///
/// assert!(style.has_style(&road, 12));
/// assert!(!style.has_style(&bench, 12));
/// ```
#[derive(Debug, Default, Clone)]
pub struct TagKeyStyle {
    keys: HashSet<String>,
    levels: Option<LodRange>,
}

impl TagKeyStyle {
    /// Keep elements carrying any of `keys`.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            levels: None,
        }
    }

    /// Restrict the style to `levels`.
    #[must_use]
    pub fn within(mut self, levels: LodRange) -> Self {
        self.levels = Some(levels);
        self
    }
}

impl StyleProvider for TagKeyStyle {
    fn has_style(&self, element: &Element, level_of_detail: u8) -> bool {
        self.levels
            .is_none_or(|levels| levels.contains(level_of_detail))
            && element.tags.keys().any(|key| self.keys.contains(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tags;
    use geo::Coord;
    use rstest::rstest;

    fn shop() -> Element {
        Element::point(
            1,
            Tags::from([("shop".into(), "bakery".into())]),
            Coord { x: 0.0, y: 0.0 },
        )
    }

    #[rstest]
    #[case(9, false)]
    #[case(10, true)]
    #[case(14, true)]
    #[case(15, false)]
    fn level_window_limits_tag_style(#[case] level: u8, #[case] expected: bool) {
        let levels = LodRange::new(10, 14).expect("valid range");
        let style = TagKeyStyle::new(["shop"]).within(levels);
        assert_eq!(style.has_style(&shop(), level), expected);
    }

    #[rstest]
    fn accept_all_keeps_everything() {
        assert!(AcceptAllStyle.has_style(&shop(), 1));
    }
}
