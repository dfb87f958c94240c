//! Level-of-detail ranges.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deepest level of detail supported by the tiling scheme.
pub const MAX_LEVEL_OF_DETAIL: u8 = 19;

/// Inclusive range of levels of detail an element or query applies to.
///
/// # Examples
/// ```
/// use geostore_core::LodRange;
///
/// # fn main() -> Result<(), geostore_core::LodRangeError> {
/// let range = LodRange::new(1, 3)?;
/// assert_eq!(range.levels().collect::<Vec<_>>(), vec![1, 2, 3]);
/// assert!(range.contains(2));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LodRange {
    start: u8,
    end: u8,
}

/// Errors returned by [`LodRange::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LodRangeError {
    /// The range was reversed.
    #[error("level of detail range start {start} exceeds end {end}")]
    Reversed {
        /// Requested first level.
        start: u8,
        /// Requested last level.
        end: u8,
    },
    /// A bound was outside `1..=MAX_LEVEL_OF_DETAIL`.
    #[error("level of detail {level} is outside 1..={max}", max = MAX_LEVEL_OF_DETAIL)]
    OutOfBounds {
        /// The offending level.
        level: u8,
    },
}

impl LodRange {
    /// Validates and constructs a [`LodRange`].
    pub fn new(start: u8, end: u8) -> Result<Self, LodRangeError> {
        for level in [start, end] {
            if !(1..=MAX_LEVEL_OF_DETAIL).contains(&level) {
                return Err(LodRangeError::OutOfBounds { level });
            }
        }
        if start > end {
            return Err(LodRangeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single level.
    pub fn single(level: u8) -> Result<Self, LodRangeError> {
        Self::new(level, level)
    }

    /// First level in the range.
    #[must_use]
    pub const fn start(&self) -> u8 {
        self.start
    }

    /// Last level in the range.
    #[must_use]
    pub const fn end(&self) -> u8 {
        self.end
    }

    /// Whether `level` falls within the range.
    #[must_use]
    pub const fn contains(&self, level: u8) -> bool {
        self.start <= level && level <= self.end
    }

    /// Iterate over every level in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = u8> + use<> {
        self.start..=self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1)]
    #[case(1, MAX_LEVEL_OF_DETAIL)]
    #[case(12, 16)]
    fn accepts_valid_ranges(#[case] start: u8, #[case] end: u8) {
        let range = LodRange::new(start, end).expect("range should be valid");
        assert_eq!((range.start(), range.end()), (start, end));
    }

    #[rstest]
    #[case(0, 3, LodRangeError::OutOfBounds { level: 0 })]
    #[case(1, 20, LodRangeError::OutOfBounds { level: 20 })]
    #[case(5, 4, LodRangeError::Reversed { start: 5, end: 4 })]
    fn rejects_invalid_ranges(#[case] start: u8, #[case] end: u8, #[case] expected: LodRangeError) {
        assert_eq!(LodRange::new(start, end), Err(expected));
    }

    #[rstest]
    fn contains_is_inclusive() {
        let range = LodRange::new(3, 5).expect("valid range");
        assert!(!range.contains(2));
        assert!(range.contains(3));
        assert!(range.contains(5));
        assert!(!range.contains(6));
    }
}
