//! Web Mercator tile keys.
//!
//! A [`QuadKey`] names one tile of the hierarchical tiling scheme used by
//! slippy maps. The coordinator treats it as an opaque key; only stores and
//! this module know how tiles map onto coordinates.

use std::{f64::consts::PI, fmt, str::FromStr};

use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BoundingBox, MAX_LEVEL_OF_DETAIL};

/// Latitude limit of the Web Mercator projection.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Identifier of a single tile at a given level of detail.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use geostore_core::QuadKey;
///
/// # fn main() -> Result<(), geostore_core::QuadKeyError> {
/// let key = QuadKey::from_coordinate(Coord { x: 13.4, y: 52.5 }, 1)?;
/// assert_eq!(key.to_string(), "1");
/// assert_eq!("1".parse::<QuadKey>()?, key);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuadKey {
    level_of_detail: u8,
    tile_x: u32,
    tile_y: u32,
}

/// Errors raised when constructing or parsing a [`QuadKey`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuadKeyError {
    /// Level of detail outside `1..=MAX_LEVEL_OF_DETAIL`.
    #[error("level of detail {level} is not a valid tile level")]
    InvalidLevel {
        /// The offending level.
        level: u8,
    },
    /// Tile coordinates beyond the grid at that level.
    #[error("tile ({tile_x}, {tile_y}) does not exist at level {level}")]
    TileOutOfRange {
        /// Level of detail.
        level: u8,
        /// Column.
        tile_x: u32,
        /// Row.
        tile_y: u32,
    },
    /// A quadkey string contained something other than `0`-`3`.
    #[error("invalid quadkey digit {digit:?}")]
    InvalidDigit {
        /// The offending character.
        digit: char,
    },
}

impl QuadKey {
    /// Validates and constructs a [`QuadKey`].
    pub fn new(level_of_detail: u8, tile_x: u32, tile_y: u32) -> Result<Self, QuadKeyError> {
        let count = tile_count(level_of_detail)?;
        if tile_x >= count || tile_y >= count {
            return Err(QuadKeyError::TileOutOfRange {
                level: level_of_detail,
                tile_x,
                tile_y,
            });
        }
        Ok(Self {
            level_of_detail,
            tile_x,
            tile_y,
        })
    }

    /// The tile containing `coord` at `level_of_detail`.
    ///
    /// Latitudes beyond the projection limit clamp to the edge rows.
    pub fn from_coordinate(coord: Coord<f64>, level_of_detail: u8) -> Result<Self, QuadKeyError> {
        let count = tile_count(level_of_detail)?;
        Ok(Self {
            level_of_detail,
            tile_x: column(coord.x, count),
            tile_y: row(coord.y, count),
        })
    }

    /// Every tile at `level_of_detail` intersecting `bbox`, row by row.
    ///
    /// Tiles are produced lazily. An empty box covers no tiles.
    pub fn covering(
        bbox: &BoundingBox,
        level_of_detail: u8,
    ) -> Result<impl Iterator<Item = Self> + use<>, QuadKeyError> {
        let count = tile_count(level_of_detail)?;
        let corners = bbox.min().zip(bbox.max());
        Ok(corners.into_iter().flat_map(move |(min, max)| {
            let columns = column(min.x, count)..=column(max.x, count);
            // Rows grow southwards.
            let rows = row(max.y, count)..=row(min.y, count);
            rows.flat_map(move |tile_y| {
                columns.clone().map(move |tile_x| Self {
                    level_of_detail,
                    tile_x,
                    tile_y,
                })
            })
        }))
    }

    /// Level of detail of the tile.
    #[must_use]
    pub const fn level_of_detail(&self) -> u8 {
        self.level_of_detail
    }

    /// Tile column, counted eastwards from the antimeridian.
    #[must_use]
    pub const fn tile_x(&self) -> u32 {
        self.tile_x
    }

    /// Tile row, counted southwards from the northern projection limit.
    #[must_use]
    pub const fn tile_y(&self) -> u32 {
        self.tile_y
    }

    /// Geographic extent of the tile.
    ///
    /// The first and last rows reach the poles, since coordinates beyond the
    /// projection limit clamp into them.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let tiles = 1_u32 << self.level_of_detail;
        let count = f64::from(tiles);
        let west = f64::from(self.tile_x) / count * 360.0 - 180.0;
        let east = f64::from(self.tile_x + 1) / count * 360.0 - 180.0;
        let north = if self.tile_y == 0 {
            90.0
        } else {
            latitude_of_row(f64::from(self.tile_y), count)
        };
        let south = if self.tile_y + 1 == tiles {
            -90.0
        } else {
            latitude_of_row(f64::from(self.tile_y + 1), count)
        };
        BoundingBox::from_bounds(west, south, east, north)
    }
}

impl fmt::Display for QuadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in (0..self.level_of_detail).rev() {
            let mask = 1_u32 << bit;
            let mut digit = b'0';
            if self.tile_x & mask != 0 {
                digit += 1;
            }
            if self.tile_y & mask != 0 {
                digit += 2;
            }
            write!(f, "{}", char::from(digit))?;
        }
        Ok(())
    }
}

impl FromStr for QuadKey {
    type Err = QuadKeyError;

    fn from_str(digits: &str) -> Result<Self, Self::Err> {
        let level = u8::try_from(digits.chars().count())
            .map_err(|_| QuadKeyError::InvalidLevel { level: u8::MAX })?;
        tile_count(level)?;
        let (mut tile_x, mut tile_y) = (0_u32, 0_u32);
        for digit in digits.chars() {
            tile_x <<= 1;
            tile_y <<= 1;
            match digit {
                '0' => {}
                '1' => tile_x |= 1,
                '2' => tile_y |= 1,
                '3' => {
                    tile_x |= 1;
                    tile_y |= 1;
                }
                other => return Err(QuadKeyError::InvalidDigit { digit: other }),
            }
        }
        Self::new(level, tile_x, tile_y)
    }
}

fn tile_count(level_of_detail: u8) -> Result<u32, QuadKeyError> {
    if (1..=MAX_LEVEL_OF_DETAIL).contains(&level_of_detail) {
        Ok(1_u32 << level_of_detail)
    } else {
        Err(QuadKeyError::InvalidLevel {
            level: level_of_detail,
        })
    }
}

fn column(longitude: f64, count: u32) -> u32 {
    let longitude = longitude.clamp(-180.0, 180.0);
    clamp_tile((longitude + 180.0) / 360.0 * f64::from(count), count)
}

fn row(latitude: f64, count: u32) -> u32 {
    let sin_latitude = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians().sin();
    let projected = 0.5 - ((1.0 + sin_latitude) / (1.0 - sin_latitude)).ln() / (4.0 * PI);
    clamp_tile(projected * f64::from(count), count)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is floored and clamped to the tile grid first"
)]
fn clamp_tile(position: f64, count: u32) -> u32 {
    let last = count - 1;
    if position.is_nan() || position <= 0.0 {
        0
    } else if position >= f64::from(last) {
        last
    } else {
        position.floor() as u32
    }
}

fn latitude_of_row(row: f64, count: f64) -> f64 {
    (PI * (1.0 - 2.0 * row / count)).sinh().atan().to_degrees()
}
