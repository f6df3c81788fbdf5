//! Grid geometry: coordinates, distances and neighbourhoods.

use serde::{Deserialize, Serialize};

/// Offsets of the 8 neighbours, orthogonal first.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// A coordinate on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance: `max(|dx|, |dy|)`.
    ///
    /// Used for attack ranges, aura, healing and cover radii.
    #[must_use]
    pub const fn chebyshev(self, other: Coord) -> u16 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }

    /// Manhattan distance: `|dx| + |dy|`.
    ///
    /// Used for sight and spotting radii.
    #[must_use]
    pub const fn manhattan(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x) as u32 + self.y.abs_diff(other.y) as u32
    }

    /// Offset this coordinate, returning `None` if either axis would go negative
    /// or overflow. Does not check the upper grid bounds.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<Coord> {
        let x = u16::try_from(i32::from(self.x) + dx).ok()?;
        let y = u16::try_from(i32::from(self.y) + dy).ok()?;
        Some(Coord::new(x, y))
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Dimensions of the battlefield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// Width in tiles.
    width: u16,
    /// Height in tiles.
    height: u16,
}

impl Grid {
    /// Create a grid. Returns `None` if either dimension is zero.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }

    /// Width of the grid in tiles.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height of the grid in tiles.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Check if a coordinate is within the grid bounds.
    #[must_use]
    pub const fn is_inside(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Offset a coordinate and keep it only if it lands inside the grid.
    #[must_use]
    pub fn step(&self, coord: Coord, dx: i32, dy: i32) -> Option<Coord> {
        coord.offset(dx, dy).filter(|c| self.is_inside(*c))
    }

    /// Get the in-bounds 8-directional neighbours of a coordinate.
    ///
    /// Returns a fixed-size array and count to avoid heap allocation.
    /// The array contains valid coordinates in indices 0..count.
    #[must_use]
    #[inline]
    pub fn neighbors(&self, coord: Coord) -> ([Coord; 8], u8) {
        let mut result = [Coord::new(0, 0); 8];
        let mut count = 0u8;

        for (dx, dy) in NEIGHBOR_OFFSETS {
            if let Some(next) = self.step(coord, dx, dy) {
                result[count as usize] = next;
                count += 1;
            }
        }

        (result, count)
    }

    /// Every in-bounds coordinate within Chebyshev `radius` of `center`,
    /// including the centre itself, in row-major order.
    /// Only tiles inside the grid are visited.
    pub fn square(&self, center: Coord, radius: u16) -> impl Iterator<Item = Coord> + '_ {
        let xs = center.x.saturating_sub(radius)
            ..=center.x.saturating_add(radius).min(self.width - 1);
        let ys = center.y.saturating_sub(radius)
            ..=center.y.saturating_add(radius).min(self.height - 1);
        ys.flat_map(move |y| xs.clone().map(move |x| Coord::new(x, y)))
    }

    /// Every in-bounds coordinate within Manhattan `radius` of `center`,
    /// including the centre itself.
    pub fn diamond(&self, center: Coord, radius: u16) -> impl Iterator<Item = Coord> + '_ {
        self.square(center, radius)
            .filter(move |c| c.manhattan(center) <= u32::from(radius))
    }

    /// Iterate over every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Coord::new(x, y)))
    }
}
