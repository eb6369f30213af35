use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Offsets of the four cardinal neighbours, in the order they are yielded.
const CARDINAL_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Offsets of the four diagonal neighbours.
const DIAGONAL_OFFSETS: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Integer grid coordinate of a single map cell.
///
/// Points order by `y` then `x` so that sorted enumeration walks the grid in
/// row-major order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct Point {
    pub y: i32,
    pub x: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }

    /// Returns the point shifted by `(dx, dy)`, or `None` if either axis
    /// would leave the `i32` range.
    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Option<Point> {
        Some(Point::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// Returns up to 4 cardinal neighbours and the count of valid entries.
    /// Use `&result[..count]` to iterate over valid neighbours.
    pub fn neighbors4(self) -> ([Point; 4], usize) {
        let mut result = [Point::default(); 4];
        let mut count = 0;
        for (dx, dy) in CARDINAL_OFFSETS {
            if let Some(p) = self.offset(dx, dy) {
                result[count] = p;
                count += 1;
            }
        }
        (result, count)
    }

    /// Returns up to 8 neighbours (cardinal first, then diagonal) and the
    /// count of valid entries.
    pub fn neighbors8(self) -> ([Point; 8], usize) {
        let mut result = [Point::default(); 8];
        let mut count = 0;
        for (dx, dy) in CARDINAL_OFFSETS.into_iter().chain(DIAGONAL_OFFSETS) {
            if let Some(p) = self.offset(dx, dy) {
                result[count] = p;
                count += 1;
            }
        }
        (result, count)
    }

    /// Manhattan distance between two points.
    pub fn manhattan(self, other: Point) -> u64 {
        u64::from(self.x.abs_diff(other.x)) + u64::from(self.y.abs_diff(other.y))
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
