//! Integer geometry of a schematic sheet.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in schematic units. Serialised as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// `self` moved by `offset`, or `None` when a coordinate overflows.
    pub fn checked_add(self, offset: Point) -> Option<Point> {
        Some(Point::new(
            self.x.checked_add(offset.x)?,
            self.y.checked_add(offset.y)?,
        ))
    }
}

impl From<[i64; 2]> for Point {
    fn from([x, y]: [i64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(i64, i64)> for Point {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// How a segment lies on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Constant `x`, spanning `min..=max` in y.
    Vertical { x: i64, min: i64, max: i64 },
    /// Constant `y`, spanning `min..=max` in x.
    Horizontal { y: i64, min: i64, max: i64 },
    /// Both ends at the same point.
    Degenerate,
    Oblique,
}

/// A straight wire between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: impl Into<Point>, end: impl Into<Point>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        let (a, b) = (self.start, self.end);
        if a == b {
            Orientation::Degenerate
        } else if a.x == b.x {
            Orientation::Vertical {
                x: a.x,
                min: a.y.min(b.y),
                max: a.y.max(b.y),
            }
        } else if a.y == b.y {
            Orientation::Horizontal {
                y: a.y,
                min: a.x.min(b.x),
                max: a.x.max(b.x),
            }
        } else {
            Orientation::Oblique
        }
    }

    pub fn endpoints(&self) -> [Point; 2] {
        [self.start, self.end]
    }

    pub fn has_endpoint(&self, p: Point) -> bool {
        self.start == p || self.end == p
    }

    /// Whether `fragment` attaches to this segment.
    ///
    /// A horizontal fragment attaches to a vertical segment when one of its
    /// ends sits on the segment, bounds included; the same holds with the axes
    /// swapped. Any other pairing, degenerate or oblique segments included,
    /// never attaches.
    pub fn accepts(&self, fragment: &Segment) -> bool {
        match (self.orientation(), fragment.orientation()) {
            (Orientation::Vertical { x, min, max }, Orientation::Horizontal { .. }) => fragment
                .endpoints()
                .iter()
                .any(|p| p.x == x && (min..=max).contains(&p.y)),
            (Orientation::Horizontal { y, min, max }, Orientation::Vertical { .. }) => fragment
                .endpoints()
                .iter()
                .any(|p| p.y == y && (min..=max).contains(&p.x)),
            _ => false,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}
