use serde::{Deserialize, Serialize};

/// A 2D point in drawing user units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned bounding box, as reported by element geometry queries.
///
/// Stored as two corners; the `x`/`y`/`width`/`height` accessors give the
/// `getBBox()` view of the same box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Point::new(x, y), Point::new(x + width, y + height))
    }

    /// The zero-sized box at the origin, reported by containers with nothing
    /// measurable inside.
    pub fn empty() -> Self {
        Self::from_xywh(0.0, 0.0, 0.0, 0.0)
    }

    /// Smallest box enclosing every point, or `None` for no points.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let single = Self::new(*first, *first);
        Some(rest.iter().fold(single, |acc, p| acc.union(&Self::new(*p, *p))))
    }

    pub fn x(&self) -> f64 {
        self.min.x
    }

    pub fn y(&self) -> f64 {
        self.min.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// The four corners, counter-clockwise from `min`. Transformed boxes are
    /// re-bounded from these.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ]
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self::new(
            Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }
}
