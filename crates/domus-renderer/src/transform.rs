//! SVG `transform` attribute parsing.

use domus_core::geometry::{BBox, Point};

use crate::bbox::GeometryError;

/// 2D affine matrix in SVG `matrix(a b c d e f)` order:
///
/// ```text
/// [a c e]
/// [b d f]
/// [0 0 1]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::identity()
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::identity()
        }
    }

    /// Rotation by `degrees` around the origin.
    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn skew_x(degrees: f64) -> Self {
        Self {
            c: degrees.to_radians().tan(),
            ..Self::identity()
        }
    }

    pub fn skew_y(degrees: f64) -> Self {
        Self {
            b: degrees.to_radians().tan(),
            ..Self::identity()
        }
    }

    /// `self × other`: `other` is applied first.
    pub fn then(&self, other: &Affine) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Bounding box of `bbox` after mapping all four corners.
    pub fn map_bbox(&self, bbox: &BBox) -> BBox {
        if self.is_identity() {
            return *bbox;
        }
        let corners = bbox.corners().map(|p| self.apply(p));
        BBox::from_points(&corners).unwrap_or(*bbox)
    }

    /// Parse a transform list such as `translate(10 20) rotate(45, 5, 5)`.
    pub fn parse(list: &str) -> Result<Self, GeometryError> {
        let invalid = || GeometryError::InvalidTransform(list.to_string());
        let mut result = Self::identity();
        let mut rest = list.trim();

        while !rest.is_empty() {
            let open = rest.find('(').ok_or_else(invalid)?;
            let close = rest.find(')').ok_or_else(invalid)?;
            if close < open {
                return Err(invalid());
            }
            let name = rest[..open].trim();
            let args = rest[open + 1..close]
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<f64>().map_err(|_| invalid()))
                .collect::<Result<Vec<f64>, _>>()?;

            let op = match (name, args.as_slice()) {
                ("matrix", [a, b, c, d, e, f]) => Self {
                    a: *a,
                    b: *b,
                    c: *c,
                    d: *d,
                    e: *e,
                    f: *f,
                },
                ("translate", [tx]) => Self::translate(*tx, 0.0),
                ("translate", [tx, ty]) => Self::translate(*tx, *ty),
                ("scale", [s]) => Self::scale(*s, *s),
                ("scale", [sx, sy]) => Self::scale(*sx, *sy),
                ("rotate", [deg]) => Self::rotate(*deg),
                ("rotate", [deg, cx, cy]) => Self::translate(*cx, *cy)
                    .then(&Self::rotate(*deg))
                    .then(&Self::translate(-cx, -cy)),
                ("skewX", [deg]) => Self::skew_x(*deg),
                ("skewY", [deg]) => Self::skew_y(*deg),
                _ => return Err(invalid()),
            };
            result = result.then(&op);

            rest = rest[close + 1..].trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        }
        Ok(result)
    }
}
