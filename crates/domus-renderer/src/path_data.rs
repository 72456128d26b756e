//! Bounds of SVG path data (`d` attribute).
//!
//! Extents are exact, the way `getBBox()` reports them: curves contribute
//! their end points plus the extrema where the derivative vanishes, and arcs
//! are converted to centre form to find the extremes inside the swept angle.

use std::f64::consts::{PI, TAU};

use domus_core::geometry::{BBox, Point};

use crate::bbox::GeometryError;

struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

enum Token {
    Command(char),
    Number(f64),
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn skip_separators(&mut self) {
        let rest = &self.src[self.pos..];
        let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        self.pos += rest.len() - trimmed.len();
    }

    fn peek_is_number(&mut self) -> bool {
        self.skip_separators();
        self.src[self.pos..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
    }

    fn number(&mut self) -> Option<f64> {
        self.skip_separators();
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let mut end = start;
        if end < bytes.len() && matches!(bytes[end], b'-' | b'+') {
            end += 1;
        }
        let mut seen_dot = false;
        let mut seen_exp = false;
        while end < bytes.len() {
            match bytes[end] {
                b'0'..=b'9' => end += 1,
                b'.' if !seen_dot && !seen_exp => {
                    seen_dot = true;
                    end += 1;
                }
                b'e' | b'E' if !seen_exp && end > start => {
                    seen_exp = true;
                    end += 1;
                    if end < bytes.len() && matches!(bytes[end], b'-' | b'+') {
                        end += 1;
                    }
                }
                _ => break,
            }
        }
        let value = self.src[start..end].parse::<f64>().ok()?;
        self.pos = end;
        Some(value)
    }

    fn next_token(&mut self) -> Option<Result<Token, ()>> {
        self.skip_separators();
        let c = self.src[self.pos..].chars().next()?;
        if c.is_ascii_alphabetic() {
            self.pos += c.len_utf8();
            return Some(Ok(Token::Command(c)));
        }
        Some(self.number().map(Token::Number).ok_or(()))
    }
}

/// Compute the bounds of a path's geometry.
///
/// Returns `Ok(None)` for empty path data.
pub fn path_bounds(d: &str) -> Result<Option<BBox>, GeometryError> {
    let invalid = || GeometryError::InvalidPathData(d.to_string());
    let mut tokens = Tokens::new(d);
    let mut points: Vec<Point> = Vec::new();
    let mut current = Point::new(0.0, 0.0);
    let mut subpath_start = current;
    // Last control point of the previous segment, for S and T reflection.
    let mut last_cubic: Option<Point> = None;
    let mut last_quad: Option<Point> = None;

    while let Some(token) = tokens.next_token() {
        let cmd = match token.map_err(|_| invalid())? {
            Token::Command(c) => c,
            // Path data must start with a command.
            Token::Number(_) => return Err(invalid()),
        };
        let relative = cmd.is_ascii_lowercase();
        let arity = match cmd.to_ascii_uppercase() {
            'M' | 'L' | 'T' => 2,
            'H' | 'V' => 1,
            'C' => 6,
            'S' | 'Q' => 4,
            'A' => 7,
            'Z' => 0,
            _ => return Err(invalid()),
        };

        if arity == 0 {
            current = subpath_start;
            last_cubic = None;
            last_quad = None;
            continue;
        }

        let mut first = true;
        loop {
            if !first && !tokens.peek_is_number() {
                break;
            }
            let mut args = [0.0; 7];
            for slot in args.iter_mut().take(arity) {
                *slot = tokens.number().ok_or_else(invalid)?;
            }
            let start = current;
            let base = if relative { current } else { Point::new(0.0, 0.0) };
            let pt = |x: f64, y: f64| Point::new(base.x + x, base.y + y);
            let mut cubic_ctrl = None;
            let mut quad_ctrl = None;

            match cmd.to_ascii_uppercase() {
                'M' | 'L' => {
                    current = pt(args[0], args[1]);
                    if cmd.eq_ignore_ascii_case(&'M') && first {
                        subpath_start = current;
                    }
                }
                'H' => {
                    current = Point::new(if relative { current.x + args[0] } else { args[0] }, current.y);
                }
                'V' => {
                    current = Point::new(current.x, if relative { current.y + args[0] } else { args[0] });
                }
                'C' => {
                    let (c1, c2) = (pt(args[0], args[1]), pt(args[2], args[3]));
                    current = pt(args[4], args[5]);
                    cubic_extrema([start, c1, c2, current], &mut points);
                    cubic_ctrl = Some(c2);
                }
                'S' => {
                    let c1 = reflect(last_cubic, start);
                    let c2 = pt(args[0], args[1]);
                    current = pt(args[2], args[3]);
                    cubic_extrema([start, c1, c2, current], &mut points);
                    cubic_ctrl = Some(c2);
                }
                'Q' => {
                    let c = pt(args[0], args[1]);
                    current = pt(args[2], args[3]);
                    quad_extrema([start, c, current], &mut points);
                    quad_ctrl = Some(c);
                }
                'T' => {
                    let c = reflect(last_quad, start);
                    current = pt(args[0], args[1]);
                    quad_extrema([start, c, current], &mut points);
                    quad_ctrl = Some(c);
                }
                'A' => {
                    current = pt(args[5], args[6]);
                    let arc = Arc {
                        rx: args[0],
                        ry: args[1],
                        rotation: args[2],
                        large_arc: args[3] != 0.0,
                        sweep: args[4] != 0.0,
                    };
                    arc.extrema(start, current, &mut points);
                }
                _ => return Err(invalid()),
            }
            last_cubic = cubic_ctrl;
            last_quad = quad_ctrl;
            points.push(current);
            first = false;
        }
    }

    Ok(BBox::from_points(&points))
}

/// Reflection of the previous segment's control point about `current`; just
/// `current` when the previous segment was of another kind.
fn reflect(control: Option<Point>, current: Point) -> Point {
    match control {
        Some(c) => Point::new(2.0 * current.x - c.x, 2.0 * current.y - c.y),
        None => current,
    }
}

/// Parameters in (0, 1) where a quadratic's derivative is zero on one axis.
fn quad_roots(p0: f64, p1: f64, p2: f64) -> Option<f64> {
    let denom = p0 - 2.0 * p1 + p2;
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let t = (p0 - p1) / denom;
    (t > 0.0 && t < 1.0).then_some(t)
}

fn quad_extrema([p0, p1, p2]: [Point; 3], out: &mut Vec<Point>) {
    let at = |t: f64| {
        let u = 1.0 - t;
        Point::new(
            u * u * p0.x + 2.0 * u * t * p1.x + t * t * p2.x,
            u * u * p0.y + 2.0 * u * t * p1.y + t * t * p2.y,
        )
    };
    out.extend(quad_roots(p0.x, p1.x, p2.x).map(at));
    out.extend(quad_roots(p0.y, p1.y, p2.y).map(at));
}

/// Parameters in (0, 1) where a cubic's derivative is zero on one axis.
fn cubic_roots(p0: f64, p1: f64, p2: f64, p3: f64) -> Vec<f64> {
    let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
    let b = 2.0 * (p0 - 2.0 * p1 + p2);
    let c = p1 - p0;
    let roots = if a.abs() < f64::EPSILON {
        if b.abs() < f64::EPSILON {
            vec![]
        } else {
            vec![-c / b]
        }
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            vec![]
        } else {
            let sq = disc.sqrt();
            vec![(-b + sq) / (2.0 * a), (-b - sq) / (2.0 * a)]
        }
    };
    roots.into_iter().filter(|t| *t > 0.0 && *t < 1.0).collect()
}

fn cubic_extrema([p0, p1, p2, p3]: [Point; 4], out: &mut Vec<Point>) {
    let at = |t: f64| {
        let u = 1.0 - t;
        let (w0, w1, w2, w3) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        Point::new(
            w0 * p0.x + w1 * p1.x + w2 * p2.x + w3 * p3.x,
            w0 * p0.y + w1 * p1.y + w2 * p2.y + w3 * p3.y,
        )
    };
    out.extend(cubic_roots(p0.x, p1.x, p2.x, p3.x).into_iter().map(at));
    out.extend(cubic_roots(p0.y, p1.y, p2.y, p3.y).into_iter().map(at));
}

/// Endpoint-parameterized elliptical arc, as written in path data.
struct Arc {
    rx: f64,
    ry: f64,
    /// x-axis rotation, in degrees.
    rotation: f64,
    large_arc: bool,
    sweep: bool,
}

impl Arc {
    /// Push the points where the arc between `from` and `to` reaches an
    /// extreme x or y. Degenerate arcs are straight lines and add nothing.
    fn extrema(&self, from: Point, to: Point, out: &mut Vec<Point>) {
        let (mut rx, mut ry) = (self.rx.abs(), self.ry.abs());
        if rx == 0.0 || ry == 0.0 || from == to {
            return;
        }
        let phi = self.rotation.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();

        // Centre conversion, SVG implementation notes F.6.5.
        let dx = (from.x - to.x) / 2.0;
        let dy = (from.y - to.y) / 2.0;
        let x1 = cos_phi * dx + sin_phi * dy;
        let y1 = -sin_phi * dx + cos_phi * dy;

        let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
        if lambda > 1.0 {
            rx *= lambda.sqrt();
            ry *= lambda.sqrt();
        }
        let num = rx * rx * ry * ry - rx * rx * y1 * y1 - ry * ry * x1 * x1;
        let den = rx * rx * y1 * y1 + ry * ry * x1 * x1;
        let sign = if self.large_arc == self.sweep { -1.0 } else { 1.0 };
        let coef = sign * (num / den).max(0.0).sqrt();
        let cx1 = coef * rx * y1 / ry;
        let cy1 = -coef * ry * x1 / rx;
        let cx = cos_phi * cx1 - sin_phi * cy1 + (from.x + to.x) / 2.0;
        let cy = sin_phi * cx1 + cos_phi * cy1 + (from.y + to.y) / 2.0;

        let angle = |ux: f64, uy: f64, vx: f64, vy: f64| (ux * vy - uy * vx).atan2(ux * vx + uy * vy);
        let ux = (x1 - cx1) / rx;
        let uy = (y1 - cy1) / ry;
        let vx = (-x1 - cx1) / rx;
        let vy = (-y1 - cy1) / ry;
        let theta1 = angle(1.0, 0.0, ux, uy);
        let mut delta = angle(ux, uy, vx, vy);
        if !self.sweep && delta > 0.0 {
            delta -= TAU;
        } else if self.sweep && delta < 0.0 {
            delta += TAU;
        }

        let on_arc = |theta: f64| {
            let offset = if delta >= 0.0 { theta - theta1 } else { theta1 - theta };
            offset.rem_euclid(TAU) <= delta.abs()
        };
        let point_at = |theta: f64| {
            let (sin_t, cos_t) = theta.sin_cos();
            Point::new(
                cx + rx * cos_t * cos_phi - ry * sin_t * sin_phi,
                cy + rx * cos_t * sin_phi + ry * sin_t * cos_phi,
            )
        };

        let theta_x = (-ry * sin_phi).atan2(rx * cos_phi);
        let theta_y = (ry * cos_phi).atan2(rx * sin_phi);
        for theta in [theta_x, theta_x + PI, theta_y, theta_y + PI] {
            if on_arc(theta) {
                out.push(point_at(theta));
            }
        }
    }
}
