//! Per-element geometry queries.
//!
//! [`element_bbox`] answers what a browser's `getBBox()` would: the tight
//! geometric box of an element in its own user space, stroke excluded. The
//! element's own `transform` is not applied; descendants' transforms are.

use domus_core::geometry::{BBox, Point};
use thiserror::Error;

use crate::path_data::path_bounds;
use crate::svg::Element;
use crate::transform::Affine;

/// Text metrics used when estimating the advance box of `<text>`.
const DEFAULT_FONT_SIZE: f64 = 16.0;
const GLYPH_ADVANCE: f64 = 0.6;
const ASCENT: f64 = 0.8;

/// Why an element has no measurable geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("<{0}> has no geometry")]
    NotGraphical(String),

    #[error("<{0}> is not rendered")]
    NotRendered(String),

    #[error("<{tag}> has invalid {attribute}=\"{value}\"")]
    InvalidAttribute {
        tag: String,
        attribute: String,
        value: String,
    },

    #[error("invalid path data \"{0}\"")]
    InvalidPathData(String),

    #[error("invalid transform \"{0}\"")]
    InvalidTransform(String),

    #[error("drawing has not been laid out yet")]
    NotLaidOut,
}

/// Elements that hold definitions or metadata rather than drawn content.
pub fn is_non_visual(tag: &str) -> bool {
    matches!(
        tag,
        "defs"
            | "title"
            | "desc"
            | "metadata"
            | "style"
            | "script"
            | "linearGradient"
            | "radialGradient"
            | "clipPath"
            | "mask"
            | "marker"
            | "pattern"
            | "symbol"
            | "filter"
    )
}

fn is_container(tag: &str) -> bool {
    matches!(tag, "g" | "a" | "switch" | "svg")
}

fn length(el: &Element, attribute: &str, default: f64) -> Result<f64, GeometryError> {
    match el.attr(attribute) {
        Some(raw) => parse_length(el, attribute, raw),
        None => Ok(default),
    }
}

/// A unitless or `px` length; other units are rejected.
fn parse_length(el: &Element, attribute: &str, raw: &str) -> Result<f64, GeometryError> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    match number.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(GeometryError::InvalidAttribute {
            tag: el.local_name().to_string(),
            attribute: attribute.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn size(el: &Element, attribute: &str) -> Result<f64, GeometryError> {
    let v = length(el, attribute, 0.0)?;
    if v < 0.0 {
        return Err(GeometryError::InvalidAttribute {
            tag: el.local_name().to_string(),
            attribute: attribute.to_string(),
            value: el.attr(attribute).unwrap_or_default().to_string(),
        });
    }
    Ok(v)
}

fn points(el: &Element) -> Result<Vec<Point>, GeometryError> {
    let raw = el.attr("points").unwrap_or_default();
    let invalid = || GeometryError::InvalidAttribute {
        tag: el.local_name().to_string(),
        attribute: "points".to_string(),
        value: raw.to_string(),
    };
    let coords = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|_| invalid()))
        .collect::<Result<Vec<f64>, _>>()?;
    if coords.len() % 2 != 0 {
        return Err(invalid());
    }
    Ok(coords.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect())
}

/// The transform an element applies to itself and its content.
pub fn own_transform(el: &Element) -> Result<Affine, GeometryError> {
    match el.attr("transform") {
        Some(list) => Affine::parse(list),
        None => Ok(Affine::identity()),
    }
}

/// Box of `el` as seen from its parent: its bbox mapped through its transform.
pub fn extent_in_parent(el: &Element) -> Result<BBox, GeometryError> {
    let bbox = element_bbox(el)?;
    Ok(own_transform(el)?.map_bbox(&bbox))
}

/// Geometric bounding box of one element, `getBBox()` style.
pub fn element_bbox(el: &Element) -> Result<BBox, GeometryError> {
    let tag = el.local_name();
    if is_non_visual(tag) {
        return Err(GeometryError::NotGraphical(tag.to_string()));
    }
    if !el.is_displayed() {
        return Err(GeometryError::NotRendered(tag.to_string()));
    }

    match tag {
        t if is_container(t) => Ok(container_bbox(el)),
        "rect" | "image" | "use" | "foreignObject" => Ok(BBox::from_xywh(
            length(el, "x", 0.0)?,
            length(el, "y", 0.0)?,
            size(el, "width")?,
            size(el, "height")?,
        )),
        "circle" => {
            let r = size(el, "r")?;
            let cx = length(el, "cx", 0.0)?;
            let cy = length(el, "cy", 0.0)?;
            Ok(BBox::from_xywh(cx - r, cy - r, 2.0 * r, 2.0 * r))
        }
        "ellipse" => {
            let rx = size(el, "rx")?;
            let ry = size(el, "ry")?;
            let cx = length(el, "cx", 0.0)?;
            let cy = length(el, "cy", 0.0)?;
            Ok(BBox::from_xywh(cx - rx, cy - ry, 2.0 * rx, 2.0 * ry))
        }
        "line" => {
            let a = Point::new(length(el, "x1", 0.0)?, length(el, "y1", 0.0)?);
            let b = Point::new(length(el, "x2", 0.0)?, length(el, "y2", 0.0)?);
            Ok(BBox::from_points(&[a, b]).unwrap_or_else(BBox::empty))
        }
        "polyline" | "polygon" => Ok(BBox::from_points(&points(el)?).unwrap_or_else(BBox::empty)),
        "path" => Ok(path_bounds(el.attr("d").unwrap_or_default())?.unwrap_or_else(BBox::empty)),
        "text" => text_bbox(el),
        other => Err(GeometryError::NotGraphical(other.to_string())),
    }
}

/// Union of all measurable descendants; descendants that fail are left out.
fn container_bbox(el: &Element) -> BBox {
    el.element_children()
        .filter_map(|child| match extent_in_parent(child) {
            Ok(b) => Some(b),
            Err(e) => {
                log::trace!("skipping <{}> inside <{}>: {}", child.local_name(), el.local_name(), e);
                None
            }
        })
        .reduce(|acc, b| acc.union(&b))
        .unwrap_or_else(BBox::empty)
}

/// Estimated advance box; no font metrics are available outside a browser.
fn text_bbox(el: &Element) -> Result<BBox, GeometryError> {
    let x = length(el, "x", 0.0)?;
    let y = length(el, "y", 0.0)?;
    let font_size = match el.style_property("font-size") {
        Some(v) => parse_length(el, "font-size", &v)?,
        None => length(el, "font-size", DEFAULT_FONT_SIZE)?,
    };
    let chars = el.text_content().trim().chars().count() as f64;
    Ok(BBox::from_xywh(
        x,
        y - ASCENT * font_size,
        GLYPH_ADVANCE * font_size * chars,
        font_size,
    ))
}
