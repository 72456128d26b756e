use std::fmt;

use domus_core::geometry::BBox;
use serde::{Deserialize, Serialize};

use crate::bbox::{extent_in_parent, is_non_visual, GeometryError};
use crate::presentation::Presentation;
use crate::surface::Layout;
use crate::svg::{Drawing, Element};

/// Default margin around the drawn content, in user units.
pub const DEFAULT_PADDING: f64 = 8.0;
/// Smallest width or height a fitted viewBox may have.
pub const MIN_VIEWBOX_SIZE: f64 = 1.0;
/// Fallback viewBox size when the surface reports an empty rectangle.
pub const FALLBACK_WIDTH: f64 = 800.0;
pub const FALLBACK_HEIGHT: f64 = 600.0;

/// The rectangle of user space mapped onto the drawing's viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `extent` grown by `padding` on every side, never thinner than one unit.
    pub fn around(extent: &BBox, padding: f64) -> Self {
        Self {
            x: extent.x() - padding,
            y: extent.y() - padding,
            width: (extent.width() + padding * 2.0).max(MIN_VIEWBOX_SIZE),
            height: (extent.height() + padding * 2.0).max(MIN_VIEWBOX_SIZE),
        }
    }

    /// Parse a `viewBox` attribute value.
    pub fn parse(value: &str) -> Option<Self> {
        let nums = value
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>().ok())
            .collect::<Option<Vec<f64>>>()?;
        match nums.as_slice() {
            [x, y, w, h] => Some(Self::new(*x, *y, *w, *h)),
            _ => None,
        }
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

/// Which path the fitter took.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FitResult {
    /// The drawing is one top-level group; its box was used directly.
    Group(ViewBox),
    /// Union of the top-level children that could be measured.
    Children {
        view_box: ViewBox,
        measured: usize,
        skipped: usize,
    },
    /// Geometry could not be queried; the surface rectangle was used.
    Fallback(ViewBox),
    /// Nothing measurable; the drawing was left untouched.
    Abandoned,
}

impl FitResult {
    pub fn view_box(&self) -> Option<ViewBox> {
        match self {
            FitResult::Group(vb) | FitResult::Fallback(vb) => Some(*vb),
            FitResult::Children { view_box, .. } => Some(*view_box),
            FitResult::Abandoned => None,
        }
    }
}

enum Measurement {
    Group(BBox),
    Children {
        extent: Option<BBox>,
        measured: usize,
        skipped: usize,
    },
}

/// Computes a tight, padded viewBox for drawings of unknown structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportFitter {
    pub padding: f64,
    pub fallback_width: f64,
    pub fallback_height: f64,
    pub presentation: Presentation,
}

impl Default for ViewportFitter {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            fallback_width: FALLBACK_WIDTH,
            fallback_height: FALLBACK_HEIGHT,
            presentation: Presentation::default(),
        }
    }
}

impl ViewportFitter {
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Fit the drawing's viewBox to its content.
    ///
    /// Must only be called once the surface has laid the drawing out; an
    /// unsettled layout takes the fallback path.
    pub fn fit(&self, drawing: &mut Drawing, layout: &Layout) -> FitResult {
        let result = match self.measure(drawing.root(), layout) {
            Ok(Measurement::Group(extent)) => FitResult::Group(ViewBox::around(&extent, self.padding)),
            Ok(Measurement::Children {
                extent: Some(extent),
                measured,
                skipped,
            }) => FitResult::Children {
                view_box: ViewBox::around(&extent, self.padding),
                measured,
                skipped,
            },
            Ok(Measurement::Children {
                extent: None,
                skipped,
                ..
            }) => {
                log::debug!("no measurable content ({skipped} children skipped), viewBox left unchanged");
                return FitResult::Abandoned;
            }
            Err(e) => {
                log::debug!("geometry query failed ({e}), using surface rectangle");
                FitResult::Fallback(self.fallback_view_box(layout))
            }
        };

        if let Some(view_box) = result.view_box() {
            let root = drawing.root_mut();
            root.set_attr("viewBox", view_box.to_string());
            self.presentation.apply(root);
            log::info!("fitted drawing to viewBox \"{view_box}\"");
        }
        result
    }

    fn measure(&self, root: &Element, layout: &Layout) -> Result<Measurement, GeometryError> {
        if !layout.settled {
            return Err(GeometryError::NotLaidOut);
        }

        let content: Vec<&Element> = root
            .element_children()
            .filter(|child| child.local_name() != "defs")
            .collect();

        if let Some(group) = single_group(&content) {
            return extent_in_parent(group).map(Measurement::Group);
        }

        let (extent, measured, skipped) = content.iter().map(|child| (child, extent_in_parent(child))).fold(
            (None::<BBox>, 0usize, 0usize),
            |(extent, measured, skipped), (child, result)| match result {
                Ok(b) => (
                    Some(extent.map_or(b, |acc| acc.union(&b))),
                    measured + 1,
                    skipped,
                ),
                Err(e) => {
                    log::debug!("skipping top-level <{}>: {}", child.local_name(), e);
                    (extent, measured, skipped + 1)
                }
            },
        );
        Ok(Measurement::Children {
            extent,
            measured,
            skipped,
        })
    }

    fn fallback_view_box(&self, layout: &Layout) -> ViewBox {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        let width = if usable(layout.client.width) {
            layout.client.width
        } else {
            self.fallback_width
        };
        let height = if usable(layout.client.height) {
            layout.client.height
        } else {
            self.fallback_height
        };
        ViewBox::new(0.0, 0.0, width, height)
    }
}

/// The only graphical top-level child, if it is a group.
fn single_group<'a>(content: &[&'a Element]) -> Option<&'a Element> {
    let mut graphical = content.iter().filter(|el| !is_non_visual(el.local_name()));
    match (graphical.next(), graphical.next()) {
        (Some(el), None) if el.local_name() == "g" => Some(*el),
        _ => None,
    }
}
