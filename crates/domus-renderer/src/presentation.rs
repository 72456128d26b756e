use serde::{Deserialize, Serialize};

use crate::svg::Element;

/// How a fitted drawing is scaled into its container.
///
/// Always applied together with a new `viewBox` so scaling and framing stay
/// consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Value for the `preserveAspectRatio` attribute.
    pub preserve_aspect_ratio: String,
    /// Share of the container's width and height the drawing occupies, in percent.
    pub size_percent: f64,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            preserve_aspect_ratio: "xMidYMid meet".to_string(),
            size_percent: 90.0,
        }
    }
}

impl Presentation {
    pub fn with_size_percent(mut self, percent: f64) -> Self {
        self.size_percent = percent;
        self
    }

    pub fn apply(&self, svg: &mut Element) {
        svg.set_attr("preserveAspectRatio", self.preserve_aspect_ratio.as_str());
        let size = format!("{}%", self.size_percent);
        svg.set_style_property("width", &size);
        svg.set_style_property("height", &size);
    }
}
