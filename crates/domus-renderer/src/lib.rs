//! # Domus Renderer
//!
//! Displays the engine's SVG drawing. Parses the artifact into an owned
//! element tree, answers `getBBox`-style geometry queries on it, and fits the
//! drawing's viewBox to its content once the surface has laid it out.

pub mod svg;
pub mod transform;
pub mod path_data;
pub mod bbox;
pub mod presentation;
pub mod surface;
pub mod viewport;

pub use svg::{Drawing, Element, RenderError};
pub use bbox::GeometryError;
pub use presentation::Presentation;
pub use surface::{ClientRect, Layout, Surface};
pub use viewport::{FitResult, ViewBox, ViewportFitter};
