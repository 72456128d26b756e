//! The rendering surface a drawing is inserted into.
//!
//! Insertion and measurement are two separate phases. A drawing handed to
//! [`Surface::insert`] is not queryable until the host has run a scheduling
//! turn ([`Surface::settle`]); work that needs geometry is queued with
//! [`Surface::on_ready`] and runs during that turn, never synchronously.

use serde::{Deserialize, Serialize};

use crate::svg::Drawing;

/// On-screen size of the surface's container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientRect {
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Layout state handed to ready continuations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Whether the inserted drawing has been laid out and can be measured.
    pub settled: bool,
    pub client: ClientRect,
}

/// Continuation run once the inserted drawing is laid out.
pub type ReadyCallback = Box<dyn FnOnce(&mut Drawing, &Layout)>;

/// Holds at most one drawing and the continuations waiting on its layout.
pub struct Surface {
    client: ClientRect,
    drawing: Option<Drawing>,
    settled: bool,
    ready: Vec<ReadyCallback>,
}

impl Surface {
    pub fn new(client: ClientRect) -> Self {
        Self {
            client,
            drawing: None,
            settled: false,
            ready: Vec::new(),
        }
    }

    /// Replace the displayed drawing.
    ///
    /// Continuations still queued for the previous drawing are dropped.
    pub fn insert(&mut self, drawing: Drawing) {
        if !self.ready.is_empty() {
            log::debug!("dropping {} continuations of the replaced drawing", self.ready.len());
            self.ready.clear();
        }
        self.drawing = Some(drawing);
        self.settled = false;
    }

    /// Queue `f` to run at the next scheduling turn.
    pub fn on_ready<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Drawing, &Layout) + 'static,
    {
        self.ready.push(Box::new(f));
    }

    /// Run one scheduling turn: mark layout settled and drain the queued
    /// continuations. Returns how many ran.
    pub fn settle(&mut self) -> usize {
        let Some(drawing) = self.drawing.as_mut() else {
            self.ready.clear();
            return 0;
        };
        self.settled = true;
        let layout = Layout {
            settled: true,
            client: self.client,
        };
        let pending = std::mem::take(&mut self.ready);
        let count = pending.len();
        for callback in pending {
            callback(drawing, &layout);
        }
        count
    }

    pub fn layout(&self) -> Layout {
        Layout {
            settled: self.settled,
            client: self.client,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn pending(&self) -> usize {
        self.ready.len()
    }

    pub fn client_rect(&self) -> ClientRect {
        self.client
    }

    pub fn set_client_rect(&mut self, client: ClientRect) {
        self.client = client;
    }

    pub fn drawing(&self) -> Option<&Drawing> {
        self.drawing.as_ref()
    }

    /// Serialized form of the displayed drawing.
    pub fn rendered_svg(&self) -> Option<String> {
        self.drawing.as_ref().map(Drawing::to_svg_string)
    }
}
