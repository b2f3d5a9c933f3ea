//! Pen trace: a [`DrawingAgent`] that keeps what a physical pen would
//! have left on paper.
//!
//! Every run of moves made with the pen down becomes one [`TracedPath`]
//! carrying the width and color in effect when it started. Labels are
//! kept with their anchor position. Travel with the pen up leaves
//! nothing. The serializers in this crate render a finished trace.

use penline_pipeline::{Dimensions, DrawPoint, DrawSpeed, DrawingAgent, PenSettings};

/// One continuous pen-down path.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedPath {
    /// Points in drawing space, starting where the pen went down.
    pub points: Vec<DrawPoint>,
    /// Line width in drawing units.
    pub width: f64,
    /// Color name.
    pub color: String,
}

/// Text written by [`DrawingAgent::label`].
#[derive(Debug, Clone, PartialEq)]
pub struct TracedLabel {
    /// Anchor in drawing space.
    pub position: DrawPoint,
    /// Label text.
    pub text: String,
}

/// The drawing-space rectangle covered by a source image.
///
/// `left`/`top` are the drawing coordinates of the image's top-left
/// corner; `width`/`height` are its extent in drawing units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawingFrame {
    /// Drawing x of the left edge.
    pub left: f64,
    /// Drawing y of the top edge (y points up).
    pub top: f64,
    /// Extent along x.
    pub width: f64,
    /// Extent along y.
    pub height: f64,
}

impl DrawingFrame {
    /// Frame of an image mapped with the given scale.
    ///
    /// Uses the same integer center as the coordinate mapper, so the
    /// frame is off-center by half a pixel for odd sizes.
    #[must_use]
    pub fn for_image(dimensions: Dimensions, scale: f64) -> Self {
        let center_x = f64::from(dimensions.width / 2);
        let center_y = f64::from(dimensions.height / 2);
        Self {
            left: -center_x * scale,
            top: center_y * scale,
            width: f64::from(dimensions.width) * scale,
            height: f64::from(dimensions.height) * scale,
        }
    }
}

/// Agent that accumulates pen-down paths and labels.
#[derive(Debug, Clone)]
pub struct PenTrace {
    paths: Vec<TracedPath>,
    labels: Vec<TracedLabel>,
    current: Vec<DrawPoint>,
    position: DrawPoint,
    pen_down: bool,
    width: f64,
    color: String,
    speed: DrawSpeed,
}

impl Default for PenTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl PenTrace {
    /// Empty trace: pen up at the origin with default pen settings.
    #[must_use]
    pub fn new() -> Self {
        let pen = PenSettings::default();
        Self {
            paths: Vec::new(),
            labels: Vec::new(),
            current: Vec::new(),
            position: DrawPoint::new(0.0, 0.0),
            pen_down: false,
            width: pen.width,
            color: pen.color,
            speed: pen.speed,
        }
    }

    /// Finished paths, in drawing order. The path in progress, if any,
    /// is only included by [`into_parts`](Self::into_parts).
    #[must_use]
    pub fn paths(&self) -> &[TracedPath] {
        &self.paths
    }

    /// Consume the trace, closing any open path.
    #[must_use]
    pub fn into_parts(mut self) -> (Vec<TracedPath>, Vec<TracedLabel>) {
        self.flush();
        (self.paths, self.labels)
    }

    /// Labels, in the order they were written.
    #[must_use]
    pub fn labels(&self) -> &[TracedLabel] {
        &self.labels
    }

    /// Last speed requested by the emitter.
    #[must_use]
    pub const fn speed(&self) -> DrawSpeed {
        self.speed
    }

    /// Current pen position.
    #[must_use]
    pub const fn position(&self) -> DrawPoint {
        self.position
    }

    /// Close the path in progress. A path needs two points to be kept.
    fn flush(&mut self) {
        let points = std::mem::take(&mut self.current);
        if points.len() >= 2 {
            self.paths.push(TracedPath {
                points,
                width: self.width,
                color: self.color.clone(),
            });
        }
        if self.pen_down {
            self.current.push(self.position);
        }
    }
}

impl DrawingAgent for PenTrace {
    fn pen_up(&mut self) {
        self.pen_down = false;
        self.flush();
    }

    fn pen_down(&mut self) {
        if !self.pen_down {
            self.pen_down = true;
            self.current.clear();
            self.current.push(self.position);
        }
    }

    fn move_to(&mut self, to: DrawPoint) {
        self.position = to;
        if self.pen_down {
            self.current.push(to);
        }
    }

    fn set_pen_width(&mut self, width: f64) {
        self.flush();
        self.width = width;
    }

    fn set_pen_color(&mut self, color: &str) {
        self.flush();
        color.clone_into(&mut self.color);
    }

    fn set_speed(&mut self, speed: DrawSpeed) {
        self.speed = speed;
    }

    fn set_position(&mut self, to: DrawPoint) {
        self.flush();
        self.position = to;
        self.current.clear();
        if self.pen_down {
            self.current.push(to);
        }
    }

    fn label(&mut self, text: &str) {
        self.labels.push(TracedLabel {
            position: self.position,
            text: text.to_string(),
        });
    }

    fn clear(&mut self) {
        self.paths.clear();
        self.labels.clear();
        self.current.clear();
        if self.pen_down {
            self.current.push(self.position);
        }
    }
}
