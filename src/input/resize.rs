//! Widget resize gestures
//!
//! Each edge of a widget in edit mode has a drag handle. Dragging a handle
//! produces discrete resize steps: once the finger has travelled more than one
//! grid cell (the threshold) past the last committed point along the handle's
//! axis, a step is taken and the committed point advances by exactly one
//! threshold. Any overshoot carries over into the next step.
//!
//! The threshold comes from a provider that is queried once per touch-down,
//! so changes to the grid (column count, frame size) apply from the next drag.

use serde::{Deserialize, Serialize};

use crate::widgets::{WidgetRecord, WidgetSize};

/// Handle being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left,
    Top,
    Right,
    Bottom,
}

impl Edge {
    /// LEFT and RIGHT resize horizontally
    pub fn is_horizontal(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }

    /// Span change for a positive drag along this edge's axis
    ///
    /// Dragging the left or top handle towards the origin grows the widget.
    pub fn span_sign(self) -> i32 {
        match self {
            Edge::Left | Edge::Top => -1,
            Edge::Right | Edge::Bottom => 1,
        }
    }
}

/// Screen position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    fn axis(&self, edge: Edge) -> f64 {
        if edge.is_horizontal() {
            self.x
        } else {
            self.y
        }
    }

    fn axis_mut(&mut self, edge: Edge) -> &mut f64 {
        if edge.is_horizontal() {
            &mut self.x
        } else {
            &mut self.y
        }
    }
}

/// Emitted by [`ResizeTranslator`]
#[derive(Debug, Clone, PartialEq)]
pub enum ResizeEvent {
    /// Sent on every move
    Resize {
        /// A step was committed on this move
        crossed_threshold: bool,
        /// +1 or -1 along the handle's axis (0 if the finger did not move on it).
        /// When a step was committed this is the step's direction.
        direction: i32,
        /// Distance moved along the axis since the previous move, in pixels
        amount: f64,
    },
    /// Finger lifted
    Ended,
}

/// State of one drag, from touch-down to touch-up
#[derive(Debug, Clone)]
pub struct ResizeGesture {
    pub edge: Edge,
    pub origin: Point,
    /// Position at the previous move
    pub previous: Point,
    /// Position at which the last step was committed
    pub tracked: Point,
    pub threshold_px: i32,
}

impl ResizeGesture {
    pub fn new(edge: Edge, origin: Point, threshold_px: i32) -> Self {
        Self {
            edge,
            origin,
            previous: origin,
            tracked: origin,
            // A zero threshold would commit zero-length steps forever
            threshold_px: threshold_px.max(1),
        }
    }

    /// Total axis distance since touch-down
    pub fn travelled(&self) -> f64 {
        self.previous.axis(self.edge) - self.origin.axis(self.edge)
    }

    fn motion(&mut self, pos: Point) -> ResizeEvent {
        let edge = self.edge;
        let threshold = self.threshold_px as f64;

        let moved = pos.axis(edge) - self.previous.axis(edge);
        self.previous = pos;

        let dist = pos.axis(edge) - self.tracked.axis(edge);
        if dist.abs() > threshold {
            let sign = dist.signum();
            *self.tracked.axis_mut(edge) += threshold * sign;
            tracing::trace!(?edge, dist, threshold, "Resize step");

            return ResizeEvent::Resize {
                crossed_threshold: true,
                direction: sign as i32,
                amount: moved.abs(),
            };
        }

        ResizeEvent::Resize {
            crossed_threshold: false,
            direction: sign_of(moved),
            amount: moved.abs(),
        }
    }
}

fn sign_of(v: f64) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Raw touch input for a resize handle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchInput {
    pub action: TouchAction,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchAction {
    Down,
    Move,
    Up,
    Cancel,
}

impl TouchInput {
    fn point(&self) -> Option<Point> {
        Some(Point::new(self.x?, self.y?))
    }
}

/// Turns touch input on one handle into [`ResizeEvent`]s
pub struct ResizeTranslator<F> {
    edge: Edge,
    threshold_provider: F,
    gesture: Option<ResizeGesture>,
}

impl<F> ResizeTranslator<F>
where
    F: FnMut(Edge) -> i32,
{
    pub fn new(edge: Edge, threshold_provider: F) -> Self {
        Self {
            edge,
            threshold_provider,
            gesture: None,
        }
    }

    pub fn edge(&self) -> Edge {
        self.edge
    }

    /// Current drag, if a finger is down
    pub fn gesture(&self) -> Option<&ResizeGesture> {
        self.gesture.as_ref()
    }

    /// Start a drag, refreshing the threshold
    pub fn touch_down(&mut self, pos: Point) {
        if !pos.is_finite() {
            return;
        }

        let threshold = (self.threshold_provider)(self.edge);
        tracing::debug!(edge = ?self.edge, threshold, "Resize drag started");
        self.gesture = Some(ResizeGesture::new(self.edge, pos, threshold));
    }

    /// Track a move; ignored without a preceding touch-down
    pub fn touch_motion(&mut self, pos: Point) -> Option<ResizeEvent> {
        if !pos.is_finite() {
            return None;
        }
        Some(self.gesture.as_mut()?.motion(pos))
    }

    /// Finish the drag
    pub fn touch_up(&mut self) -> Option<ResizeEvent> {
        let gesture = self.gesture.take()?;
        tracing::debug!(edge = ?self.edge, travelled = gesture.travelled(), "Resize drag ended");
        Some(ResizeEvent::Ended)
    }

    /// Drop the drag without reporting an end
    pub fn touch_cancel(&mut self) {
        self.gesture = None;
    }

    /// Dispatch raw input; events missing coordinates are ignored
    pub fn handle(&mut self, input: &TouchInput) -> Option<ResizeEvent> {
        match input.action {
            TouchAction::Down => {
                self.touch_down(input.point()?);
                None
            }
            TouchAction::Move => self.touch_motion(input.point()?),
            TouchAction::Up => self.touch_up(),
            TouchAction::Cancel => {
                self.touch_cancel();
                None
            }
        }
    }
}

/// Grow or shrink `size` by one step, keeping it inside the grid
pub fn apply_step(size: WidgetSize, edge: Edge, direction: i32, cols: i32, rows: i32) -> WidgetSize {
    let delta = direction.signum() * edge.span_sign();

    if edge.is_horizontal() {
        let width = (size.safe_width_span() + delta).min(cols.max(1));
        size.safe_copy(Some(width), None)
    } else {
        let height = (size.safe_height_span() + delta).min(rows.max(1));
        size.safe_copy(None, Some(height))
    }
}

/// Apply a resize event to a record; returns true if its size changed
pub fn apply_event(record: &mut WidgetRecord, edge: Edge, event: &ResizeEvent, cols: i32, rows: i32) -> bool {
    let ResizeEvent::Resize { crossed_threshold: true, direction, .. } = event else {
        return false;
    };

    let before = record.safe_size();
    let after = apply_step(before, edge, *direction, cols, rows);
    record.size = Some(after);
    after != before
}
