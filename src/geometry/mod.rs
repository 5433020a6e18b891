//! Geometry module - position/size math for layer gestures
//!
//! Everything here is pure: no store, no layer identity, no render target.
//! All coordinates are canvas-local pixels with the origin at the canvas
//! container's top-left corner.

use serde::{Deserialize, Serialize};

/// Offset of a layer's top-left corner inside the canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Shift this position by a delta
    pub fn offset(self, delta: Delta) -> Self {
        Self {
            x: self.x + delta.dx,
            y: self.y + delta.dy,
        }
    }
}

/// Layer dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp both dimensions into `limits`
    pub fn clamp(self, limits: &SizeLimits) -> Self {
        let mut width = self.width.max(limits.min.width);
        let mut height = self.height.max(limits.min.height);
        if let Some(max) = limits.max {
            width = width.min(max.width);
            height = height.min(max.height);
        }
        Self { width, height }
    }
}

/// Per-frame pointer movement
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Delta {
    pub dx: f64,
    pub dy: f64,
}

impl Delta {
    pub const ZERO: Delta = Delta { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

impl std::ops::Add for Delta {
    type Output = Delta;

    fn add(self, rhs: Delta) -> Delta {
        Delta {
            dx: self.dx + rhs.dx,
            dy: self.dy + rhs.dy,
        }
    }
}

impl std::ops::AddAssign for Delta {
    fn add_assign(&mut self, rhs: Delta) {
        self.dx += rhs.dx;
        self.dy += rhs.dy;
    }
}

/// Accumulated movement of the top/left edges during a resize frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeDelta {
    pub left: f64,
    pub top: f64,
}

/// Axis-aligned rectangle (used for the restriction boundary)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the canvas origin
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Whether a box at `position` with `size` lies entirely inside this rect
    pub fn contains_box(&self, position: Position, size: Size) -> bool {
        position.x >= self.x
            && position.y >= self.y
            && position.x + size.width <= self.x + self.width
            && position.y + size.height <= self.y + self.height
    }
}

/// Minimum and optional maximum layer size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeLimits {
    pub min: Size,
    pub max: Option<Size>,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            min: Size::new(50.0, 50.0),
            max: Some(Size::new(500.0, 500.0)),
        }
    }
}

/// When the drag restriction is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestrictPolicy {
    /// Never clamp
    None,
    /// Only the committed position at gesture end is clamped
    #[default]
    EndOnly,
    /// Every frame is clamped
    Always,
}

/// Which part of a gesture a frame belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Move,
    End,
}

/// Drag restriction: a boundary plus the policy deciding when it applies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Restriction {
    pub bounds: Rect,
    pub policy: RestrictPolicy,
}

impl Restriction {
    pub fn applies(&self, phase: GesturePhase) -> bool {
        match self.policy {
            RestrictPolicy::None => false,
            RestrictPolicy::EndOnly => phase == GesturePhase::End,
            RestrictPolicy::Always => true,
        }
    }
}

/// Clamp a box so it stays inside `bounds`.
///
/// A box larger than the bounds on an axis is pinned to the bounds' leading edge.
pub fn clamp_to_bounds(position: Position, size: Size, bounds: Rect) -> Position {
    fn clamp_axis(value: f64, extent: f64, start: f64, span: f64) -> f64 {
        let end = start + span - extent;
        if end < start {
            start
        } else {
            value.clamp(start, end)
        }
    }

    Position {
        x: clamp_axis(position.x, size.width, bounds.x, bounds.width),
        y: clamp_axis(position.y, size.height, bounds.y, bounds.height),
    }
}

/// Apply a drag delta to a position, clamping when the restriction applies to `phase`
pub fn translate(
    current: Position,
    size: Size,
    delta: Delta,
    restriction: &Restriction,
    phase: GesturePhase,
) -> Position {
    let moved = current.offset(delta);
    if restriction.applies(phase) {
        clamp_to_bounds(moved, size, restriction.bounds)
    } else {
        moved
    }
}

/// Result of one resize frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOutcome {
    pub size: Size,
    /// Position shift keeping the non-dragged edges anchored
    pub shift: Delta,
}

/// Clamp a candidate rect from an edge drag and compute the anchor shift.
///
/// The clamp is applied before the anchor math: an axis whose candidate was
/// clamped gets no shift.
pub fn resize(candidate: Size, edge: EdgeDelta, limits: &SizeLimits) -> ResizeOutcome {
    let size = candidate.clamp(limits);
    let shift = Delta {
        dx: if size.width == candidate.width { edge.left } else { 0.0 },
        dy: if size.height == candidate.height { edge.top } else { 0.0 },
    };
    ResizeOutcome { size, shift }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Restriction {
        Restriction {
            bounds: Rect::new(0.0, 0.0, 500.0, 500.0),
            policy: RestrictPolicy::EndOnly,
        }
    }

    #[test]
    fn test_translate_accumulates() {
        let size = Size::new(100.0, 100.0);
        let p = translate(
            Position::ORIGIN,
            size,
            Delta::new(10.0, -5.0),
            &canvas(),
            GesturePhase::Move,
        );
        assert_eq!(p, Position::new(10.0, -5.0));

        let p = translate(p, size, Delta::new(5.0, 5.0), &canvas(), GesturePhase::Move);
        assert_eq!(p, Position::new(15.0, 0.0));
    }

    #[test]
    fn test_end_only_clamps_at_end() {
        let size = Size::new(100.0, 100.0);
        let start = Position::new(450.0, 10.0);
        let delta = Delta::new(30.0, -20.0);

        let moving = translate(start, size, delta, &canvas(), GesturePhase::Move);
        assert_eq!(moving, Position::new(480.0, -10.0));

        let ended = translate(start, size, delta, &canvas(), GesturePhase::End);
        assert_eq!(ended, Position::new(400.0, 0.0));
        assert!(canvas().bounds.contains_box(ended, size));
    }

    #[test]
    fn test_policy_none_never_clamps() {
        let restriction = Restriction {
            policy: RestrictPolicy::None,
            ..canvas()
        };
        let p = translate(
            Position::ORIGIN,
            Size::new(10.0, 10.0),
            Delta::new(-40.0, 900.0),
            &restriction,
            GesturePhase::End,
        );
        assert_eq!(p, Position::new(-40.0, 900.0));
    }

    #[test]
    fn test_oversized_box_pins_to_leading_edge() {
        let p = clamp_to_bounds(
            Position::new(-30.0, 20.0),
            Size::new(600.0, 50.0),
            Rect::new(0.0, 0.0, 500.0, 500.0),
        );
        assert_eq!(p, Position::new(0.0, 20.0));
    }

    #[test]
    fn test_resize_clamps_to_minimum_without_shift() {
        let outcome = resize(
            Size::new(40.0, 40.0),
            EdgeDelta::default(),
            &SizeLimits::default(),
        );
        assert_eq!(outcome.size, Size::new(50.0, 50.0));
        assert_eq!(outcome.shift, Delta::ZERO);
    }

    #[test]
    fn test_resize_clamped_axis_ignores_edge_delta() {
        let outcome = resize(
            Size::new(20.0, 120.0),
            EdgeDelta {
                left: 30.0,
                top: -10.0,
            },
            &SizeLimits::default(),
        );
        assert_eq!(outcome.size, Size::new(50.0, 120.0));
        assert_eq!(outcome.shift, Delta::new(0.0, -10.0));
    }

    #[test]
    fn test_resize_respects_optional_max() {
        let capped = resize(
            Size::new(900.0, 80.0),
            EdgeDelta::default(),
            &SizeLimits::default(),
        );
        assert_eq!(capped.size, Size::new(500.0, 80.0));

        let unbounded = SizeLimits {
            max: None,
            ..SizeLimits::default()
        };
        let free = resize(Size::new(900.0, 80.0), EdgeDelta::default(), &unbounded);
        assert_eq!(free.size, Size::new(900.0, 80.0));
    }
}
