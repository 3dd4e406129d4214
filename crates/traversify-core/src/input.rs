//! Pointer events and drag tracking.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Default minimum pointer travel, in display units, for a move to count.
pub const DEFAULT_MIN_DRAG_DISTANCE: f64 = 2.0;

/// Where a pointer event sits in a press-drag-release gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerPhase {
    Begin,
    Move,
    End,
}

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub position: Point,
    pub phase: PointerPhase,
}

impl PointerEvent {
    pub fn begin(position: Point) -> Self {
        Self {
            position,
            phase: PointerPhase::Begin,
        }
    }

    pub fn moved(position: Point) -> Self {
        Self {
            position,
            phase: PointerPhase::Move,
        }
    }

    pub fn end(position: Point) -> Self {
        Self {
            position,
            phase: PointerPhase::End,
        }
    }
}

/// A pointer event that survived drag filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStep {
    pub phase: PointerPhase,
    pub position: Point,
    /// Movement since the previously accepted position; zero on `Begin`.
    pub delta: Vec2,
}

/// Tracks an in-progress drag and drops jitter.
///
/// Moves closer than `min_distance` to the last accepted position are
/// swallowed; their travel is carried into the next accepted move because the
/// delta is always measured from the last accepted point.
#[derive(Debug, Clone)]
pub struct DragTracker {
    pub min_distance: f64,
    /// Start position of the current drag.
    pub drag_start: Option<Point>,
    last_accepted: Option<Point>,
}

impl Default for DragTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DRAG_DISTANCE)
    }
}

impl DragTracker {
    pub fn new(min_distance: f64) -> Self {
        Self {
            min_distance,
            drag_start: None,
            last_accepted: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    pub fn last_accepted(&self) -> Option<Point> {
        self.last_accepted
    }

    /// Feed an event; returns it back if it should be acted on.
    ///
    /// Moves and releases without a preceding press are dropped.
    pub fn handle(&mut self, event: PointerEvent) -> Option<DragStep> {
        match event.phase {
            PointerPhase::Begin => {
                self.drag_start = Some(event.position);
                self.last_accepted = Some(event.position);
                Some(DragStep {
                    phase: PointerPhase::Begin,
                    position: event.position,
                    delta: Vec2::ZERO,
                })
            }
            PointerPhase::Move => {
                let last = self.last_accepted?;
                if last.distance(event.position) < self.min_distance {
                    return None;
                }
                self.last_accepted = Some(event.position);
                Some(DragStep {
                    phase: PointerPhase::Move,
                    position: event.position,
                    delta: event.position - last,
                })
            }
            PointerPhase::End => {
                let last = self.last_accepted?;
                self.cancel();
                Some(DragStep {
                    phase: PointerPhase::End,
                    position: event.position,
                    delta: event.position - last,
                })
            }
        }
    }

    /// Forget the current drag.
    pub fn cancel(&mut self) {
        self.drag_start = None;
        self.last_accepted = None;
    }

    /// Offset from the drag start to the last accepted position.
    pub fn drag_delta(&self) -> Option<Vec2> {
        Some(self.last_accepted? - self.drag_start?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_tracking() {
        let mut tracker = DragTracker::default();
        let begin = tracker.handle(PointerEvent::begin(Point::new(100.0, 100.0))).unwrap();
        assert_eq!(begin.delta, Vec2::ZERO);
        assert!(tracker.is_dragging());
        assert_eq!(tracker.drag_start, Some(Point::new(100.0, 100.0)));

        let step = tracker.handle(PointerEvent::moved(Point::new(150.0, 120.0))).unwrap();
        assert!((step.delta.x - 50.0).abs() < f64::EPSILON);
        assert!((step.delta.y - 20.0).abs() < f64::EPSILON);

        let delta = tracker.drag_delta().unwrap();
        assert!((delta.x - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_small_moves_are_coalesced() {
        let mut tracker = DragTracker::new(2.0);
        tracker.handle(PointerEvent::begin(Point::new(0.0, 0.0)));
        assert!(tracker.handle(PointerEvent::moved(Point::new(1.0, 0.0))).is_none());
        assert!(tracker.handle(PointerEvent::moved(Point::new(1.5, 0.5))).is_none());

        let step = tracker.handle(PointerEvent::moved(Point::new(2.5, 0.0))).unwrap();
        assert!((step.delta.x - 2.5).abs() < f64::EPSILON);
        assert_eq!(tracker.last_accepted(), Some(Point::new(2.5, 0.0)));
    }

    #[test]
    fn test_end_stops_drag() {
        let mut tracker = DragTracker::default();
        tracker.handle(PointerEvent::begin(Point::new(10.0, 10.0)));
        let end = tracker.handle(PointerEvent::end(Point::new(10.5, 10.0))).unwrap();
        assert_eq!(end.phase, PointerPhase::End);
        assert!(!tracker.is_dragging());
        assert!(tracker.drag_delta().is_none());
    }

    #[test]
    fn test_stray_events_dropped() {
        let mut tracker = DragTracker::default();
        assert!(tracker.handle(PointerEvent::moved(Point::new(5.0, 5.0))).is_none());
        assert!(tracker.handle(PointerEvent::end(Point::new(5.0, 5.0))).is_none());
    }

    #[test]
    fn test_cancel() {
        let mut tracker = DragTracker::default();
        tracker.handle(PointerEvent::begin(Point::ZERO));
        tracker.cancel();
        assert!(tracker.handle(PointerEvent::moved(Point::new(50.0, 0.0))).is_none());
    }
}
