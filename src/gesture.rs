//! Pointer/touch gesture handling: converts device-space contact points into
//! frame-space and turns them into placement updates — drag to pan, pinch to
//! zoom and pan in the same gesture.
//!
//! The on-screen canvas is usually a scaled-down view of the output frame, so
//! every event converts through the container's *current* screen rect; the
//! rect is passed in fresh per event because layout can change between events.

use egui::{Pos2, Rect};

use crate::config::FrameConfig;
use crate::transform::Transform;

/// Force-end a gesture that has been silent this long (seconds). Protects
/// against a lost end event leaving the session active forever.
pub const GESTURE_IDLE_TIMEOUT: f64 = 10.0;

/// Transient per-interaction state, alive between a down and the matching
/// up/end event. Never persisted.
///
/// The anchor is the image-relative frame-space offset of the initial contact
/// point (`contact − offset`). It is computed once at gesture start and stays
/// valid through scale changes, which is what keeps repeated move events from
/// drifting: each move derives an absolute offset from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct GestureSession {
    pub is_active: bool,
    anchor_x: f32,
    anchor_y: f32,
    /// Frame-space distance between the two contact points at gesture start.
    /// Zero when the gesture did not start with exactly two points; zero
    /// suppresses zoom for the whole gesture (also guards divide-by-zero).
    initial_pinch_dist: f32,
    /// Scale captured at gesture start — the pinch baseline.
    initial_scale: f32,
    last_event_time: f64,
}

/// Convert a device-space point into frame-space pixels through the
/// container's current on-screen rect.
pub fn to_frame_space(point: Pos2, container: Rect, frame: &FrameConfig) -> (f32, f32) {
    let sx = frame.width as f32 / container.width();
    let sy = frame.height as f32 / container.height();
    ((point.x - container.min.x) * sx, (point.y - container.min.y) * sy)
}

fn frame_space_distance(a: Pos2, b: Pos2, container: Rect, frame: &FrameConfig) -> f32 {
    let (ax, ay) = to_frame_space(a, container, frame);
    let (bx, by) = to_frame_space(b, container, frame);
    (ax - bx).hypot(ay - by)
}

impl GestureSession {
    /// Begin a gesture from one point (mouse or single touch) or two points
    /// (two-finger touch). Any other point count is ignored — pinch state is
    /// only entered when exactly two points are seen at gesture start.
    ///
    /// The caller must ensure an image is loaded before starting a gesture.
    pub fn start(
        &mut self,
        points: &[Pos2],
        container: Rect,
        frame: &FrameConfig,
        transform: &Transform,
        now: f64,
    ) {
        if !(1..=2).contains(&points.len()) || container.width() <= 0.0 || container.height() <= 0.0
        {
            return;
        }

        let (fx, fy) = to_frame_space(points[0], container, frame);
        self.anchor_x = fx - transform.offset_x;
        self.anchor_y = fy - transform.offset_y;
        self.initial_pinch_dist = if points.len() == 2 {
            frame_space_distance(points[0], points[1], container, frame)
        } else {
            0.0
        };
        self.initial_scale = transform.scale;
        self.last_event_time = now;
        self.is_active = true;
    }

    /// Process a move event. Returns the updated transform, or `None` when
    /// there is no active gesture (a move without a matching start is a
    /// no-op, not an error).
    ///
    /// Pan always follows the primary point; when the gesture started with
    /// two points and exactly two are present, the pinch ratio then rescales
    /// about the frame center. The two steps are applied in sequence to the
    /// same transform, not fused.
    pub fn moved(
        &mut self,
        points: &[Pos2],
        container: Rect,
        frame: &FrameConfig,
        transform: &Transform,
        now: f64,
    ) -> Option<Transform> {
        self.expire_if_idle(now);
        if !self.is_active
            || points.is_empty()
            || container.width() <= 0.0
            || container.height() <= 0.0
        {
            return None;
        }
        self.last_event_time = now;

        let (fx, fy) = to_frame_space(points[0], container, frame);
        let mut next = transform.translate(fx - self.anchor_x, fy - self.anchor_y);

        if points.len() == 2 && self.initial_pinch_dist > 0.0 {
            let dist = frame_space_distance(points[0], points[1], container, frame);
            let ratio = dist / self.initial_pinch_dist;
            next = next.set_zoom(self.initial_scale * ratio, frame);
        }

        Some(next)
    }

    /// End the gesture. Unconditional and idempotent.
    pub fn end(&mut self) {
        self.is_active = false;
    }

    /// Watchdog: force-end the session when no event arrived for
    /// [`GESTURE_IDLE_TIMEOUT`] seconds (e.g. a dropped touch-end).
    pub fn expire_if_idle(&mut self, now: f64) {
        if self.is_active && now - self.last_event_time > GESTURE_IDLE_TIMEOUT {
            self.end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    fn frame() -> FrameConfig {
        FrameConfig { width: 354, height: 472, ..Default::default() }
    }

    /// Container shown at native size, origin at (0, 0).
    fn native_container() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(354.0, 472.0))
    }

    #[test]
    fn frame_space_accounts_for_display_scaling() {
        // Container rendered at half size and offset on screen.
        let container = Rect::from_min_size(pos2(100.0, 50.0), vec2(177.0, 236.0));
        let (fx, fy) = to_frame_space(pos2(100.0 + 88.5, 50.0 + 118.0), container, &frame());
        assert!((fx - 177.0).abs() < 1e-3);
        assert!((fy - 236.0).abs() < 1e-3);
    }

    #[test]
    fn drag_holds_anchor_under_contact_point() {
        let f = frame();
        let c = native_container();
        let mut t = Transform { offset_x: -59.0, offset_y: 0.0, scale: 0.472 };
        let mut session = GestureSession::default();

        let start = pos2(120.0, 200.0);
        session.start(&[start], c, &f, &t, 0.0);
        assert!(session.is_active);

        // Many small moves; the frame point under the finger must track the
        // contact exactly at every step, with no accumulated drift.
        let mut p = start;
        for i in 1..200 {
            p += vec2(0.7, -0.3);
            t = session.moved(&[p], c, &f, &t, i as f64 * 0.01).unwrap();
            let (fx, fy) = to_frame_space(p, c, &f);
            assert!(((session.anchor_x + t.offset_x) - fx).abs() < 1e-3);
            assert!(((session.anchor_y + t.offset_y) - fy).abs() < 1e-3);
        }
    }

    #[test]
    fn pinch_doubles_scale_when_distance_doubles() {
        let f = frame();
        let c = native_container();
        let t = Transform { offset_x: 0.0, offset_y: 0.0, scale: 1.0 };
        let mut session = GestureSession::default();

        let a = pos2(100.0, 200.0);
        session.start(&[a, pos2(200.0, 200.0)], c, &f, &t, 0.0);
        let out = session.moved(&[a, pos2(300.0, 200.0)], c, &f, &t, 0.1).unwrap();
        assert!((out.scale - 2.0).abs() < 1e-4);
    }

    #[test]
    fn pinch_zoom_is_clamped() {
        let f = frame();
        let c = native_container();
        let t = Transform { offset_x: 0.0, offset_y: 0.0, scale: 4.0 };
        let mut session = GestureSession::default();

        session.start(&[pos2(170.0, 200.0), pos2(190.0, 200.0)], c, &f, &t, 0.0);
        let out = session.moved(&[pos2(50.0, 200.0), pos2(330.0, 200.0)], c, &f, &t, 0.1).unwrap();
        assert_eq!(out.scale, crate::transform::MAX_SCALE);
    }

    #[test]
    fn zero_initial_distance_suppresses_zoom() {
        let f = frame();
        let c = native_container();
        let t = Transform { offset_x: 10.0, offset_y: 10.0, scale: 1.5 };
        let mut session = GestureSession::default();

        let p = pos2(150.0, 150.0);
        session.start(&[p, p], c, &f, &t, 0.0);
        let out = session.moved(&[p, pos2(250.0, 150.0)], c, &f, &t, 0.1).unwrap();
        assert_eq!(out.scale, 1.5);
    }

    #[test]
    fn single_point_move_never_zooms() {
        let f = frame();
        let c = native_container();
        let t = Transform { offset_x: 0.0, offset_y: 0.0, scale: 1.0 };
        let mut session = GestureSession::default();

        session.start(&[pos2(100.0, 100.0)], c, &f, &t, 0.0);
        let out = session.moved(&[pos2(180.0, 140.0)], c, &f, &t, 0.1).unwrap();
        assert_eq!(out.scale, 1.0);
    }

    #[test]
    fn move_without_start_is_noop() {
        let f = frame();
        let c = native_container();
        let t = Transform::default();
        let mut session = GestureSession::default();
        assert!(session.moved(&[pos2(10.0, 10.0)], c, &f, &t, 0.0).is_none());
    }

    #[test]
    fn three_point_start_is_ignored() {
        let f = frame();
        let c = native_container();
        let t = Transform::default();
        let mut session = GestureSession::default();
        session.start(&[pos2(1.0, 1.0), pos2(2.0, 2.0), pos2(3.0, 3.0)], c, &f, &t, 0.0);
        assert!(!session.is_active);
    }

    #[test]
    fn end_is_idempotent() {
        let mut session = GestureSession::default();
        session.end();
        assert!(!session.is_active);
        let f = frame();
        session.start(&[pos2(5.0, 5.0)], native_container(), &f, &Transform::default(), 0.0);
        session.end();
        session.end();
        assert!(!session.is_active);
    }

    #[test]
    fn idle_watchdog_force_ends_gesture() {
        let f = frame();
        let c = native_container();
        let t = Transform::default();
        let mut session = GestureSession::default();

        session.start(&[pos2(10.0, 10.0)], c, &f, &t, 0.0);
        let out = session.moved(&[pos2(20.0, 20.0)], c, &f, &t, GESTURE_IDLE_TIMEOUT + 1.0);
        assert!(out.is_none());
        assert!(!session.is_active);
    }
}
