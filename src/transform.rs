//! Image placement state and the pure update functions that preserve its
//! invariants. All coordinates are frame-space pixels: the offset is the
//! position of the image's top-left corner inside the output frame, the
//! scale is the source-pixel → frame-pixel ratio.

use crate::config::FrameConfig;

/// The zoom range exposed to the user. Every user-driven scale change
/// (slider, wheel, pinch) goes through [`Transform::set_zoom`] and is clamped
/// into this range. [`Transform::reset_for_new_image`] is the one exception:
/// its cover-fit scale is unclamped, so a very small image may start above
/// `MAX_SCALE` until the user first zooms.
pub const MIN_SCALE: f32 = 0.01;
pub const MAX_SCALE: f32 = 5.0;

/// Current placement of the loaded image relative to the output frame.
///
/// Nothing forces the scaled image to keep covering the frame after user
/// manipulation — only the initial reset guarantees full coverage. Edges may
/// show white background after zooming out; that is the user's choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self { offset_x: 0.0, offset_y: 0.0, scale: 1.0 }
    }
}

impl Transform {
    /// Placement for a freshly loaded image: the smallest scale at which the
    /// image covers the frame on both axes (cover fit, not contain), centered.
    ///
    /// Called exactly once per uploaded image, immediately after decode.
    pub fn reset_for_new_image(image_w: u32, image_h: u32, frame: &FrameConfig) -> Self {
        let scale_w = frame.width as f32 / image_w as f32;
        let scale_h = frame.height as f32 / image_h as f32;
        let scale = scale_w.max(scale_h);

        Self {
            scale,
            offset_x: (frame.width as f32 - image_w as f32 * scale) / 2.0,
            offset_y: (frame.height as f32 - image_h as f32 * scale) / 2.0,
        }
    }

    /// Change the scale while keeping the frame's geometric center over the
    /// same source pixel. The anchor is always the frame center, regardless
    /// of what triggered the zoom (slider, wheel, or pinch).
    pub fn set_zoom(&self, target_scale: f32, frame: &FrameConfig) -> Self {
        let new_scale = target_scale.clamp(MIN_SCALE, MAX_SCALE);
        let (cx, cy) = frame.center();

        // Source-image coordinate currently under the frame center.
        let img_x = (cx - self.offset_x) / self.scale;
        let img_y = (cy - self.offset_y) / self.scale;

        Self {
            scale: new_scale,
            offset_x: cx - img_x * new_scale,
            offset_y: cy - img_y * new_scale,
        }
    }

    /// Move the image to an absolute offset. The drag path computes the
    /// target offset from the gesture anchor on every event instead of
    /// accumulating deltas, so repeated small moves cannot drift.
    pub fn translate(&self, offset_x: f32, offset_y: f32) -> Self {
        Self { offset_x, offset_y, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn frame(w: u32, h: u32) -> FrameConfig {
        FrameConfig { width: w, height: h, ..Default::default() }
    }

    #[test]
    fn reset_covers_frame_and_centers() {
        // Sweep a few aspect-ratio combinations; cover fit must hold for all.
        for &(iw, ih) in &[(1000u32, 1000u32), (300, 2000), (4000, 150), (354, 472)] {
            for &(fw, fh) in &[(354u32, 472u32), (600, 600), (413, 531)] {
                let t = Transform::reset_for_new_image(iw, ih, &frame(fw, fh));
                assert!(iw as f32 * t.scale >= fw as f32 - EPS);
                assert!(ih as f32 * t.scale >= fh as f32 - EPS);
                assert!((t.offset_x - (fw as f32 - iw as f32 * t.scale) / 2.0).abs() < EPS);
                assert!((t.offset_y - (fh as f32 - ih as f32 * t.scale) / 2.0).abs() < EPS);
            }
        }
    }

    #[test]
    fn reset_square_image_into_passport_frame() {
        // 1000x1000 into 354x472: height dominates, scaled image is 472 wide,
        // so it centers horizontally with a negative x offset.
        let t = Transform::reset_for_new_image(1000, 1000, &frame(354, 472));
        assert!((t.scale - 0.472).abs() < EPS);
        assert!((t.offset_x - (-59.0)).abs() < EPS);
        assert!(t.offset_y.abs() < EPS);
    }

    #[test]
    fn set_zoom_keeps_frame_center_fixed() {
        let f = frame(354, 472);
        let before = Transform { offset_x: 0.0, offset_y: 0.0, scale: 1.0 };
        let after = before.set_zoom(2.0, &f);
        assert_eq!(after.scale, 2.0);

        let (cx, cy) = f.center();
        let img_before = ((cx - before.offset_x) / before.scale, (cy - before.offset_y) / before.scale);
        let img_after = ((cx - after.offset_x) / after.scale, (cy - after.offset_y) / after.scale);
        assert!((img_before.0 - img_after.0).abs() < EPS);
        assert!((img_before.1 - img_after.1).abs() < EPS);
    }

    #[test]
    fn set_zoom_center_fixed_from_arbitrary_placement() {
        let f = frame(413, 531);
        let before = Transform { offset_x: -120.5, offset_y: 33.25, scale: 0.8 };
        for target in [0.05, 0.5, 1.3, 4.9] {
            let after = before.set_zoom(target, &f);
            let (cx, cy) = f.center();
            let ix = (cx - before.offset_x) / before.scale;
            let iy = (cy - before.offset_y) / before.scale;
            assert!(((cx - after.offset_x) / after.scale - ix).abs() < 1e-3);
            assert!(((cy - after.offset_y) / after.scale - iy).abs() < 1e-3);
        }
    }

    #[test]
    fn reset_scale_is_unclamped_for_tiny_images() {
        // Cover fit for a 50x50 image in a 354x472 frame needs scale 9.44,
        // above the user zoom ceiling. The reset keeps it (coverage wins);
        // the first user zoom then clamps back into range.
        let f = frame(354, 472);
        let t = Transform::reset_for_new_image(50, 50, &f);
        assert!((t.scale - 9.44).abs() < EPS);
        assert_eq!(t.set_zoom(t.scale, &f).scale, MAX_SCALE);
    }

    #[test]
    fn set_zoom_clamps_to_range() {
        let f = frame(354, 472);
        let t = Transform::default();
        assert_eq!(t.set_zoom(10.0, &f).scale, MAX_SCALE);
        assert_eq!(t.set_zoom(0.0001, &f).scale, MIN_SCALE);
        assert_eq!(t.set_zoom(-3.0, &f).scale, MIN_SCALE);
    }

    #[test]
    fn translate_sets_absolute_offsets() {
        let t = Transform { offset_x: 5.0, offset_y: 6.0, scale: 1.5 };
        let moved = t.translate(-10.25, 40.75);
        assert_eq!(moved.offset_x, -10.25);
        assert_eq!(moved.offset_y, 40.75);
        assert_eq!(moved.scale, 1.5);
    }
}
