//! CPU compositor for the output frame.
//!
//! `render` is a pure function of (frame, transform, image): it fills an
//! opaque white buffer and draws the scaled image at its sub-pixel placement.
//! Identical inputs produce byte-identical output, so it can be called once
//! per transform change without accumulating state.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::config::FrameConfig;
use crate::transform::Transform;

/// Composite `image`, scaled by `transform.scale` with its top-left corner at
/// `(offset_x, offset_y)`, onto a white `frame.width × frame.height` buffer.
///
/// Offsets are not snapped to integers — the image is resampled bilinearly at
/// its exact sub-pixel position. Pixels outside the placed image stay white;
/// source alpha is blended over white, so the result is always opaque.
pub fn render(frame: &FrameConfig, transform: &Transform, image: &RgbaImage) -> RgbaImage {
    let (fw, fh) = (frame.width, frame.height);
    let mut out = RgbaImage::from_pixel(fw, fh, Rgba([255, 255, 255, 255]));

    let src_w = image.width() as f32;
    let src_h = image.height() as f32;
    let scale = transform.scale;
    let (off_x, off_y) = (transform.offset_x, transform.offset_y);

    out.par_chunks_mut(fw as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            // Source coordinate of this row's pixel centers, in source-pixel
            // units measured from the image's top-left corner.
            let v = (y as f32 + 0.5 - off_y) / scale;
            if !(0.0..src_h).contains(&v) {
                return;
            }
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let u = (x as f32 + 0.5 - off_x) / scale;
                if !(0.0..src_w).contains(&u) {
                    continue;
                }
                let Rgba([r, g, b, a]) = sample_bilinear(image, u - 0.5, v - 0.5);
                if a == 0 {
                    continue;
                }
                // Alpha over opaque white.
                let af = a as f32 / 255.0;
                px[0] = (r as f32 * af + 255.0 * (1.0 - af)) as u8;
                px[1] = (g as f32 * af + 255.0 * (1.0 - af)) as u8;
                px[2] = (b as f32 * af + 255.0 * (1.0 - af)) as u8;
                px[3] = 255;
            }
        });

    out
}

/// Bilinear sample at texel-space `(sx, sy)` with edge clamping. The caller
/// has already rejected positions outside the image footprint.
fn sample_bilinear(image: &RgbaImage, sx: f32, sy: f32) -> Rgba<u8> {
    let max_x = image.width() as i64 - 1;
    let max_y = image.height() as i64 - 1;

    let x0 = sx.floor() as i64;
    let y0 = sy.floor() as i64;
    let fx = sx - x0 as f32;
    let fy = sy - y0 as f32;

    let cx0 = x0.clamp(0, max_x) as u32;
    let cx1 = (x0 + 1).clamp(0, max_x) as u32;
    let cy0 = y0.clamp(0, max_y) as u32;
    let cy1 = (y0 + 1).clamp(0, max_y) as u32;

    let p00 = image.get_pixel(cx0, cy0).0;
    let p10 = image.get_pixel(cx1, cy0).0;
    let p01 = image.get_pixel(cx0, cy1).0;
    let p11 = image.get_pixel(cx1, cy1).0;

    let mut out = [0u8; 4];
    for ch in 0..4 {
        let top = p00[ch] as f32 * (1.0 - fx) + p10[ch] as f32 * fx;
        let bot = p01[ch] as f32 * (1.0 - fx) + p11[ch] as f32 * fx;
        out[ch] = (top * (1.0 - fy) + bot * fy).round() as u8;
    }
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(w: u32, h: u32) -> FrameConfig {
        FrameConfig { width: w, height: h, ..Default::default() }
    }

    /// Deterministic multi-colored test image.
    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    #[test]
    fn render_is_idempotent() {
        let img = gradient(40, 30);
        let t = Transform { offset_x: -3.7, offset_y: 2.25, scale: 1.83 };
        let f = frame(25, 35);
        let a = render(&f, &t, &img);
        let b = render(&f, &t, &img);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn identity_placement_reproduces_source() {
        let img = gradient(16, 16);
        let t = Transform { offset_x: 0.0, offset_y: 0.0, scale: 1.0 };
        let out = render(&frame(16, 16), &t, &img);
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn background_stays_white_around_small_image() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let t = Transform { offset_x: 1.0, offset_y: 1.0, scale: 1.0 };
        let out = render(&frame(4, 4), &t, &img);
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(3, 3).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(1, 1).0, [10, 20, 30, 255]);
        assert_eq!(out.get_pixel(2, 2).0, [10, 20, 30, 255]);
    }

    #[test]
    fn image_fully_outside_frame_is_not_drawn() {
        let img = gradient(8, 8);
        let t = Transform { offset_x: 500.0, offset_y: -500.0, scale: 1.0 };
        let out = render(&frame(10, 10), &t, &img);
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn sub_pixel_offsets_are_not_snapped() {
        let img = gradient(20, 20);
        let f = frame(12, 12);
        let a = render(&f, &Transform { offset_x: 0.0, offset_y: 0.0, scale: 1.0 }, &img);
        let b = render(&f, &Transform { offset_x: 0.5, offset_y: 0.0, scale: 1.0 }, &img);
        assert_ne!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn transparent_source_pixels_leave_white() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([200, 0, 0, 0]));
        let t = Transform { offset_x: 0.0, offset_y: 0.0, scale: 1.0 };
        let out = render(&frame(4, 4), &t, &img);
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn semi_transparent_blends_over_white() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 128]));
        let t = Transform { offset_x: 0.0, offset_y: 0.0, scale: 1.0 };
        let out = render(&frame(4, 4), &t, &img);
        let p = out.get_pixel(2, 2).0;
        // ~50% black over white ≈ mid grey, fully opaque.
        assert!((p[0] as i32 - 127).abs() <= 2);
        assert_eq!(p[3], 255);
    }
}
