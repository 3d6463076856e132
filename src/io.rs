//! Image input/output: decoding uploads, lossless PNG export with the
//! deterministic download filename, and the native file dialogs.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ImageError, RgbaImage};
use rfd::FileDialog;

use crate::config::FrameConfig;

/// Deterministic export filename, derived from the frame dimensions only.
pub fn export_filename(frame: &FrameConfig) -> String {
    format!("ID_Photo_{}x{}.png", frame.width, frame.height)
}

/// Decode an image file to RGBA on the current thread.
///
/// Returns a human-readable error string on failure; the caller keeps its
/// previous image untouched and surfaces the message.
pub fn load_image_sync(path: &Path) -> Result<RgbaImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("Could not decode '{}': {}", path.display(), e))?;
    Ok(img.into_rgba8())
}

/// Encode and write a rendered frame as lossless PNG at full quality.
/// Standalone function (no `&mut self`) so it can run from a background
/// thread if needed.
pub fn encode_and_write(image: &RgbaImage, path: &Path) -> Result<(), ImageError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoder = PngEncoder::new(&mut writer);
    #[allow(deprecated)]
    encoder.encode(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(())
}

/// Native open/save dialogs for the GUI.
pub struct FileHandler;

impl FileHandler {
    /// Ask the user for an image to load. `None` when cancelled.
    pub fn pick_open_path(&self) -> Option<PathBuf> {
        FileDialog::new()
            .add_filter(
                "Images",
                &["png", "jpg", "jpeg", "webp", "bmp", "tiff", "tif"],
            )
            .add_filter("All Files", &["*"])
            .pick_file()
    }

    /// Ask the user where to save the export, pre-filled with the
    /// deterministic filename. `None` when cancelled.
    pub fn pick_save_path(&self, frame: &FrameConfig) -> Option<PathBuf> {
        FileDialog::new()
            .set_file_name(export_filename(frame))
            .add_filter("PNG Image", &["png"])
            .save_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn export_filename_derives_from_frame_dimensions() {
        let cfg = FrameConfig { width: 354, height: 472, ..Default::default() };
        assert_eq!(export_filename(&cfg), "ID_Photo_354x472.png");
        let cfg = FrameConfig { width: 600, height: 600, ..Default::default() };
        assert_eq!(export_filename(&cfg), "ID_Photo_600x600.png");
    }

    #[test]
    fn png_export_roundtrips_losslessly() {
        let img = RgbaImage::from_fn(21, 13, |x, y| {
            Rgba([(x * 11) as u8, (y * 17) as u8, (x ^ y) as u8, 255])
        });
        let path = std::env::temp_dir().join("cropframe_export_test.png");
        encode_and_write(&img, &path).expect("encode failed");
        let back = load_image_sync(&path).expect("decode failed");
        assert_eq!(back.as_raw(), img.as_raw());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_reports_unreadable_file() {
        let path = std::env::temp_dir().join("cropframe_not_an_image.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = load_image_sync(&path).unwrap_err();
        assert!(err.contains("Could not decode"));
        let _ = std::fs::remove_file(&path);
    }
}
