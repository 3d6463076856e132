//! The eframe application: settings sidebar, live canvas with guide overlay,
//! and the wiring between raw egui input events and the gesture controller.

use std::path::PathBuf;
use std::sync::mpsc;

use eframe::egui;
use egui::{Color32, Pos2, Rect, Stroke, TextureOptions, pos2, vec2};
use image::RgbaImage;

use crate::config::{FrameConfig, MAX_FRAME_DIM, MIN_FRAME_DIM, PRESETS};
use crate::gesture::GestureSession;
use crate::io::FileHandler;
use crate::render;
use crate::transform::{MAX_SCALE, MIN_SCALE, Transform};
use crate::{log_err, log_info, log_warn};

// ============================================================================
// ASYNC IO PIPELINE — background image decoding
// ============================================================================

/// Result delivered from a background decode thread. While a decode is
/// pending the previous image stays loaded and interactive; a failure leaves
/// it untouched.
pub enum IoResult {
    /// An image file was decoded, ready to replace the current one.
    ImageLoaded { image: RgbaImage, path: PathBuf },
    /// Image decoding failed — keep prior state, surface the message.
    LoadFailed(String),
}

pub struct CropFrameApp {
    // Frame configuration (edited in the sidebar, preset-applied atomically)
    config: FrameConfig,

    // The one loaded source image; replaced wholesale on upload.
    image: Option<RgbaImage>,

    // Placement of the image inside the frame — the single piece of state
    // the whole interactive session revolves around.
    transform: Transform,

    // Per-interaction drag/pinch state.
    gesture: GestureSession,

    /// Live touch points in screen coordinates, insertion-ordered so the
    /// first entry is the primary point.
    touches: Vec<(egui::TouchId, Pos2)>,
    prev_touch_count: usize,

    // Rendered-frame texture shown in the canvas; refreshed when dirty.
    texture: Option<egui::TextureHandle>,
    render_dirty: bool,

    file_handler: FileHandler,

    // Async IO pipeline (background image decode)
    io_sender: mpsc::Sender<IoResult>,
    io_receiver: mpsc::Receiver<IoResult>,
    /// When > 0, a background decode is in progress; show spinner.
    pending_io: usize,

    /// Status-bar message (load results, export confirmations, errors).
    status: String,
}

impl CropFrameApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let (io_sender, io_receiver) = mpsc::channel();
        Self {
            config: FrameConfig::default(),
            image: None,
            transform: Transform::default(),
            gesture: GestureSession::default(),
            touches: Vec::new(),
            prev_touch_count: 0,
            texture: None,
            render_dirty: false,
            file_handler: FileHandler,
            io_sender,
            io_receiver,
            pending_io: 0,
            status: "Upload an image to begin.".to_string(),
        }
    }

    /// Drain decode results from the background thread.
    fn poll_io(&mut self) {
        while let Ok(result) = self.io_receiver.try_recv() {
            self.pending_io = self.pending_io.saturating_sub(1);
            match result {
                IoResult::ImageLoaded { image, path } => {
                    // The one-time cover-fit reset for a freshly decoded image.
                    self.transform = Transform::reset_for_new_image(
                        image.width(),
                        image.height(),
                        &self.config,
                    );
                    log_info!(
                        "Loaded {} ({}x{})",
                        path.display(),
                        image.width(),
                        image.height()
                    );
                    self.status = format!(
                        "Loaded {} ({}x{})",
                        path.file_name().map(|s| s.to_string_lossy()).unwrap_or_default(),
                        image.width(),
                        image.height()
                    );
                    self.image = Some(image);
                    self.gesture.end();
                    self.render_dirty = true;
                }
                IoResult::LoadFailed(msg) => {
                    // Prior image (if any) stays loaded and interactive.
                    log_warn!("{}", msg);
                    self.status = msg;
                }
            }
        }
    }

    fn spawn_decode(&mut self, path: PathBuf, ctx: &egui::Context) {
        let sender = self.io_sender.clone();
        let repaint_ctx = ctx.clone();
        self.pending_io += 1;
        std::thread::spawn(move || {
            let result = match crate::io::load_image_sync(&path) {
                Ok(image) => IoResult::ImageLoaded { image, path },
                Err(msg) => IoResult::LoadFailed(msg),
            };
            let _ = sender.send(result);
            repaint_ctx.request_repaint();
        });
    }

    fn export(&mut self) {
        let Some(image) = &self.image else { return };
        let Some(path) = self.file_handler.pick_save_path(&self.config) else { return };

        // Re-render at export time: render is idempotent, so this is exactly
        // the frame the user is looking at.
        let rendered = render::render(&self.config, &self.transform, image);
        match crate::io::encode_and_write(&rendered, &path) {
            Ok(()) => {
                log_info!("Exported {}", path.display());
                self.status = format!("Saved {}", path.display());
            }
            Err(e) => {
                log_err!("Export failed: {}", e);
                self.status = format!("Export failed: {}", e);
            }
        }
    }

    // ------------------------------------------------------------------
    // Sidebar
    // ------------------------------------------------------------------

    fn settings_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let config_before = self.config;

        ui.heading("Target Settings");
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label("Width (px)");
            ui.add(
                egui::DragValue::new(&mut self.config.width)
                    .clamp_range(MIN_FRAME_DIM..=MAX_FRAME_DIM),
            );
            ui.label("Height (px)");
            ui.add(
                egui::DragValue::new(&mut self.config.height)
                    .clamp_range(MIN_FRAME_DIM..=MAX_FRAME_DIM),
            );
        });

        ui.add_space(8.0);
        ui.add(
            egui::Slider::new(&mut self.config.crown_percent, 0.0..=50.0)
                .text("Crown position %")
                .fixed_decimals(1),
        );
        ui.add(
            egui::Slider::new(&mut self.config.chin_percent, 50.0..=100.0)
                .text("Chin position %")
                .fixed_decimals(1),
        );

        ui.add_space(12.0);
        ui.heading("Presets");
        ui.add_space(4.0);
        ui.horizontal_wrapped(|ui| {
            for preset in PRESETS {
                if ui.button(preset.name).clicked() {
                    // Applied atomically; does NOT reset an already-positioned
                    // transform, only invalidates an in-progress gesture.
                    self.config = preset.config;
                }
            }
        });

        ui.add_space(12.0);
        ui.separator();
        ui.add_space(8.0);

        if ui.button("Upload New Image…").clicked() {
            if let Some(path) = self.file_handler.pick_open_path() {
                self.spawn_decode(path, ctx);
            }
        }

        let can_export = self.image.is_some();
        if ui
            .add_enabled(can_export, egui::Button::new("Download Result"))
            .clicked()
        {
            self.export();
        }

        if self.pending_io > 0 {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Decoding…");
            });
        }

        self.config.sanitize();
        if self.config != config_before {
            // A frame change mid-gesture would re-interpret the anchor, so
            // the gesture is cancelled; the transform itself is kept.
            self.gesture.end();
            self.render_dirty = true;
        }
    }

    // ------------------------------------------------------------------
    // Canvas + input
    // ------------------------------------------------------------------

    /// Display rect for the canvas: frame aspect ratio, at most native size,
    /// fitted into the available space.
    fn canvas_size(&self, avail: egui::Vec2) -> egui::Vec2 {
        let fw = self.config.width as f32;
        let fh = self.config.height as f32;
        let mut w = avail.x.max(50.0).min(fw);
        let mut h = w * fh / fw;
        let max_h = (avail.y - 60.0).max(50.0); // leave room for the zoom slider
        if h > max_h {
            h = max_h;
            w = h * fw / fh;
        }
        vec2(w, h)
    }

    fn canvas_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        // Refresh the rendered-frame texture when placement or config changed.
        if self.render_dirty {
            if let Some(image) = &self.image {
                let rendered = render::render(&self.config, &self.transform, image);
                let color_image = egui::ColorImage::from_rgba_unmultiplied(
                    [rendered.width() as usize, rendered.height() as usize],
                    rendered.as_raw(),
                );
                match &mut self.texture {
                    Some(tex) => tex.set(color_image, TextureOptions::LINEAR),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("rendered_frame", color_image, TextureOptions::LINEAR));
                    }
                }
            }
            self.render_dirty = false;
        }

        let size = self.canvas_size(ui.available_size());
        ui.vertical_centered(|ui| {
            let (response, painter) = ui.allocate_painter(size, egui::Sense::drag());
            let rect = response.rect;

            match (&self.texture, self.image.is_some()) {
                (Some(tex), true) => {
                    painter.image(
                        tex.id(),
                        rect,
                        Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
                _ => {
                    painter.rect_filled(rect, 4.0, Color32::WHITE);
                    painter.text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "Upload an image to begin",
                        egui::FontId::proportional(14.0),
                        Color32::GRAY,
                    );
                }
            }

            self.draw_guides(&painter, rect);
            self.handle_canvas_input(&response, rect, ctx);

            // Zoom slider — drives the same center-anchored zoom as pinch.
            ui.add_space(8.0);
            let mut scale = self.transform.scale;
            let slider = ui.add_enabled(
                self.image.is_some(),
                egui::Slider::new(&mut scale, MIN_SCALE..=MAX_SCALE)
                    .text("Zoom")
                    .fixed_decimals(2),
            );
            if slider.changed() {
                self.transform = self.transform.set_zoom(scale, &self.config);
                self.render_dirty = true;
            }
        });
    }

    /// Crown/chin markers and a faint center crosshair. Pure display — the
    /// transform engine never reads these.
    fn draw_guides(&self, painter: &egui::Painter, rect: Rect) {
        let guide = |pct: f32| rect.top() + rect.height() * pct / 100.0;

        let crown_y = guide(self.config.crown_percent);
        let chin_y = guide(self.config.chin_percent);
        let crown_color = Color32::from_rgba_unmultiplied(239, 68, 68, 200);
        let chin_color = Color32::from_rgba_unmultiplied(16, 185, 129, 200);

        for (y, color, label) in [(crown_y, crown_color, "CROWN"), (chin_y, chin_color, "CHIN")] {
            painter.add(egui::Shape::dashed_line(
                &[pos2(rect.left(), y), pos2(rect.right(), y)],
                Stroke::new(1.0, color),
                6.0,
                4.0,
            ));
            painter.text(
                pos2(rect.right() - 4.0, y - 2.0),
                egui::Align2::RIGHT_BOTTOM,
                label,
                egui::FontId::proportional(9.0),
                color,
            );
        }

        let faint = Color32::from_rgba_unmultiplied(100, 116, 139, 40);
        painter.line_segment(
            [pos2(rect.left(), rect.center().y), pos2(rect.right(), rect.center().y)],
            Stroke::new(1.0, faint),
        );
        painter.line_segment(
            [pos2(rect.center().x, rect.top()), pos2(rect.center().x, rect.bottom())],
            Stroke::new(1.0, faint),
        );
    }

    /// Route pointer/touch input into the gesture session. The container rect
    /// is taken fresh from this frame's layout, so display scaling and window
    /// resizes are always accounted for.
    fn handle_canvas_input(&mut self, response: &egui::Response, rect: Rect, ctx: &egui::Context) {
        let (now, touch_events, scroll_y) = ctx.input(|i| {
            let touches: Vec<(egui::TouchId, egui::TouchPhase, Pos2)> = i
                .events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Touch { id, phase, pos, .. } => Some((*id, *phase, *pos)),
                    _ => None,
                })
                .collect();
            (i.time, touches, i.scroll_delta.y)
        });

        self.gesture.expire_if_idle(now);

        // Maintain the live touch-point set, insertion-ordered.
        for (id, phase, pos) in touch_events {
            match phase {
                egui::TouchPhase::Start => {
                    if !self.touches.iter().any(|(tid, _)| *tid == id) {
                        self.touches.push((id, pos));
                    }
                }
                egui::TouchPhase::Move => {
                    if let Some(entry) = self.touches.iter_mut().find(|(tid, _)| *tid == id) {
                        entry.1 = pos;
                    }
                }
                egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                    self.touches.retain(|(tid, _)| *tid != id);
                }
            }
        }

        let touch_count = self.touches.len();
        if touch_count == 2 {
            let points = [self.touches[0].1, self.touches[1].1];
            if self.prev_touch_count != 2 {
                // Pinch state is only entered when exactly two points are
                // present at gesture start.
                if self.image.is_some() {
                    self.gesture.start(&points, rect, &self.config, &self.transform, now);
                }
            } else if let Some(next) =
                self.gesture.moved(&points, rect, &self.config, &self.transform, now)
            {
                if next != self.transform {
                    self.transform = next;
                    self.render_dirty = true;
                }
            }
        } else {
            if self.prev_touch_count == 2 {
                self.gesture.end();
            }

            // Mouse path (also drives single-touch, which egui surfaces as
            // pointer events). egui captures the drag, so it keeps tracking
            // even when the pointer leaves the canvas mid-gesture.
            if response.drag_started() && self.image.is_some() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.gesture.start(&[pos], rect, &self.config, &self.transform, now);
                }
            } else if response.dragged() {
                if let Some(pos) = response.interact_pointer_pos() {
                    if let Some(next) =
                        self.gesture.moved(&[pos], rect, &self.config, &self.transform, now)
                    {
                        if next != self.transform {
                            self.transform = next;
                            self.render_dirty = true;
                        }
                    }
                }
            }
            if response.drag_released() {
                self.gesture.end();
            }
        }
        self.prev_touch_count = touch_count;

        // Wheel zoom, anchored at the frame center like the slider.
        if response.hovered() && scroll_y != 0.0 && self.image.is_some() {
            let factor = (scroll_y * 0.002).exp();
            self.transform = self.transform.set_zoom(self.transform.scale * factor, &self.config);
            self.render_dirty = true;
        }

        if self.gesture.is_active {
            ctx.output_mut(|o| o.cursor_icon = egui::CursorIcon::Grabbing);
        } else if response.hovered() && self.image.is_some() {
            ctx.output_mut(|o| o.cursor_icon = egui::CursorIcon::Grab);
        }
    }
}

impl eframe::App for CropFrameApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_io();

        egui::SidePanel::left("settings_panel")
            .resizable(false)
            .default_width(270.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                self.settings_panel(ui, ctx);
            });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!(
                        "{}x{} px · x{:.2}",
                        self.config.width, self.config.height, self.transform.scale
                    ));
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);
            self.canvas_panel(ui, ctx);
        });
    }
}
