//! Output-frame configuration: target pixel dimensions plus the crown/chin
//! guide positions, and the named presets that set all four values at once.

/// Hard bounds for the frame dimensions. The widgets and the CLI both clamp
/// into this range, so the transform/render code can assume positive sizes.
pub const MIN_FRAME_DIM: u32 = 1;
pub const MAX_FRAME_DIM: u32 = 8192;

/// Immutable-per-session output frame settings.
///
/// `crown_percent` / `chin_percent` are vertical guide positions as a
/// percentage of frame height. They are display-only: the transform engine
/// never reads them, the canvas overlay draws them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Crown guide position, 0–50 % of frame height.
    pub crown_percent: f32,
    /// Chin guide position, 50–100 % of frame height.
    pub chin_percent: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        // SG passport dimensions — the original default.
        Self {
            width: 354,
            height: 472,
            crown_percent: 15.5,
            chin_percent: 80.0,
        }
    }
}

impl FrameConfig {
    /// Clamp all fields into their valid ranges. Called at the configuration
    /// boundary (widget edits, CLI args) so invalid dimensions never reach
    /// the transform model.
    pub fn sanitize(&mut self) {
        self.width = self.width.clamp(MIN_FRAME_DIM, MAX_FRAME_DIM);
        self.height = self.height.clamp(MIN_FRAME_DIM, MAX_FRAME_DIM);
        self.crown_percent = self.crown_percent.clamp(0.0, 50.0);
        self.chin_percent = self.chin_percent.clamp(50.0, 100.0);
    }

    /// Frame center in frame-space pixels — the zoom anchor.
    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

/// A named tuple of frame settings, applied atomically.
pub struct Preset {
    pub name: &'static str,
    pub config: FrameConfig,
}

/// Built-in document presets shown in the sidebar.
pub const PRESETS: &[Preset] = &[
    Preset {
        name: "SG Passport",
        config: FrameConfig { width: 354, height: 472, crown_percent: 15.0, chin_percent: 80.0 },
    },
    Preset {
        name: "US Visa",
        config: FrameConfig { width: 600, height: 600, crown_percent: 12.0, chin_percent: 65.0 },
    },
    Preset {
        name: "EU (35x45)",
        config: FrameConfig { width: 413, height: 531, crown_percent: 10.0, chin_percent: 85.0 },
    },
];
