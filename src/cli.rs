// ============================================================================
// CropFrame CLI — headless framing via command-line arguments
// ============================================================================
//
// Usage examples:
//   cropframe --input face.jpg --width 354 --height 472
//   cropframe -i face.jpg -o passport.png --zoom 1.2
//   cropframe -i "shots/*.jpg" --width 600 --height 600 --output-dir framed/
//
// No GUI is opened in CLI mode. Each input is decoded, placed with the
// cover-fit reset, optionally re-zoomed about the frame center and/or moved
// to explicit offsets, rendered, and written as lossless PNG.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::config::FrameConfig;
use crate::io::{encode_and_write, load_image_sync};
use crate::render;
use crate::transform::Transform;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// CropFrame headless photo framer.
///
/// Scale and position photos inside a fixed output frame — no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "cropframe",
    about = "CropFrame headless ID-photo framer",
    long_about = "Place photos inside a fixed-size output frame without opening\n\
                  the GUI. Each image is cover-fitted and centered, then the\n\
                  optional --zoom / --offset-x / --offset-y adjustments are\n\
                  applied before rendering to lossless PNG.\n\n\
                  Example:\n  \
                  cropframe --input face.jpg --width 354 --height 472\n  \
                  cropframe -i \"shots/*.jpg\" --output-dir framed/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output frame width in pixels.
    #[arg(short = 'W', long, default_value_t = 354)]
    pub width: u32,

    /// Output frame height in pixels.
    #[arg(short = 'H', long, default_value_t = 472)]
    pub height: u32,

    /// Zoom level applied after the cover-fit reset, anchored at the frame
    /// center. Clamped to the 0.01–5 range.
    #[arg(short, long, value_name = "SCALE")]
    pub zoom: Option<f32>,

    /// Explicit x offset of the image's top-left corner, in frame pixels.
    /// Overrides the centered placement.
    #[arg(long, value_name = "PX", allow_hyphen_values = true)]
    pub offset_x: Option<f32>,

    /// Explicit y offset of the image's top-left corner, in frame pixels.
    #[arg(long, value_name = "PX", allow_hyphen_values = true)]
    pub offset_y: Option<f32>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing. Files are written here as
    /// `{stem}_{width}x{height}.png`.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process
    /// arguments. Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let mut frame = FrameConfig { width: args.width, height: args.height, ..Default::default() };
    frame.sanitize();
    if frame.width != args.width || frame.height != args.height {
        eprintln!(
            "warning: frame dimensions clamped to {}x{}.",
            frame.width, frame.height
        );
    }

    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: could not create output directory '{}': {}",
                dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();
        let output_path = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            &frame,
        );

        match run_one(input_path, &output_path, &frame, &args) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(input: &Path, output: &Path, frame: &FrameConfig, args: &CliArgs) -> Result<(), String> {
    // -- Step 1: Load ------------------------------------------------------
    let image = load_image_sync(input)?;

    // -- Step 2: Place -----------------------------------------------------
    let mut transform = Transform::reset_for_new_image(image.width(), image.height(), frame);
    if let Some(target) = args.zoom {
        transform = transform.set_zoom(target, frame);
    }
    if args.offset_x.is_some() || args.offset_y.is_some() {
        transform = transform.translate(
            args.offset_x.unwrap_or(transform.offset_x),
            args.offset_y.unwrap_or(transform.offset_y),
        );
    }

    // -- Step 3: Render + save ---------------------------------------------
    let rendered = render::render(frame, &transform, &image);
    encode_and_write(&rendered, output).map_err(|e| format!("save failed: {}", e))?;
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, single-file input)
/// 2. `--output-dir` (batch directory, `{stem}_{w}x{h}.png`)
/// 3. Fallback: `{stem}_{w}x{h}.png` next to the input file. Stem-based so
///    that batch inputs from the same directory never collide with each
///    other (or with the input itself).
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    frame: &FrameConfig,
) -> PathBuf {
    if let Some(out) = output {
        return out.to_path_buf();
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());
    let name = format!("{}_{}x{}.png", stem, frame.width, frame.height);

    if let Some(dir) = output_dir {
        return dir.join(name);
    }

    input.parent().unwrap_or(Path::new(".")).join(name)
}
