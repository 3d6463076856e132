// GUI-subsystem binary: no console window is allocated by Windows in GUI
// mode. CLI mode (--input/-i present) runs headless and never opens a window.
#![windows_subsystem = "windows"]

use std::process::ExitCode;

use cropframe::app::CropFrameApp;
use cropframe::{cli, log_err, logger};
use eframe::egui;

fn main() -> ExitCode {
    // -- CLI / headless mode -------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        return cli::run(args);
    }

    // -- GUI mode --------------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1080.0, 760.0])
            .with_title("CropFrame"),
        ..Default::default()
    };

    match eframe::run_native(
        "CropFrame",
        options,
        Box::new(|cc| Box::new(CropFrameApp::new(cc))),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_err!("eframe failed to start: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
