mod app;
mod cli;
mod components;
mod io;
pub mod logger;
mod ops;
mod selection;
mod session;
mod theme;

use app::RetouchApp;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode --------------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title("Retouch"),
        ..Default::default()
    };

    eframe::run_native(
        "Retouch",
        options,
        Box::new(|cc| Box::new(RetouchApp::new(cc))),
    )
}
