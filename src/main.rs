mod app;
mod util;
mod workflow;

use std::time::Duration;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Simulated per-worker generation latency, in milliseconds.
    #[arg(long, default_value_t = 600)]
    worker_latency_ms: u64,
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };
    let latency = Duration::from_millis(args.worker_latency_ms);

    eframe::run_native(
        "workflow-canvas",
        options,
        Box::new(move |cc| Ok(Box::new(app::WorkflowApp::new(cc, latency)))),
    )
}
