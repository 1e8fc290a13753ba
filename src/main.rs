mod app;

use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use entity_topology::{CanvasSize, TopologyConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with `nodes` and `edges`, optionally wrapped in `{"graph": ...}`.
    #[arg(long)]
    graph: PathBuf,

    /// JSON file overriding topology tuning values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = CanvasSize::DEFAULT.width)]
    width: f32,

    #[arg(long, default_value_t = CanvasSize::DEFAULT.height)]
    height: f32,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TopologyConfig> {
    let Some(path) = path else {
        return Ok(TopologyConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    TopologyConfig::from_json_str(&raw)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    let canvas = CanvasSize::new(args.width, args.height)?;
    tracing::info!(graph = %args.graph.display(), "starting topology viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([canvas.width + 420.0, canvas.height + 160.0]),
        ..Default::default()
    };

    eframe::run_native(
        "entity-topology",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::TopologyApp::new(
                cc,
                args.graph.clone(),
                config.clone(),
                canvas,
            )))
        }),
    )
    .map_err(|error| anyhow::anyhow!("viewer exited with an error: {error}"))
}
