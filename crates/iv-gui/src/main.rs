mod app;
mod commands;
mod convert;
mod panels;
mod state;

use std::path::{Path, PathBuf};

use anyhow::Context;
use iv_core::config::ViewerConfig;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let (config_path, files) = parse_args(std::env::args().skip(1));
    let config = match config_path {
        Some(path) => load_config(&path).unwrap_or_else(|e| {
            tracing::error!("{e:#}");
            ViewerConfig::default()
        }),
        None => ViewerConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_min_inner_size([320.0, 240.0])
            .with_title("iv"),
        ..Default::default()
    };

    eframe::run_native(
        "iv",
        options,
        Box::new(|cc| Ok(Box::new(app::ViewerApp::new(&cc.egui_ctx, config, files)))),
    )
}

/// Split `--config <file>` from the image paths.
fn parse_args(mut args: impl Iterator<Item = String>) -> (Option<PathBuf>, Vec<PathBuf>) {
    let mut config = None;
    let mut files = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config = args.next().map(PathBuf::from);
        } else if let Some(path) = arg.strip_prefix("--config=") {
            config = Some(PathBuf::from(path));
        } else {
            files.push(PathBuf::from(arg));
        }
    }
    (config, files)
}

fn load_config(path: &Path) -> anyhow::Result<ViewerConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Invalid viewer config {}", path.display()))
}
