pub mod config;
pub mod info;
pub mod pixel;
pub mod render;

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use iv_core::config::ViewerConfig;
use iv_core::image::ImageRecord;
use iv_core::io::FileDecoder;

/// Load a TOML viewer config, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Invalid viewer config {}", path.display()))
        }
        None => Ok(ViewerConfig::default()),
    }
}

/// Read one subimage of `path` with a progress bar.
pub fn read_with_progress(path: &Path, subimage: usize) -> Result<ImageRecord> {
    let mut record = ImageRecord::new(path);

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}%")?
            .progress_chars("=> "),
    );
    pb.set_message(record.name());

    let progress = |done: f32| pb.set_position((done * 100.0) as u64);
    let result = record.read(&FileDecoder, subimage, false, &progress);
    match result {
        Ok(_) => {
            pb.finish_and_clear();
            Ok(record)
        }
        Err(e) => {
            pb.abandon();
            Err(e).with_context(|| format!("Failed to read {}", path.display()))
        }
    }
}
