use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use iv_core::navigator::ImageCollection;

use crate::summary;

use super::load_config;

#[derive(Args)]
pub struct InfoArgs {
    /// Input image files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Show every header field instead of one line per file
    #[arg(short, long)]
    pub long: bool,

    /// Viewer config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut images = ImageCollection::with_config(config);
    for file in &args.files {
        images.add_image(file.clone(), true);
    }

    let mut broken = 0;
    for record in images.images() {
        if record.is_broken() {
            broken += 1;
            summary::print_broken(record);
        } else if args.long {
            summary::print_long_info(record);
        } else {
            summary::print_short_info(record);
        }
    }

    if broken > 0 {
        tracing::warn!("{broken} of {} files could not be opened", images.len());
    }
    Ok(())
}
