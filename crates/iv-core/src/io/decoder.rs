use std::path::Path;

use crate::buffer::PixelBuffer;
use crate::error::Result;
use crate::spec::ImageSpec;

use super::{raster, ser};

/// Advisory progress sink for pixel reads, called with a fraction in [0, 1].
///
/// Reads cannot be cancelled through this hook; it only reports.
pub trait ReadProgress: Send + Sync {
    fn report(&self, _done: f32) {}
}

impl<F: Fn(f32) + Send + Sync> ReadProgress for F {
    fn report(&self, done: f32) {
        self(done.clamp(0.0, 1.0))
    }
}

/// The image decoding contract consumed by the image model.
pub trait Decoder: Send + Sync {
    /// Open `path` just far enough to describe subimage 0 and count subimages.
    fn open_spec(&self, path: &Path) -> Result<ImageSpec>;

    /// Read every pixel of one subimage.
    fn read_pixels(
        &self,
        path: &Path,
        subimage: usize,
        progress: &dyn ReadProgress,
    ) -> Result<PixelBuffer>;
}

/// Decoder for files on disk: SER videos (one subimage per frame) via a
/// memory-mapped reader, everything else through the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileDecoder;

impl FileDecoder {
    fn is_ser(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ser"))
    }
}

impl Decoder for FileDecoder {
    fn open_spec(&self, path: &Path) -> Result<ImageSpec> {
        tracing::debug!(path = %path.display(), "reading header");
        if Self::is_ser(path) {
            Ok(ser::SerReader::open(path)?.spec())
        } else {
            raster::read_spec(path)
        }
    }

    fn read_pixels(
        &self,
        path: &Path,
        subimage: usize,
        progress: &dyn ReadProgress,
    ) -> Result<PixelBuffer> {
        tracing::debug!(path = %path.display(), subimage, "reading pixels");
        if Self::is_ser(path) {
            ser::SerReader::open(path)?.read_subimage(subimage, progress)
        } else {
            raster::read_pixels(path, subimage, progress)
        }
    }
}
