//! One image known to the viewer: on-disk identity, cached spec, resident
//! pixels and per-image display parameters.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::buffer::PixelBuffer;
use crate::consts::{DEFAULT_EXPOSURE, DEFAULT_GAMMA};
use crate::error::{IvError, Result};
use crate::io::{Decoder, ReadProgress};
use crate::spec::ImageSpec;

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an [`ImageRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordId(u64);

impl RecordId {
    fn next() -> Self {
        Self(NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of an image record.
#[derive(Clone, Debug, Default)]
pub enum ImageState {
    /// No path assigned.
    #[default]
    Uninitialized,
    /// The file could not be opened. Left only by a fresh `init_spec`/`read`.
    Broken,
    /// Path known, header not fetched yet.
    KnownUnread,
    /// Header read; pixels absent. `stale` keeps the last good frame (if any)
    /// so a display can keep showing it after a failed or pending read.
    SpecResident {
        spec: ImageSpec,
        stale: Option<Arc<PixelBuffer>>,
    },
    /// Pixels valid for the record's current subimage.
    PixelsResident {
        spec: ImageSpec,
        pixels: Arc<PixelBuffer>,
    },
}

/// Data-free view of [`ImageState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    Uninitialized,
    Broken,
    KnownUnread,
    SpecResident,
    PixelsResident,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Broken => write!(f, "broken"),
            Self::KnownUnread => write!(f, "not read"),
            Self::SpecResident => write!(f, "header only"),
            Self::PixelsResident => write!(f, "resident"),
        }
    }
}

impl ImageState {
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Uninitialized => StateKind::Uninitialized,
            Self::Broken => StateKind::Broken,
            Self::KnownUnread => StateKind::KnownUnread,
            Self::SpecResident { .. } => StateKind::SpecResident,
            Self::PixelsResident { .. } => StateKind::PixelsResident,
        }
    }

    fn spec(&self) -> Option<&ImageSpec> {
        match self {
            Self::SpecResident { spec, .. } | Self::PixelsResident { spec, .. } => Some(spec),
            _ => None,
        }
    }

    /// Whatever frame a display could show: resident pixels or the last good one.
    fn last_good(&self) -> Option<&Arc<PixelBuffer>> {
        match self {
            Self::PixelsResident { pixels, .. } => Some(pixels),
            Self::SpecResident { stale, .. } => stale.as_ref(),
            _ => None,
        }
    }
}

/// What a successful [`ImageRecord::read`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Pixels were already resident for the subimage; no disk access.
    Cached,
    /// Header and pixels were read from disk.
    Loaded,
    /// Header was refreshed and the pixel read handed to the background
    /// loader under this ticket.
    Queued { ticket: u64 },
}

/// Identifies one pixel revision of one record. Renderers key uploads on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameKey {
    pub record: RecordId,
    pub revision: u64,
}

/// Consistent (spec, pixels) snapshot handed to renderers and inspectors.
#[derive(Clone, Debug)]
pub struct DisplayFrame {
    pub key: FrameKey,
    pub pixels: Arc<PixelBuffer>,
}

impl DisplayFrame {
    pub fn spec(&self) -> &ImageSpec {
        self.pixels.spec()
    }
}

/// Downsampled copy of the resident pixels.
#[derive(Clone, Debug)]
pub struct Thumbnail {
    pub revision: u64,
    pub pixels: PixelBuffer,
}

#[derive(Debug)]
pub struct ImageRecord {
    id: RecordId,
    path: PathBuf,
    state: ImageState,
    subimage: usize,
    /// Bumped every time a pixel buffer is installed.
    revision: u64,
    thumbnail: Option<Thumbnail>,
    gamma: f32,
    exposure: f32,
    error: String,
}

impl Default for ImageRecord {
    fn default() -> Self {
        Self {
            id: RecordId::next(),
            path: PathBuf::new(),
            state: ImageState::Uninitialized,
            subimage: 0,
            revision: 0,
            thumbnail: None,
            gamma: DEFAULT_GAMMA,
            exposure: DEFAULT_EXPOSURE,
            error: String::new(),
        }
    }
}

impl ImageRecord {
    /// A record for `path` in the `KnownUnread` state (or `Uninitialized` for
    /// an empty path). Nothing is read from disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = if path.as_os_str().is_empty() {
            ImageState::Uninitialized
        } else {
            ImageState::KnownUnread
        };
        Self {
            path,
            state,
            ..Self::default()
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for titles and listings.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn state(&self) -> &ImageState {
        &self.state
    }

    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn spec(&self) -> Option<&ImageSpec> {
        self.state.spec()
    }

    pub fn is_spec_valid(&self) -> bool {
        self.state.spec().is_some()
    }

    pub fn is_pixels_valid(&self) -> bool {
        matches!(self.state, ImageState::PixelsResident { .. })
    }

    pub fn is_thumbnail_valid(&self) -> bool {
        self.thumbnail
            .as_ref()
            .is_some_and(|t| self.is_pixels_valid() && t.revision == self.revision)
    }

    pub fn is_broken(&self) -> bool {
        matches!(self.state, ImageState::Broken)
    }

    /// Resident pixels of the current subimage, `None` unless `PixelsResident`.
    pub fn pixels(&self) -> Option<&Arc<PixelBuffer>> {
        match &self.state {
            ImageState::PixelsResident { pixels, .. } => Some(pixels),
            _ => None,
        }
    }

    /// Frame to display: the resident pixels, or the last good frame kept
    /// across a failed or pending read.
    pub fn display_frame(&self) -> Option<DisplayFrame> {
        self.state.last_good().map(|pixels| DisplayFrame {
            key: FrameKey {
                record: self.id,
                revision: self.revision,
            },
            pixels: Arc::clone(pixels),
        })
    }

    /// Like [`display_frame`](Self::display_frame), but an error naming the
    /// file when nothing was ever read.
    pub fn frame(&self) -> Result<DisplayFrame> {
        self.display_frame()
            .ok_or_else(|| IvError::NotResident(self.path.clone()))
    }

    pub fn subimage(&self) -> usize {
        self.subimage
    }

    pub fn nsubimages(&self) -> usize {
        self.spec().map_or(0, |s| s.nsubimages)
    }

    pub fn nchannels(&self) -> usize {
        self.spec().map_or(0, |s| s.nchannels)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    pub fn set_gamma(&mut self, gamma: f32) {
        self.gamma = gamma;
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    /// Last error, empty when the latest operation succeeded.
    pub fn error_message(&self) -> &str {
        &self.error
    }

    /// Return the last error and clear it.
    pub fn take_error_message(&mut self) -> String {
        std::mem::take(&mut self.error)
    }

    fn fail(&mut self, err: IvError) -> IvError {
        self.error = err.to_string();
        err
    }

    /// Re-read the file header. Always goes to disk, the file may have changed
    /// since the last look. Never allocates pixel storage.
    pub fn init_spec(&mut self, decoder: &dyn Decoder) -> Result<&ImageSpec> {
        self.error.clear();
        if self.path.as_os_str().is_empty() {
            return Err(self.fail(IvError::Broken {
                path: PathBuf::new(),
                reason: "no file name".into(),
            }));
        }

        match decoder.open_spec(&self.path) {
            Ok(spec) => {
                if self.subimage >= spec.nsubimages {
                    self.subimage = 0;
                }
                let state = std::mem::take(&mut self.state);
                self.state = match state {
                    ImageState::PixelsResident { pixels, .. }
                        if same_layout(pixels.spec(), &spec)
                            && pixels.subimage() == self.subimage =>
                    {
                        ImageState::PixelsResident { spec, pixels }
                    }
                    other => {
                        self.thumbnail = None;
                        ImageState::SpecResident {
                            spec,
                            stale: other.last_good().cloned(),
                        }
                    }
                };
                Ok(self
                    .state
                    .spec()
                    .expect("state holds a spec after a successful header read"))
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "cannot open image: {e}");
                self.state = ImageState::Broken;
                self.thumbnail = None;
                let err = IvError::Broken {
                    path: self.path.clone(),
                    reason: e.to_string(),
                };
                Err(self.fail(err))
            }
        }
    }

    /// Make pixels of `subimage` resident.
    ///
    /// Returns [`ReadOutcome::Cached`] without touching the disk when those
    /// pixels are already resident and `force` is false. Otherwise reads the
    /// header and pixels; the new buffer replaces the old one only once it is
    /// complete. On a pixel read failure the record drops back to
    /// `SpecResident` keeping the previous frame as the last good one.
    pub fn read(
        &mut self,
        decoder: &dyn Decoder,
        subimage: usize,
        force: bool,
        progress: &dyn ReadProgress,
    ) -> Result<ReadOutcome> {
        if !force && self.has_pixels_for(subimage) {
            return Ok(ReadOutcome::Cached);
        }

        self.prepare_read(decoder, subimage)?;

        match decoder.read_pixels(&self.path, subimage, progress) {
            Ok(buffer) => {
                tracing::debug!(
                    path = %self.path.display(),
                    subimage,
                    bytes = buffer.data().len(),
                    "pixels resident"
                );
                self.install_pixels(Arc::new(buffer));
                Ok(ReadOutcome::Loaded)
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), subimage, "pixel read failed: {e}");
                Err(self.fail(e))
            }
        }
    }

    /// True when pixels for `subimage` are resident.
    pub fn has_pixels_for(&self, subimage: usize) -> bool {
        self.pixels().is_some_and(|p| p.subimage() == subimage) && self.subimage == subimage
    }

    /// Refresh the header and switch to `subimage`, leaving the record in
    /// `SpecResident` with the previous frame kept as the last good one.
    /// This is the first half of a read; the loader thread does the second.
    pub fn prepare_read(&mut self, decoder: &dyn Decoder, subimage: usize) -> Result<()> {
        let total = self.init_spec(decoder)?.nsubimages;
        if subimage >= total {
            return Err(self.fail(IvError::SubimageOutOfRange {
                index: subimage,
                total,
            }));
        }
        self.subimage = subimage;
        self.demote();
        Ok(())
    }

    /// Install a completed pixel buffer in one step.
    pub fn install_pixels(&mut self, pixels: Arc<PixelBuffer>) {
        self.subimage = pixels.subimage();
        self.revision += 1;
        self.thumbnail = None;
        self.state = ImageState::PixelsResident {
            spec: pixels.spec().clone(),
            pixels,
        };
    }

    /// Record a failed background read of the pixels.
    pub fn fail_read(&mut self, err: IvError) {
        tracing::warn!(path = %self.path.display(), "pixel read failed: {err}");
        self.demote();
        self.fail(err);
    }

    /// Switch the current subimage without reading. Resident pixels of another
    /// subimage stop being valid but are kept as the last good frame.
    pub fn select_subimage(&mut self, subimage: usize) -> Result<()> {
        let total = self.nsubimages();
        if subimage >= total {
            return Err(self.fail(IvError::SubimageOutOfRange {
                index: subimage,
                total,
            }));
        }
        if subimage != self.subimage {
            self.subimage = subimage;
            self.demote();
        }
        Ok(())
    }

    /// Drop resident pixels and thumbnail, keeping the header.
    pub fn release(&mut self) {
        self.thumbnail = None;
        self.state = match std::mem::take(&mut self.state) {
            ImageState::PixelsResident { spec, .. } | ImageState::SpecResident { spec, .. } => {
                ImageState::SpecResident { spec, stale: None }
            }
            other => other,
        };
    }

    fn demote(&mut self) {
        self.thumbnail = None;
        self.state = match std::mem::take(&mut self.state) {
            ImageState::PixelsResident { spec, pixels } => ImageState::SpecResident {
                spec,
                stale: Some(pixels),
            },
            other => other,
        };
    }

    /// Byte offset of pixel (x, y) in the resident buffer, `None` if not resident.
    pub fn pixel_offset(&self, x: u32, y: u32) -> Option<usize> {
        self.pixels().map(|p| p.pixel_offset(x, y))
    }

    /// Raw bytes of scanline `y` of the resident buffer.
    ///
    /// # Panics
    /// If `y` is outside the image.
    pub fn scanline(&self, y: u32) -> Option<&[u8]> {
        self.pixels().map(|p| p.scanline(y))
    }

    /// Float values of pixel (x, y). Returns false if no pixels are resident.
    ///
    /// # Panics
    /// If the coordinate is outside the image.
    pub fn get_pixel_f32(&self, x: u32, y: u32, out: &mut [f32]) -> bool {
        match self.pixels() {
            Some(p) => {
                p.get_pixel_f32(x, y, out);
                true
            }
            None => false,
        }
    }

    /// 8-bit values of pixel (x, y). Returns false if no pixels are resident.
    ///
    /// # Panics
    /// If the coordinate is outside the image.
    pub fn get_pixel_u8(&self, x: u32, y: u32, out: &mut [u8]) -> bool {
        match self.pixels() {
            Some(p) => {
                p.get_pixel_u8(x, y, out);
                true
            }
            None => false,
        }
    }

    /// Build (or return the cached) thumbnail whose longest edge is at most
    /// `max_dim` pixels.
    pub fn make_thumbnail(&mut self, max_dim: u32) -> Option<&Thumbnail> {
        if !self.is_thumbnail_valid()
            || self
                .thumbnail
                .as_ref()
                .is_some_and(|t| t.pixels.width().max(t.pixels.height()) > max_dim.max(1))
        {
            let pixels = self.pixels()?;
            let downsampled = downsample(pixels, max_dim.max(1));
            self.thumbnail = Some(Thumbnail {
                revision: self.revision,
                pixels: downsampled,
            });
        }
        self.thumbnail.as_ref()
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref().filter(|_| self.is_thumbnail_valid())
    }

    /// One-line description, e.g. `"640x480 RGB uint8"`.
    pub fn short_info(&self) -> String {
        match self.spec() {
            Some(spec) => {
                let channels = match spec.nchannels {
                    1 => "gray".to_string(),
                    2 => "gray+alpha".to_string(),
                    3 => "RGB".to_string(),
                    4 => "RGBA".to_string(),
                    n => format!("{n}-channel"),
                };
                let mut info = format!(
                    "{}x{} {} {}",
                    spec.width, spec.height, channels, spec.pixel_type
                );
                if spec.nsubimages > 1 {
                    info.push_str(&format!(
                        " ({} of {} subimages)",
                        self.subimage + 1,
                        spec.nsubimages
                    ));
                }
                info
            }
            None if self.is_broken() => "unreadable".to_string(),
            None => String::new(),
        }
    }

    /// Labelled rows describing the image in detail.
    pub fn long_info(&self) -> Vec<(String, String)> {
        let mut rows = vec![("File".to_string(), self.path.display().to_string())];
        if let Some(spec) = self.spec() {
            rows.push(("Format".into(), spec.format.clone()));
            rows.push(("Resolution".into(), format!("{} x {}", spec.width, spec.height)));
            rows.push(("Channels".into(), spec.nchannels.to_string()));
            rows.push(("Channel list".into(), spec.channel_names.join(", ")));
            rows.push(("Pixel type".into(), spec.pixel_type.to_string()));
            rows.push((
                "Subimage".into(),
                format!("{} of {}", self.subimage + 1, spec.nsubimages),
            ));
            rows.extend(spec.attributes.iter().cloned());
        }
        rows.push(("Gamma".into(), format!("{:.2}", self.gamma)));
        rows.push(("Exposure".into(), format!("{:+.2} stops", self.exposure)));
        rows.push(("State".into(), self.kind().to_string()));
        rows
    }
}

fn same_layout(a: &ImageSpec, b: &ImageSpec) -> bool {
    a.width == b.width
        && a.height == b.height
        && a.nchannels == b.nchannels
        && a.pixel_type == b.pixel_type
        && a.nsubimages == b.nsubimages
}

/// Nearest-neighbour downsample keeping aspect ratio and pixel type.
fn downsample(src: &PixelBuffer, max_dim: u32) -> PixelBuffer {
    let (w, h) = (src.width(), src.height());
    let scale = (max_dim as f32 / w.max(h) as f32).min(1.0);
    let tw = ((w as f32 * scale).round() as u32).max(1);
    let th = ((h as f32 * scale).round() as u32).max(1);

    let mut spec = src.spec().clone();
    spec.width = tw;
    spec.height = th;
    let mut data = Vec::with_capacity(spec.image_bytes());
    for ty in 0..th {
        let sy = ((ty as u64 * h as u64) / th as u64) as u32;
        for tx in 0..tw {
            let sx = ((tx as u64 * w as u64) / tw as u64) as u32;
            data.extend_from_slice(src.pixel(sx, sy));
        }
    }
    PixelBuffer::new(spec, src.subimage(), data)
        .expect("downsampled buffer length follows its spec")
}
