//! Ordered collection of images with a current and a previously viewed one.
//!
//! Only the current image is read. Reads run inline, or on the background
//! [`Loader`] once one is attached; either way the pixel buffer reaches the
//! record in one step.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::channel::ChannelView;
use crate::config::ViewerConfig;
use crate::display::DisplaySettings;
use crate::error::{IvError, Result};
use crate::image::{DisplayFrame, ImageRecord, ReadOutcome, RecordId, StateKind};
use crate::io::{Decoder, FileDecoder};
use crate::loader::{LoadEvent, Loader};

#[derive(Clone, Copy, Debug)]
struct PendingLoad {
    ticket: u64,
    subimage: usize,
}

/// What a [`ImageCollection::poll_loader`] call applied.
#[derive(Debug, Default)]
pub struct LoadPoll {
    /// Records whose pixels were installed.
    pub installed: Vec<RecordId>,
    /// Messages of reads that failed.
    pub errors: Vec<String>,
    /// Latest progress of the current image's read, if one is in flight.
    pub progress: Option<f32>,
}

pub struct ImageCollection {
    images: Vec<ImageRecord>,
    current: Option<usize>,
    last: Option<usize>,
    decoder: Arc<dyn Decoder>,
    config: ViewerConfig,
    loader: Option<Loader>,
    pending: HashMap<RecordId, PendingLoad>,
}

impl ImageCollection {
    pub fn new(decoder: Arc<dyn Decoder>, config: ViewerConfig) -> Self {
        Self {
            images: Vec::new(),
            current: None,
            last: None,
            decoder,
            config,
            loader: None,
            pending: HashMap::new(),
        }
    }

    /// A collection reading files from disk.
    pub fn with_config(config: ViewerConfig) -> Self {
        Self::new(Arc::new(FileDecoder), config)
    }

    /// Hand pixel reads to `loader` from now on. Events it produces must be
    /// fed back through [`poll_loader`](Self::poll_loader).
    pub fn attach_loader(&mut self, loader: Loader) {
        self.loader = Some(loader);
    }

    pub fn decoder(&self) -> Arc<dyn Decoder> {
        Arc::clone(&self.decoder)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn get(&self, index: usize) -> Option<&ImageRecord> {
        self.images.get(index)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn last_index(&self) -> Option<usize> {
        self.last
    }

    pub fn current(&self) -> Option<&ImageRecord> {
        self.current.map(|i| &self.images[i])
    }

    pub fn current_mut(&mut self) -> Option<&mut ImageRecord> {
        match self.current {
            Some(i) => Some(&mut self.images[i]),
            None => None,
        }
    }

    pub fn index_of(&self, id: RecordId) -> Option<usize> {
        self.images.iter().position(|r| r.id() == id)
    }

    /// Snapshot of what the current image shows.
    pub fn current_frame(&self) -> Option<DisplayFrame> {
        self.current().and_then(ImageRecord::display_frame)
    }

    pub fn display_settings(&self, channel: ChannelView) -> Option<DisplaySettings> {
        self.current()
            .map(|record| DisplaySettings::for_record(record, channel))
    }

    /// True while a background read of the current image is outstanding.
    pub fn is_loading(&self) -> bool {
        self.current()
            .is_some_and(|r| self.pending.contains_key(&r.id()))
    }

    /// Append an image. With `fetch_spec_now` its header is read at once and
    /// the record is `SpecResident` or `Broken` before anyone lists it.
    /// The first image added to an empty collection becomes current; nothing
    /// is read for it until it is selected.
    pub fn add_image(&mut self, path: impl Into<PathBuf>, fetch_spec_now: bool) -> usize {
        let mut record = ImageRecord::new(path);
        if fetch_spec_now {
            // A failure leaves the record Broken with its message set.
            let _ = record.init_spec(self.decoder.as_ref());
        }
        self.images.push(record);
        let index = self.images.len() - 1;
        if self.current.is_none() {
            self.current = Some(index);
        }
        index
    }

    /// Add several images using the configured header policy.
    pub fn add_images<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let fetch = self.config.fetch_spec_on_add;
        for path in paths {
            self.add_image(path, fetch);
        }
    }

    /// Make `index` current and read it unless its pixels are resident.
    /// The previous current image becomes the toggle target.
    pub fn select(&mut self, index: usize) -> Result<ReadOutcome> {
        if index >= self.images.len() {
            return Err(IvError::IndexOutOfRange {
                index,
                len: self.images.len(),
            });
        }
        if self.current != Some(index) {
            if let Some(previous) = self.current {
                self.last = Some(previous);
            }
            self.current = Some(index);
        }
        self.ensure_current(false)
    }

    /// Next image, wrapping from the last to the first. No-op when empty.
    pub fn next(&mut self) -> Result<Option<ReadOutcome>> {
        let n = self.images.len();
        match self.current {
            Some(c) if n > 0 => self.select((c + 1) % n).map(Some),
            _ => Ok(None),
        }
    }

    /// Previous image, wrapping from the first to the last. No-op when empty.
    pub fn prev(&mut self) -> Result<Option<ReadOutcome>> {
        let n = self.images.len();
        match self.current {
            Some(c) if n > 0 => self.select((c + n - 1) % n).map(Some),
            _ => Ok(None),
        }
    }

    /// Jump back to the previously viewed image. Twice returns to the start.
    pub fn toggle_last(&mut self) -> Result<Option<ReadOutcome>> {
        match self.last {
            Some(last) if last < self.images.len() => self.select(last).map(Some),
            _ => Ok(None),
        }
    }

    /// Remove the current image and release it. The image that followed it
    /// becomes current (the first one if the last was closed).
    pub fn close_current(&mut self) -> Result<Option<ReadOutcome>> {
        let Some(index) = self.current else {
            return Ok(None);
        };
        let mut record = self.images.remove(index);
        self.pending.remove(&record.id());
        record.release();
        tracing::debug!(path = %record.path().display(), "closed image");

        self.last = match self.last {
            Some(l) if l == index => None,
            Some(l) if l > index => Some(l - 1),
            other => other,
        };
        self.current = if self.images.is_empty() {
            None
        } else if index < self.images.len() {
            Some(index)
        } else {
            Some(0)
        };
        if self.last == self.current {
            self.last = None;
        }

        match self.current {
            Some(_) => self.ensure_current(false).map(Some),
            None => Ok(None),
        }
    }

    /// Step the current image's subimage by `delta`, clamped to the valid
    /// range, and read the new subimage.
    pub fn set_subimage(&mut self, delta: isize) -> Result<Option<ReadOutcome>> {
        let decoder = Arc::clone(&self.decoder);
        let Some(record) = self.current_mut() else {
            return Ok(None);
        };
        if !record.is_spec_valid() {
            record.init_spec(decoder.as_ref())?;
        }
        let last = record.nsubimages().saturating_sub(1) as isize;
        let target = (record.subimage() as isize + delta).clamp(0, last) as usize;
        if target == record.subimage() {
            return Ok(None);
        }
        record.select_subimage(target)?;
        self.ensure_current(false).map(Some)
    }

    /// Re-read the current image from disk even if its pixels are resident.
    pub fn reload(&mut self) -> Result<Option<ReadOutcome>> {
        match self.current {
            Some(_) => self.ensure_current(true).map(Some),
            None => Ok(None),
        }
    }

    /// Shift the current image's exposure by `stops`. Returns the new value.
    pub fn adjust_exposure(&mut self, stops: f32) -> Option<f32> {
        let record = self.current_mut()?;
        record.set_exposure(record.exposure() + stops);
        Some(record.exposure())
    }

    /// Shift the current image's gamma by `delta`, never below the
    /// configured minimum. Returns the new value.
    pub fn adjust_gamma(&mut self, delta: f32) -> Option<f32> {
        let min_gamma = self.config.min_gamma;
        let record = self.current_mut()?;
        record.set_gamma((record.gamma() + delta).max(min_gamma));
        Some(record.gamma())
    }

    /// Make sure the current image's pixels are resident or on their way.
    pub fn ensure_current(&mut self, force: bool) -> Result<ReadOutcome> {
        let Some(index) = self.current else {
            return Err(IvError::IndexOutOfRange { index: 0, len: 0 });
        };
        let record = &mut self.images[index];
        let subimage = record.subimage();

        let Some(loader) = self.loader.as_mut() else {
            return record.read(self.decoder.as_ref(), subimage, force, &|_: f32| {});
        };

        if !force && record.has_pixels_for(subimage) {
            return Ok(ReadOutcome::Cached);
        }
        if let Some(pending) = self.pending.get(&record.id()) {
            if !force && pending.subimage == subimage {
                return Ok(ReadOutcome::Queued {
                    ticket: pending.ticket,
                });
            }
        }

        if let Err(e) = record.prepare_read(self.decoder.as_ref(), subimage) {
            // Whatever was in flight belongs to a header that no longer holds.
            self.pending.remove(&record.id());
            return Err(e);
        }
        let ticket = loader.request(record.id(), record.path().to_path_buf(), subimage);
        self.pending
            .insert(record.id(), PendingLoad { ticket, subimage });
        Ok(ReadOutcome::Queued { ticket })
    }

    /// Apply one loader event. Returns `Ok(true)` when pixels were
    /// installed. Results for closed images, superseded requests, a
    /// subimage that is no longer selected or a record that is not waiting
    /// for pixels (e.g. one that turned Broken) are dropped.
    pub fn apply_load(&mut self, event: LoadEvent) -> Result<bool> {
        let LoadEvent::Finished {
            record: id,
            ticket,
            result,
        } = event
        else {
            return Ok(false);
        };

        let pending = match self.pending.get(&id) {
            Some(p) if p.ticket == ticket => *p,
            _ => {
                tracing::debug!(record = %id, ticket, "dropping superseded read");
                return Ok(false);
            }
        };
        self.pending.remove(&id);

        let Some(index) = self.index_of(id) else {
            return Ok(false);
        };
        let record = &mut self.images[index];
        if record.subimage() != pending.subimage {
            tracing::debug!(record = %id, ticket, "dropping read of a deselected subimage");
            return Ok(false);
        }
        if record.kind() != StateKind::SpecResident {
            tracing::debug!(record = %id, ticket, state = %record.kind(), "dropping read for a record not awaiting pixels");
            return Ok(false);
        }
        match result {
            Ok(buffer) => {
                record.install_pixels(Arc::new(buffer));
                Ok(true)
            }
            Err(e) => {
                let message = e.to_string();
                record.fail_read(e);
                Err(IvError::Broken {
                    path: record.path().to_path_buf(),
                    reason: message,
                })
            }
        }
    }

    /// Drain and apply every event the loader has produced so far.
    pub fn poll_loader(&mut self) -> LoadPoll {
        let events = match &self.loader {
            Some(loader) => loader.drain(),
            None => return LoadPoll::default(),
        };
        let current = self.current().map(ImageRecord::id);
        let mut poll = LoadPoll::default();
        for event in events {
            if let LoadEvent::Progress { record, ticket, done } = event {
                let live = self.pending.get(&record).is_some_and(|p| p.ticket == ticket);
                if live && Some(record) == current {
                    poll.progress = Some(done);
                }
                continue;
            }
            let id = event.record();
            match self.apply_load(event) {
                Ok(true) => {
                    poll.installed.push(id);
                    if Some(id) == current {
                        poll.progress = None;
                    }
                }
                Ok(false) => {}
                Err(e) => poll.errors.push(e.to_string()),
            }
        }
        poll
    }
}
