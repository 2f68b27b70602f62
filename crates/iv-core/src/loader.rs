//! Pixel reads on a background thread.
//!
//! The worker owns nothing but the decoder. A finished buffer travels back
//! whole inside [`LoadEvent::Finished`] and is installed by the owner of the
//! record in a single step, so a half-read buffer is never visible.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::buffer::PixelBuffer;
use crate::error::Result;
use crate::image::RecordId;
use crate::io::Decoder;

/// One pixel read job.
#[derive(Clone, Debug)]
pub struct LoadRequest {
    pub record: RecordId,
    /// Issued by [`Loader::request`]; newer requests carry larger tickets.
    pub ticket: u64,
    pub path: PathBuf,
    pub subimage: usize,
}

/// Messages from the worker thread.
#[derive(Debug)]
pub enum LoadEvent {
    Progress {
        record: RecordId,
        ticket: u64,
        done: f32,
    },
    Finished {
        record: RecordId,
        ticket: u64,
        result: Result<PixelBuffer>,
    },
}

impl LoadEvent {
    pub fn record(&self) -> RecordId {
        match self {
            Self::Progress { record, .. } | Self::Finished { record, .. } => *record,
        }
    }

    pub fn ticket(&self) -> u64 {
        match self {
            Self::Progress { ticket, .. } | Self::Finished { ticket, .. } => *ticket,
        }
    }
}

type Notify = Arc<dyn Fn() + Send + Sync>;

pub struct Loader {
    cmd_tx: Option<mpsc::Sender<LoadRequest>>,
    event_rx: mpsc::Receiver<LoadEvent>,
    handle: Option<JoinHandle<()>>,
    next_ticket: u64,
}

impl Loader {
    pub fn spawn(decoder: Arc<dyn Decoder>) -> Result<Self> {
        Self::spawn_with_notify(decoder, || {})
    }

    /// `notify` runs on the worker after every event is queued, e.g. to wake
    /// a UI event loop.
    pub fn spawn_with_notify(
        decoder: Arc<dyn Decoder>,
        notify: impl Fn() + Send + Sync + 'static,
    ) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<LoadRequest>();
        let (event_tx, event_rx) = mpsc::channel::<LoadEvent>();
        let notify: Notify = Arc::new(notify);

        let handle = std::thread::Builder::new()
            .name("iv-loader".into())
            .spawn(move || loader_loop(decoder, cmd_rx, event_tx, notify))?;

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            event_rx,
            handle: Some(handle),
            next_ticket: 1,
        })
    }

    /// Queue a read of `subimage` of `path` and return its ticket.
    pub fn request(&mut self, record: RecordId, path: PathBuf, subimage: usize) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let job = LoadRequest {
            record,
            ticket,
            path,
            subimage,
        };
        if let Some(tx) = &self.cmd_tx {
            if tx.send(job).is_err() {
                tracing::warn!("loader thread is gone, request {ticket} dropped");
            }
        }
        ticket
    }

    pub fn try_recv(&self) -> Option<LoadEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<LoadEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Drain everything queued so far.
    pub fn drain(&self) -> Vec<LoadEvent> {
        self.event_rx.try_iter().collect()
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        // Closing the command channel ends the worker loop.
        self.cmd_tx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("loader thread panicked");
            }
        }
    }
}

fn send(tx: &mpsc::Sender<LoadEvent>, notify: &Notify, event: LoadEvent) {
    let _ = tx.send(event);
    notify();
}

fn loader_loop(
    decoder: Arc<dyn Decoder>,
    cmd_rx: mpsc::Receiver<LoadRequest>,
    event_tx: mpsc::Sender<LoadEvent>,
    notify: Notify,
) {
    while let Ok(job) = cmd_rx.recv() {
        let LoadRequest {
            record,
            ticket,
            path,
            subimage,
        } = job;
        tracing::debug!(path = %path.display(), subimage, ticket, "background read");

        let progress = {
            let tx = event_tx.clone();
            let notify = Arc::clone(&notify);
            move |done: f32| {
                send(&tx, &notify, LoadEvent::Progress { record, ticket, done });
            }
        };
        let result = decoder.read_pixels(&path, subimage, &progress);
        send(&event_tx, &notify, LoadEvent::Finished { record, ticket, result });
    }
    tracing::debug!("loader thread exiting");
}
