use std::path::PathBuf;
use std::sync::mpsc;

use iv_core::channel::ChannelView;
use iv_core::config::ViewerConfig;
use iv_core::error::Result;
use iv_core::image::ReadOutcome;
use iv_core::loader::Loader;
use iv_core::navigator::ImageCollection;
use iv_core::render::{create_backend, DisplayBackend};
use iv_core::viewport::Viewport;

use crate::commands::{self, Command};
use crate::convert::rgba_to_color_image;
use crate::panels;
use crate::state::{RenderKey, StatusState, ViewState};

pub struct ViewerApp {
    pub images: ImageCollection,
    pub viewport: Viewport,
    pub channel: ChannelView,
    pub backend: Box<dyn DisplayBackend>,
    pub view: ViewState,
    pub status: StatusState,
    pub open_tx: mpsc::Sender<Vec<PathBuf>>,
    pub ctx: egui::Context,
    open_rx: mpsc::Receiver<Vec<PathBuf>>,
}

impl ViewerApp {
    pub fn new(ctx: &egui::Context, config: ViewerConfig, files: Vec<PathBuf>) -> Self {
        let viewport = config.viewport();
        let backend = create_backend(config.device);
        let mut images = ImageCollection::with_config(config);

        let repaint = ctx.clone();
        match Loader::spawn_with_notify(images.decoder(), move || repaint.request_repaint()) {
            Ok(loader) => images.attach_loader(loader),
            Err(e) => tracing::warn!("background loader unavailable, reading inline: {e}"),
        }

        let (open_tx, open_rx) = mpsc::channel();
        let mut app = Self {
            images,
            viewport,
            channel: ChannelView::FullColor,
            backend,
            view: ViewState::default(),
            status: StatusState::default(),
            open_tx,
            ctx: ctx.clone(),
            open_rx,
        };
        app.status
            .add_log(format!("Display backend: {}", app.backend.name()));
        app.open_files(files);
        app
    }

    /// Append files and show the first of them.
    pub fn open_files(&mut self, files: Vec<PathBuf>) {
        if files.is_empty() {
            return;
        }
        let first = self.images.len();
        self.images.add_images(files);
        for record in &self.images.images()[first..] {
            if record.is_broken() {
                self.status
                    .add_log(format!("ERROR: {}", record.error_message()));
            }
        }
        let outcome = self.images.select(first);
        self.report(outcome.map(Some));
    }

    /// Apply loader events and files picked in the open dialog.
    fn poll_background(&mut self) {
        while let Ok(files) = self.open_rx.try_recv() {
            self.open_files(files);
        }

        let poll = self.images.poll_loader();
        let current = self.images.current().map(|r| r.id());
        if poll.installed.iter().any(|id| Some(*id) == current) {
            self.view.invalidate();
        }
        for message in poll.errors {
            self.status.add_log(format!("ERROR: {message}"));
        }
        self.status.progress = if self.images.is_loading() {
            poll.progress.or(self.status.progress).or(Some(0.0))
        } else {
            None
        };
    }

    fn report(&mut self, result: Result<Option<ReadOutcome>>) {
        match result {
            Ok(Some(ReadOutcome::Loaded)) => {
                if let Some(record) = self.images.current() {
                    self.status
                        .add_log(format!("Read {} ({})", record.name(), record.short_info()));
                }
            }
            Ok(_) => {}
            Err(e) => self.status.add_log(format!("ERROR: {e}")),
        }
        self.view.invalidate();
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Open => panels::menu_bar::open_files_dialog(self),
            Command::NextImage => {
                let r = self.images.next();
                self.report(r);
            }
            Command::PrevImage => {
                let r = self.images.prev();
                self.report(r);
            }
            Command::ToggleLast => {
                let r = self.images.toggle_last();
                self.report(r);
            }
            Command::CloseImage => {
                let r = self.images.close_current();
                if self.images.is_empty() {
                    self.viewport.clear_image();
                    self.view.texture = None;
                }
                self.report(r);
            }
            Command::Reload => {
                let r = self.images.reload();
                self.report(r);
            }
            Command::NextSubimage => {
                let r = self.images.set_subimage(1);
                self.report(r);
            }
            Command::PrevSubimage => {
                let r = self.images.set_subimage(-1);
                self.report(r);
            }
            Command::Channel(view) => self.channel = view,
            Command::CycleChannel(direction) => {
                if let Some(record) = self.images.current() {
                    self.channel = self.channel.cycle(record.nchannels(), direction);
                }
            }
            Command::Exposure(stops) => {
                self.images.adjust_exposure(stops);
            }
            Command::Gamma(delta) => {
                self.images.adjust_gamma(delta);
            }
            Command::ZoomIn => self.viewport.zoom_in(),
            Command::ZoomOut => self.viewport.zoom_out(),
            Command::NormalSize => self.viewport.normal_size(),
            Command::FitToWindow => self.view.fit_pending = true,
            Command::ToggleInfo => self.status.show_info = !self.status.show_info,
            Command::ToggleCloseup => self.status.show_closeup = !self.status.show_closeup,
        }
    }

    /// Re-render the view texture when the frame, display settings or
    /// geometry changed since the last render.
    pub fn refresh_texture(&mut self, ctx: &egui::Context) {
        let (ww, wh) = self.view.window_size;
        let (Some(frame), Some(settings)) = (
            self.images.current_frame(),
            self.images.display_settings(self.channel),
        ) else {
            return;
        };
        self.viewport
            .set_image(frame.pixels.width(), frame.pixels.height());
        if self.view.fit_pending && ww > 0 && wh > 0 {
            self.viewport.fit_to_window(ww, wh);
            self.view.fit_pending = false;
        }

        let key = RenderKey {
            frame: frame.key,
            settings,
            view: self.viewport.geometry(ww, wh),
        };
        if !self.view.needs_render(&key) {
            return;
        }

        match self.backend.render(&frame, &settings, &key.view) {
            Ok(rendered) => {
                let image = rgba_to_color_image(&rendered);
                match self.view.texture.as_mut() {
                    Some(texture) => texture.set(image, egui::TextureOptions::NEAREST),
                    None => {
                        self.view.texture =
                            Some(ctx.load_texture("viewport", image, egui::TextureOptions::NEAREST));
                    }
                }
                self.view.rendered = Some(key);
                self.view.failed = None;
            }
            Err(e) => {
                // Released resources are rebuilt by the retry on the next update.
                self.backend.release();
                if self.view.record_failure(key) {
                    tracing::warn!("render failed on {}: {e}", self.backend.name());
                    self.status.add_log(format!("ERROR: {e}"));
                }
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background();

        for command in commands::collect(ctx, self.images.config()) {
            self.apply(command);
        }

        panels::menu_bar::show(ctx, self);
        panels::status::show(ctx, self);
        panels::viewport::show(ctx, self);
        panels::windows::show(ctx, self);

        let title = match self.images.current() {
            Some(record) => format!("iv - {}", record.name()),
            None => "iv".to_string(),
        };
        if title != self.view.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.view.title = title;
        }
    }
}
