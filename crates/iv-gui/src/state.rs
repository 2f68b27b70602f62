use std::collections::VecDeque;

use iv_core::display::DisplaySettings;
use iv_core::image::FrameKey;
use iv_core::viewport::ViewGeometry;

const MAX_LOG_LINES: usize = 64;

/// What the cached texture was rendered from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderKey {
    pub frame: FrameKey,
    pub settings: DisplaySettings,
    pub view: ViewGeometry,
}

/// Rendered view and window state.
#[derive(Default)]
pub struct ViewState {
    pub texture: Option<egui::TextureHandle>,
    pub rendered: Option<RenderKey>,
    /// Size of the central panel in points at the last layout.
    pub window_size: (u32, u32),
    /// Image pixel under the pointer.
    pub focus: Option<(u32, u32)>,
    /// Set by a fit command, applied once the panel size is known.
    pub fit_pending: bool,
    pub title: String,
    /// Last key whose render failed; it is retried but reported only once.
    pub failed: Option<RenderKey>,
}

impl ViewState {
    pub fn invalidate(&mut self) {
        self.rendered = None;
    }

    /// True when `key` differs from what the texture shows and the window
    /// has an area to draw into.
    pub fn needs_render(&self, key: &RenderKey) -> bool {
        key.view.window_width > 0 && key.view.window_height > 0 && self.rendered != Some(*key)
    }

    /// Forget the texture's key after a failed render so the next update
    /// tries again. Returns true the first time `key` fails.
    pub fn record_failure(&mut self, key: RenderKey) -> bool {
        self.rendered = None;
        let first = self.failed != Some(key);
        self.failed = Some(key);
        first
    }
}

#[derive(Default)]
pub struct StatusState {
    pub log_messages: VecDeque<String>,
    /// Fraction of the current image's background read, if one is running.
    pub progress: Option<f32>,
    pub show_info: bool,
    pub show_closeup: bool,
    pub show_about: bool,
}

impl StatusState {
    pub fn add_log(&mut self, msg: String) {
        if self.log_messages.len() == MAX_LOG_LINES {
            self.log_messages.pop_front();
        }
        self.log_messages.push_back(msg);
    }
}

#[cfg(test)]
mod tests {
    use iv_core::image::ImageRecord;

    use super::*;

    fn key(window: u32) -> RenderKey {
        RenderKey {
            frame: FrameKey {
                record: ImageRecord::new("a.png").id(),
                revision: 1,
            },
            settings: DisplaySettings::default(),
            view: ViewGeometry::actual_size(window, window),
        }
    }

    #[test]
    fn test_failed_render_is_retried() {
        let mut view = ViewState::default();
        let k = key(64);
        assert!(view.needs_render(&k));

        view.rendered = Some(k);
        assert!(!view.needs_render(&k));

        assert!(view.record_failure(k));
        assert!(view.needs_render(&k));
        assert!(!view.record_failure(k));
        assert!(view.needs_render(&k));
    }

    #[test]
    fn test_empty_window_is_not_rendered() {
        let view = ViewState::default();
        assert!(!view.needs_render(&key(0)));
    }
}
