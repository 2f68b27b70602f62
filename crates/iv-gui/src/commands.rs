//! Keyboard input mapped to viewer commands.

use iv_core::channel::ChannelView;
use iv_core::config::ViewerConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Open,
    NextImage,
    PrevImage,
    ToggleLast,
    CloseImage,
    Reload,
    NextSubimage,
    PrevSubimage,
    Channel(ChannelView),
    /// +1 forward, -1 backward.
    CycleChannel(i32),
    Exposure(f32),
    Gamma(f32),
    ZoomIn,
    ZoomOut,
    NormalSize,
    FitToWindow,
    ToggleInfo,
    ToggleCloseup,
}

/// Command bound to a typed character.
pub fn command_for_char(c: char, config: &ViewerConfig) -> Option<Command> {
    let command = match c {
        't' | 'T' => Command::ToggleLast,
        'w' | 'W' => Command::CloseImage,
        'c' | 'C' => Command::Channel(ChannelView::FullColor),
        'r' | 'R' => Command::Channel(ChannelView::RED),
        'g' | 'G' => Command::Channel(ChannelView::GREEN),
        'b' | 'B' => Command::Channel(ChannelView::BLUE),
        'a' | 'A' => Command::Channel(ChannelView::ALPHA),
        'l' | 'L' => Command::Channel(ChannelView::Luminance),
        ',' => Command::CycleChannel(-1),
        '.' => Command::CycleChannel(1),
        '[' => Command::Exposure(-config.exposure_small_step),
        ']' => Command::Exposure(config.exposure_small_step),
        '{' => Command::Exposure(-config.exposure_large_step),
        '}' => Command::Exposure(config.exposure_large_step),
        '(' => Command::Gamma(-config.gamma_step),
        ')' => Command::Gamma(config.gamma_step),
        '+' | '=' => Command::ZoomIn,
        '-' | '_' => Command::ZoomOut,
        '0' => Command::NormalSize,
        'f' | 'F' => Command::FitToWindow,
        'i' | 'I' => Command::ToggleInfo,
        'p' | 'P' => Command::ToggleCloseup,
        _ => return None,
    };
    Some(command)
}

/// Command bound to a non-text key.
pub fn command_for_key(key: egui::Key, modifiers: egui::Modifiers) -> Option<Command> {
    use egui::Key;

    let command = match key {
        Key::PageDown => Command::NextImage,
        Key::PageUp => Command::PrevImage,
        Key::ArrowDown => Command::NextSubimage,
        Key::ArrowUp => Command::PrevSubimage,
        Key::O if modifiers.command => Command::Open,
        Key::R if modifiers.command => Command::Reload,
        _ => return None,
    };
    Some(command)
}

/// Commands typed this frame. Text events are skipped while a command
/// modifier is held so shortcuts like Ctrl+R do not also pick a channel.
pub fn collect(ctx: &egui::Context, config: &ViewerConfig) -> Vec<Command> {
    ctx.input(|i| {
        let mut commands = Vec::new();
        for event in &i.events {
            match event {
                egui::Event::Text(text) if !i.modifiers.command => {
                    commands.extend(text.chars().filter_map(|c| command_for_char(c, config)));
                }
                egui::Event::Key {
                    key,
                    pressed: true,
                    modifiers,
                    ..
                } => commands.extend(command_for_key(*key, *modifiers)),
                _ => {}
            }
        }
        commands
    })
}
