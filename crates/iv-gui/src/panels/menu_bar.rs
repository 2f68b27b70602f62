use iv_core::channel::ChannelView;

use crate::app::ViewerApp;
use crate::commands::Command;

pub fn show(ctx: &egui::Context, app: &mut ViewerApp) {
    let mut picked = Vec::new();

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                let open_shortcut = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::O);
                if ui.add(egui::Button::new("Open...").shortcut_text(ctx.format_shortcut(&open_shortcut))).clicked() {
                    ui.close();
                    picked.push(Command::Open);
                }

                let reload_shortcut = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::R);
                if ui.add(egui::Button::new("Reload").shortcut_text(ctx.format_shortcut(&reload_shortcut))).clicked() {
                    ui.close();
                    picked.push(Command::Reload);
                }

                if ui.add(egui::Button::new("Close Image").shortcut_text("W")).clicked() {
                    ui.close();
                    picked.push(Command::CloseImage);
                }

                ui.separator();

                let quit_shortcut = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Q);
                if ui.add(egui::Button::new("Quit").shortcut_text(ctx.format_shortcut(&quit_shortcut))).clicked() {
                    ui.close();
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Image", |ui| {
                menu_item(ui, "Next Image", "PgDn", Command::NextImage, &mut picked);
                menu_item(ui, "Previous Image", "PgUp", Command::PrevImage, &mut picked);
                menu_item(ui, "Toggle Last Image", "T", Command::ToggleLast, &mut picked);
                ui.separator();
                menu_item(ui, "Next Subimage", "Down", Command::NextSubimage, &mut picked);
                menu_item(ui, "Previous Subimage", "Up", Command::PrevSubimage, &mut picked);
                ui.separator();
                let config = app.images.config();
                let (small, large, gamma) = (
                    config.exposure_small_step,
                    config.exposure_large_step,
                    config.gamma_step,
                );
                menu_item(ui, "Exposure +1/10 stop", "]", Command::Exposure(small), &mut picked);
                menu_item(ui, "Exposure -1/10 stop", "[", Command::Exposure(-small), &mut picked);
                menu_item(ui, "Exposure +1/2 stop", "}", Command::Exposure(large), &mut picked);
                menu_item(ui, "Exposure -1/2 stop", "{", Command::Exposure(-large), &mut picked);
                menu_item(ui, "Gamma +", ")", Command::Gamma(gamma), &mut picked);
                menu_item(ui, "Gamma -", "(", Command::Gamma(-gamma), &mut picked);
            });

            ui.menu_button("View", |ui| {
                ui.menu_button("Channel", |ui| {
                    let nchannels = app.images.current().map_or(0, |r| r.nchannels());
                    for (label, key, view) in [
                        ("Full Color", "C", ChannelView::FullColor),
                        ("Red", "R", ChannelView::RED),
                        ("Green", "G", ChannelView::GREEN),
                        ("Blue", "B", ChannelView::BLUE),
                        ("Alpha", "A", ChannelView::ALPHA),
                        ("Luminance", "L", ChannelView::Luminance),
                    ] {
                        let enabled = match view {
                            ChannelView::Single(c) => c < nchannels,
                            _ => true,
                        };
                        let button = egui::Button::new(label)
                            .selected(app.channel == view)
                            .shortcut_text(key);
                        if ui.add_enabled(enabled, button).clicked() {
                            ui.close();
                            picked.push(Command::Channel(view));
                        }
                    }
                    ui.separator();
                    menu_item(ui, "Next Channel", ".", Command::CycleChannel(1), &mut picked);
                    menu_item(ui, "Previous Channel", ",", Command::CycleChannel(-1), &mut picked);
                });
                ui.separator();
                menu_item(ui, "Zoom In", "+", Command::ZoomIn, &mut picked);
                menu_item(ui, "Zoom Out", "-", Command::ZoomOut, &mut picked);
                menu_item(ui, "Normal Size", "0", Command::NormalSize, &mut picked);
                menu_item(ui, "Fit Window to Image", "F", Command::FitToWindow, &mut picked);
                ui.separator();
                menu_item(ui, "Image Info", "I", Command::ToggleInfo, &mut picked);
                menu_item(ui, "Pixel Closeup", "P", Command::ToggleCloseup, &mut picked);
            });

            ui.menu_button("Help", |ui| {
                if ui.button("About").clicked() {
                    ui.close();
                    app.status.show_about = true;
                }
            });
        });

        if ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Q))) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });

    for command in picked {
        app.apply(command);
    }
}

fn menu_item(ui: &mut egui::Ui, label: &str, key: &str, command: Command, picked: &mut Vec<Command>) {
    if ui.add(egui::Button::new(label).shortcut_text(key)).clicked() {
        ui.close();
        picked.push(command);
    }
}

/// Pick files on a helper thread; the app adds them on its next update.
pub fn open_files_dialog(app: &mut ViewerApp) {
    let open_tx = app.open_tx.clone();
    let ctx = app.ctx.clone();
    std::thread::spawn(move || {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "tif", "tiff", "jpg", "jpeg", "exr", "hdr", "bmp", "ser"])
            .add_filter("SER files", &["ser"])
            .add_filter("All files", &["*"])
            .pick_files()
        {
            let _ = open_tx.send(paths);
            ctx.request_repaint();
        }
    });
}
