use iv_core::closeup::Closeup;

use crate::app::ViewerApp;

pub fn show(ctx: &egui::Context, app: &mut ViewerApp) {
    show_info(ctx, app);
    show_closeup(ctx, app);
    show_about(ctx, app);
}

fn show_info(ctx: &egui::Context, app: &mut ViewerApp) {
    let Some(record) = app.images.current() else {
        return;
    };
    let rows = record.long_info();
    let error = record.error_message().to_string();

    egui::Window::new("Image Info")
        .open(&mut app.status.show_info)
        .resizable(true)
        .show(ctx, |ui| {
            egui::Grid::new("info_grid")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (label, value) in &rows {
                        ui.weak(label);
                        ui.label(value);
                        ui.end_row();
                    }
                });
            if !error.is_empty() {
                ui.separator();
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }
        });
}

fn show_closeup(ctx: &egui::Context, app: &mut ViewerApp) {
    let size = app.images.config().closeup_size();
    let closeup = match (app.images.current_frame(), app.view.focus) {
        (Some(frame), Some((x, y))) => Closeup::sample(&frame, x, y, size),
        _ => None,
    };

    egui::Window::new("Pixel Closeup")
        .open(&mut app.status.show_closeup)
        .resizable(false)
        .show(ctx, |ui| match closeup {
            Some(closeup) => closeup_grid(ui, &closeup),
            None => {
                ui.label("Hover over the image");
            }
        });
}

fn closeup_grid(ui: &mut egui::Ui, closeup: &Closeup) {
    ui.label(format!("Pixel ({}, {})", closeup.focus.0, closeup.focus.1));
    let center = closeup.center();

    for (c, name) in closeup.channel_names.iter().enumerate() {
        ui.separator();
        ui.strong(name);
        egui::Grid::new(("closeup_grid", c))
            .spacing([6.0, 2.0])
            .show(ui, |ui| {
                for row in 0..closeup.size {
                    for col in 0..closeup.size {
                        let text = match closeup.cell(row, col) {
                            Some(values) => format!("{:.3}", values[c]),
                            None => "-".to_string(),
                        };
                        let mut text = egui::RichText::new(text).monospace().small();
                        if row == center && col == center {
                            text = text.strong().color(egui::Color32::LIGHT_GREEN);
                        }
                        ui.label(text);
                    }
                    ui.end_row();
                }
            });
    }

    ui.separator();
    egui::Grid::new("closeup_focus").num_columns(3).show(ui, |ui| {
        for (c, name) in closeup.channel_names.iter().enumerate() {
            ui.weak(name);
            ui.monospace(closeup.focus_u8[c].to_string());
            ui.monospace(format!("{:.6}", closeup.focus_f32[c]));
            ui.end_row();
        }
    });
}

fn show_about(ctx: &egui::Context, app: &mut ViewerApp) {
    if !app.status.show_about {
        return;
    }
    egui::Window::new("About iv")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("iv");
                ui.label("Image Viewer");
                ui.add_space(8.0);
                ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                ui.add_space(8.0);
                if ui.button("Close").clicked() {
                    app.status.show_about = false;
                }
            });
        });
}
