use crate::app::ViewerApp;

pub fn show(ctx: &egui::Context, app: &mut ViewerApp) {
    egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
        ui.add_space(2.0);

        match app.status.progress {
            Some(done) => {
                let name = app.images.current().map(|r| r.name()).unwrap_or_default();
                ui.add(
                    egui::ProgressBar::new(done)
                        .text(format!("Reading {name}"))
                        .animate(true),
                );
            }
            None => {
                ui.add(egui::ProgressBar::new(0.0).text(""));
            }
        }

        // Log area, fixed height for 3 lines.
        let line_height = ui.text_style_height(&egui::TextStyle::Body);
        let spacing = ui.spacing().item_spacing.y;
        let log_height = line_height * 3.0 + spacing * 2.0;

        egui::ScrollArea::vertical()
            .max_height(log_height)
            .min_scrolled_height(log_height)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                if app.status.log_messages.is_empty() {
                    for _ in 0..3 {
                        ui.label("");
                    }
                } else {
                    for msg in &app.status.log_messages {
                        ui.label(msg);
                    }
                }
            });

        ui.horizontal(|ui| {
            if let (Some(index), Some(record)) = (app.images.current_index(), app.images.current()) {
                ui.label(format!("{}/{}", index + 1, app.images.len()));
                ui.separator();
                ui.label(record.short_info());
                ui.separator();
                ui.label(format!(
                    "exp {:+.1}  gam {:.2}",
                    record.exposure(),
                    record.gamma()
                ));
                ui.separator();
            }
            ui.label(format!("Zoom: {:.0}%", app.viewport.zoom() * 100.0));
            ui.separator();
            ui.label(app.channel.to_string());
            ui.separator();
            ui.label(format!("Device: {}", app.backend.name()));
            if let Some((x, y)) = app.view.focus {
                ui.separator();
                ui.label(format!("({x}, {y})"));
            }
        });

        ui.add_space(2.0);
    });
}
