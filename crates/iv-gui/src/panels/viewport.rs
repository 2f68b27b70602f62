use crate::app::ViewerApp;
use crate::commands::Command;

pub fn show(ctx: &egui::Context, app: &mut ViewerApp) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let rect = ui.available_rect_before_wrap();
        paint_background(ui, rect);
        app.view.window_size = (rect.width().max(0.0) as u32, rect.height().max(0.0) as u32);

        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        handle_zoom(ui, &response, app);
        handle_pan(&response, app);
        if response.double_clicked() {
            app.apply(Command::FitToWindow);
        }
        update_focus(ui, rect, app);

        app.refresh_texture(ctx);

        let shows_frame = app.images.current_frame().is_some();
        match app.view.texture.as_ref() {
            Some(texture) if shows_frame => {
                draw_image(ui, texture.id(), rect);
                draw_viewing_label(ui, rect, &viewing_label(app));
            }
            _ => show_placeholder(ui, app),
        }
    });
}

fn paint_background(ui: &egui::Ui, rect: egui::Rect) {
    ui.painter()
        .rect_filled(rect, 0.0, egui::Color32::from_gray(30));
}

fn handle_zoom(ui: &egui::Ui, response: &egui::Response, app: &mut ViewerApp) {
    if !response.hovered() {
        return;
    }
    let scroll = ui.input(|i| i.raw_scroll_delta.y);
    if scroll > 0.0 {
        app.apply(Command::ZoomIn);
    } else if scroll < 0.0 {
        app.apply(Command::ZoomOut);
    }
}

fn handle_pan(response: &egui::Response, app: &mut ViewerApp) {
    if response.dragged_by(egui::PointerButton::Primary)
        || response.dragged_by(egui::PointerButton::Middle)
    {
        // The image follows the pointer, so the view center moves against it.
        let delta = response.drag_delta();
        app.viewport.pan(-delta.x, -delta.y);
    }
}

fn update_focus(ui: &egui::Ui, rect: egui::Rect, app: &mut ViewerApp) {
    let (ww, wh) = app.view.window_size;
    app.view.focus = ui
        .input(|i| i.pointer.hover_pos())
        .filter(|pos| rect.contains(*pos))
        .and_then(|pos| {
            let rel = pos - rect.min;
            app.viewport.window_to_image(rel.x, rel.y, ww, wh)
        });
}

fn draw_image(ui: &egui::Ui, texture_id: egui::TextureId, rect: egui::Rect) {
    ui.painter().image(
        texture_id,
        rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );
}

fn viewing_label(app: &ViewerApp) -> String {
    let mut label = app.channel.to_string();
    if let Some(p) = app.status.progress {
        label.push_str(&format!("  reading {:.0}%", p * 100.0));
    }
    label
}

fn draw_viewing_label(ui: &egui::Ui, rect: egui::Rect, label: &str) {
    if label.is_empty() {
        return;
    }
    let label_pos = rect.left_top() + egui::vec2(8.0, 8.0);
    ui.painter().text(
        label_pos,
        egui::Align2::LEFT_TOP,
        label,
        egui::FontId::proportional(14.0),
        egui::Color32::from_white_alpha(200),
    );
}

fn show_placeholder(ui: &mut egui::Ui, app: &ViewerApp) {
    let text = match app.images.current() {
        None => "Open an image to begin".to_string(),
        Some(record) if app.images.is_loading() => format!("Reading {}...", record.name()),
        Some(record) if record.is_broken() => format!("Cannot display {}", record.name()),
        Some(record) => record.name(),
    };
    ui.centered_and_justified(|ui| {
        ui.label(
            egui::RichText::new(text)
                .size(18.0)
                .color(egui::Color32::from_gray(100)),
        );
    });
}
