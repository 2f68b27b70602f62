use std::path::Path;

use console::Style;
use iv_core::closeup::Closeup;
use iv_core::display::DisplaySettings;
use iv_core::image::ImageRecord;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    error: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            error: Style::new().red(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_short_info(record: &ImageRecord) {
    let s = Styles::new();
    println!(
        "{}  {}",
        s.path.apply_to(record.path().display()),
        s.value.apply_to(record.short_info())
    );
}

pub fn print_broken(record: &ImageRecord) {
    let s = Styles::new();
    println!(
        "{}  {}",
        s.path.apply_to(record.path().display()),
        s.error.apply_to(record.error_message())
    );
}

pub fn print_long_info(record: &ImageRecord) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to(record.name()));
    for (label, value) in record.long_info() {
        println!(
            "  {:<14}{}",
            s.label.apply_to(label),
            s.value.apply_to(value)
        );
    }
}

pub struct RenderSummary<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub device: &'a str,
    pub settings: DisplaySettings,
    pub zoom: f32,
    pub size: (u32, u32),
}

pub fn print_render_summary(summary: &RenderSummary<'_>) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Render"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(6)));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(summary.input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(summary.output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Device"),
        s.method.apply_to(summary.device)
    );
    println!();

    println!("  {}", s.header.apply_to("Display"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Channel"),
        s.value.apply_to(summary.settings.channel)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Exposure"),
        s.value.apply_to(format!("{:+.2}", summary.settings.exposure))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Gamma"),
        s.value.apply_to(format!("{:.2}", summary.settings.gamma))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Zoom"),
        s.value.apply_to(format!("{:.3}", summary.zoom))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{}x{}", summary.size.0, summary.size.1))
    );
    println!();
}

/// Print a closeup as one grid per channel, focus cell highlighted.
pub fn print_closeup(closeup: &Closeup) {
    let s = Styles::new();
    let center = closeup.center();

    println!();
    println!(
        "  {} {}",
        s.title.apply_to("Pixel"),
        s.value.apply_to(format!("({}, {})", closeup.focus.0, closeup.focus.1))
    );
    for (c, name) in closeup.channel_names.iter().enumerate() {
        println!();
        println!("  {}", s.header.apply_to(name));
        for row in 0..closeup.size {
            let mut line = String::from("   ");
            for col in 0..closeup.size {
                let cell = match closeup.cell(row, col) {
                    Some(values) => format!("{:>8.4}", values[c]),
                    None => format!("{:>8}", "----"),
                };
                if row == center && col == center {
                    line.push_str(&format!(" {}", s.method.apply_to(cell)));
                } else if closeup.cell(row, col).is_none() {
                    line.push_str(&format!(" {}", s.label.apply_to(cell)));
                } else {
                    line.push_str(&format!(" {}", cell));
                }
            }
            println!("{line}");
        }
    }

    println!();
    println!("  {}", s.header.apply_to("Focus"));
    for (c, name) in closeup.channel_names.iter().enumerate() {
        println!(
            "    {:<12}{}",
            s.label.apply_to(name),
            s.value.apply_to(format!(
                "{:>3}  {:.6}",
                closeup.focus_u8[c], closeup.focus_f32[c]
            ))
        );
    }
    println!();
}
