use crate::legend::{Legend, Swatch};
use crate::ui::style::{color32, PanelStyle};
use egui::{RichText, Sense, Ui, Vec2};

/// Draws the legend: a heading per group, then one swatch row per entry
pub fn legend_panel(ui: &mut Ui, legend: &Legend, style: &PanelStyle) {
    if legend.is_empty() {
        ui.label(RichText::new("No visible layers").italics());
        return;
    }

    for block in &legend.blocks {
        if let Some(heading) = &block.heading {
            ui.add_space(6.0);
            ui.label(
                RichText::new(heading)
                    .font(style.heading_font.clone())
                    .strong(),
            );
        }
        for entry in &block.entries {
            ui.horizontal(|ui| {
                let size = Vec2::splat(style.swatch_size);
                let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
                let color = color32(&entry.color).unwrap_or(style.fallback_color);
                match entry.swatch {
                    Swatch::Square => {
                        ui.painter().rect_filled(rect, 2.0, color);
                    }
                    Swatch::Circle => {
                        ui.painter()
                            .circle_filled(rect.center(), style.swatch_size / 2.0, color);
                    }
                }
                ui.label(
                    RichText::new(&entry.label)
                        .font(style.body_font.clone())
                        .color(style.text_color),
                );
            });
        }
    }
}
