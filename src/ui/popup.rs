use crate::popup::PopupViewModel;
use crate::ui::style::PanelStyle;
use egui::{Grid, RichText, ScrollArea, Ui};

/// Popup title and its two-column table. Returns true when closed.
pub fn popup_table(ui: &mut Ui, popup: &PopupViewModel, style: &PanelStyle) -> bool {
    let mut closed = false;
    ui.horizontal(|ui| {
        ui.label(RichText::new(&popup.title).font(style.heading_font.clone()).strong());
        closed = ui.small_button("✕").on_hover_text("Close").clicked();
    });
    ui.separator();

    ScrollArea::vertical()
        .max_height(style.popup_max_height)
        .show(ui, |ui| {
            Grid::new("this-popup-table").num_columns(2).striped(true).show(ui, |ui| {
                for row in &popup.rows {
                    let label = RichText::new(&row.label).font(style.body_font.clone());
                    ui.label(if row.emphasized { label.strong() } else { label });
                    ui.label(RichText::new(&row.value).font(style.body_font.clone()));
                    ui.end_row();
                }
            });
        });
    closed
}
