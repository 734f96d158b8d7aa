use crate::data::attributes::AttributeStore;
use crate::ui::style::PanelStyle;
use egui::{Grid, RichText, ScrollArea, Ui};

/// The attribute table, one row per record sorted by identifier
pub fn attribute_table(ui: &mut Ui, store: &AttributeStore, style: &PanelStyle) {
    if store.is_empty() {
        ui.label(RichText::new("No attribute records loaded").italics());
        return;
    }

    ScrollArea::both().show(ui, |ui| {
        Grid::new("attribute-table").striped(true).show(ui, |ui| {
            for column in store.columns() {
                ui.label(RichText::new(column.replace('_', " ")).font(style.heading_font.clone()).strong());
            }
            ui.end_row();

            for (_, record) in store.sorted_records() {
                for column in store.columns() {
                    ui.label(RichText::new(record.get(column).unwrap_or("")).font(style.body_font.clone()));
                }
                ui.end_row();
            }
        });
    });
}
