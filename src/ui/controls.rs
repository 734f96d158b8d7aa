use crate::controls::GroupControl;
use egui::{Checkbox, Grid, Ui};

/// What the user asked for in the layer-control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    Toggle { label: String, visible: bool },
    ZoomTo { label: String },
}

/// One row per group: checkbox, label and a `Z2L` button when the group
/// has a zoom target. Empty groups get a disabled checkbox.
pub fn layer_controls(ui: &mut Ui, controls: &[GroupControl]) -> Option<ControlAction> {
    let mut action = None;
    Grid::new("layer-controls-table")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            for control in controls {
                let mut checked = control.checked;
                let response = ui.add_enabled(!control.inert, Checkbox::new(&mut checked, control.label.as_str()));
                if response.changed() {
                    action = Some(ControlAction::Toggle {
                        label: control.label.clone(),
                        visible: checked,
                    });
                }
                if control.zoom_to.is_some() {
                    if ui.small_button("Z2L").on_hover_text("Zoom to layer").clicked() {
                        action = Some(ControlAction::ZoomTo {
                            label: control.label.clone(),
                        });
                    }
                } else {
                    ui.label("");
                }
                ui.end_row();
            }
        });
    action
}
