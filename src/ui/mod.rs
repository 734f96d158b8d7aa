//! egui panels for the dashboard.
//!
//! Every panel renders from the crate's models and reports what the user
//! did; none of them keeps state between frames.

pub mod canvas;
pub mod controls;
pub mod legend;
pub mod popup;
pub mod style;
pub mod table;

pub use canvas::{map_canvas, CanvasResponse};
pub use controls::{layer_controls, ControlAction};
pub use legend::legend_panel;
pub use popup::popup_table;
pub use style::{color32, PanelStyle};
pub use table::attribute_table;
