//! Feature popups: content assembly and the single open-popup slot.

pub mod content;
pub mod session;

pub use content::{AddOns, PopupContentBuilder, PopupRow, PopupViewModel};
pub use session::{ClickTicket, PopupSession};
