mod panel;
mod rows;
pub mod style;
pub mod widgets;

pub use panel::PanelUi;
pub use style::{register_resources, StyleTokens, LAYOUT_TOKENS};
pub use widgets::SyncedSwitch;
