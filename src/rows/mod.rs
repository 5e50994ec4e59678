mod app;
mod store;

pub use app::{is_protected_application, removal_command, AppEntry, RemovalPrompt};
pub use store::{StoreEntry, StorePhase};

/// What a list row shows and whether its main control can be used.
pub trait ListEntry {
    fn title(&self) -> &str;
    fn subtitle(&self) -> Option<&str> {
        None
    }
    fn icon(&self) -> Option<&str>;
    fn primary_action_label(&self) -> &str;
    fn primary_action_sensitive(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowAppearance {
    pub expanded: bool,
    pub sensitive: bool,
    pub opacity: f64,
}

impl Default for RowAppearance {
    fn default() -> Self {
        Self {
            expanded: false,
            sensitive: true,
            opacity: 1.0,
        }
    }
}

impl RowAppearance {
    pub const REMOVED: Self = Self {
        expanded: false,
        sensitive: false,
        opacity: 0.5,
    };
}

/// A row of the "Android applications" list.
#[derive(Debug)]
pub enum PanelRow {
    App(AppEntry),
    Store(StoreEntry),
}

impl PanelRow {
    pub fn as_entry(&self) -> &dyn ListEntry {
        match self {
            Self::App(entry) => entry,
            Self::Store(entry) => entry,
        }
    }
}
