/// Model of an on/off switch shown by the panel.
///
/// Two write paths exist. [`Toggle::set_by_user`] is what a change handler
/// reacts to and reports whether anything changed. [`Toggle::sync`] reflects
/// state read back from the system and never reports a change, so refreshing
/// a switch can't loop back into its own handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    active: bool,
    sensitive: bool,
}

impl Toggle {
    pub const fn new(active: bool, sensitive: bool) -> Self {
        Self { active, sensitive }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn sensitive(&self) -> bool {
        self.sensitive
    }

    pub fn set_sensitive(&mut self, sensitive: bool) {
        self.sensitive = sensitive;
    }

    /// Returns the new value when the user actually flipped the switch.
    pub fn set_by_user(&mut self, active: bool) -> Option<bool> {
        if !self.sensitive || self.active == active {
            return None;
        }
        self.active = active;
        Some(active)
    }

    pub fn sync(&mut self, active: bool) {
        self.active = active;
    }
}

impl Default for Toggle {
    fn default() -> Self {
        Self::new(false, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_change_is_reported_once() {
        let mut toggle = Toggle::default();
        assert_eq!(toggle.set_by_user(true), Some(true));
        assert_eq!(toggle.set_by_user(true), None);
        assert!(toggle.active());
    }

    #[test]
    fn sync_updates_value_without_pending_change() {
        let mut toggle = Toggle::default();
        toggle.sync(true);
        assert!(toggle.active());
        assert_eq!(toggle.set_by_user(true), None);
        assert_eq!(toggle.set_by_user(false), Some(false));
    }

    #[test]
    fn insensitive_toggle_ignores_user_input() {
        let mut toggle = Toggle::new(false, false);
        assert_eq!(toggle.set_by_user(true), None);
        assert!(!toggle.active());

        toggle.sync(true);
        assert!(toggle.active());
    }
}
