use super::ListEntry;

const STORE_TITLE: &str = "F-Droid";
const STORE_SUBTITLE: &str = "Free and open source application store";
const INSTALL_LABEL: &str = "Install";
const INSTALLED_LABEL: &str = "Installed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorePhase {
    Idle,
    Downloading,
    Installing,
    Installed,
    Failed(String),
}

/// Row offering to bootstrap the F-Droid store when it isn't installed.
#[derive(Debug)]
pub struct StoreEntry {
    phase: StorePhase,
}

impl StoreEntry {
    pub fn new() -> Self {
        Self {
            phase: StorePhase::Idle,
        }
    }

    pub fn phase(&self) -> &StorePhase {
        &self.phase
    }

    pub fn busy(&self) -> bool {
        matches!(self.phase, StorePhase::Downloading | StorePhase::Installing)
    }

    /// Moves into the download step; `false` while an install is already running or done.
    pub fn begin_install(&mut self) -> bool {
        if self.busy() || self.phase == StorePhase::Installed {
            return false;
        }
        self.phase = StorePhase::Downloading;
        true
    }

    pub fn download_finished(&mut self) {
        if self.phase == StorePhase::Downloading {
            self.phase = StorePhase::Installing;
        }
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.phase = StorePhase::Failed(message.into());
    }

    pub fn mark_installed(&mut self) {
        self.phase = StorePhase::Installed;
    }
}

impl Default for StoreEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl ListEntry for StoreEntry {
    /// A failed step replaces the title with its error message.
    fn title(&self) -> &str {
        match &self.phase {
            StorePhase::Failed(message) => message,
            _ => STORE_TITLE,
        }
    }

    fn subtitle(&self) -> Option<&str> {
        Some(STORE_SUBTITLE)
    }

    fn icon(&self) -> Option<&str> {
        None
    }

    fn primary_action_label(&self) -> &str {
        match self.phase {
            StorePhase::Installed => INSTALLED_LABEL,
            _ => INSTALL_LABEL,
        }
    }

    fn primary_action_sensitive(&self) -> bool {
        matches!(self.phase, StorePhase::Idle | StorePhase::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_walks_through_download_and_install() {
        let mut entry = StoreEntry::new();
        assert!(entry.primary_action_sensitive());

        assert!(entry.begin_install());
        assert!(!entry.primary_action_sensitive());
        assert!(!entry.begin_install());

        entry.download_finished();
        assert_eq!(entry.phase(), &StorePhase::Installing);

        entry.mark_installed();
        assert_eq!(entry.primary_action_label(), "Installed");
        assert!(!entry.begin_install());
    }

    #[test]
    fn failure_shows_message_and_restores_control() {
        let mut entry = StoreEntry::new();
        entry.begin_install();
        entry.show_error("error sending request for url");

        assert_eq!(entry.title(), "error sending request for url");
        assert!(entry.primary_action_sensitive());
        assert!(entry.begin_install());
        assert_eq!(entry.title(), "F-Droid");
    }
}
