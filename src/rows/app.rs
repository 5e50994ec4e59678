use std::path::Path;

use crate::desktop::{DesktopEntry, DesktopResult};
use crate::helper::CommandLauncher;
use crate::toggle::Toggle;

use super::{ListEntry, RowAppearance};

/// System components shipped with the Android image; they can be hidden but not removed.
const ROOT_APPLICATIONS: [&str; 12] = [
    "com.android.documentsui",
    "com.android.contacts",
    "com.android.camera2",
    "org.lineageos.recorder",
    "com.android.gallery3d",
    "org.lineageos.jelly",
    "org.lineageos.eleven",
    "org.lineageos.etar",
    "com.android.settings",
    "com.android.calculator2",
    "com.android.deskclock",
    "com.android.traceur",
];

const LAUNCH_SUBCOMMAND: &str = "app launch ";
const REMOVE_SUBCOMMAND: &str = "app remove ";
pub const RESPONSE_CANCEL: &str = "cancel";
pub const RESPONSE_REMOVE: &str = "remove";

pub fn is_protected_application(path: &Path) -> bool {
    let path = path.to_string_lossy();
    ROOT_APPLICATIONS.iter().any(|id| path.contains(id))
}

/// Turns `waydroid app launch <pkg>` into `waydroid app remove <pkg>`; the package id is kept as is.
pub fn removal_command(exec: &str) -> String {
    exec.replacen(LAUNCH_SUBCOMMAND, REMOVE_SUBCOMMAND, 1)
}

/// Confirmation asked before an application is uninstalled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPrompt {
    pub heading: String,
    pub body: String,
    /// `(response id, label)` in display order.
    pub responses: [(&'static str, &'static str); 2],
    pub default_response: &'static str,
    pub close_response: &'static str,
    pub destructive_response: &'static str,
}

impl RemovalPrompt {
    fn for_application(name: &str) -> Self {
        Self {
            heading: "Remove application?".to_string(),
            body: format!("This will remove {name}"),
            responses: [(RESPONSE_CANCEL, "_Cancel"), (RESPONSE_REMOVE, "_Remove")],
            default_response: RESPONSE_CANCEL,
            close_response: RESPONSE_CANCEL,
            destructive_response: RESPONSE_REMOVE,
        }
    }

    pub fn response_at(&self, index: usize) -> &'static str {
        self.responses
            .get(index)
            .map_or(self.close_response, |(id, _)| *id)
    }
}

/// One installed Android application.
#[derive(Debug)]
pub struct AppEntry {
    entry: DesktopEntry,
    name: String,
    icon: String,
    launcher_visible: Toggle,
    removable: bool,
    removed: bool,
    appearance: RowAppearance,
}

impl AppEntry {
    pub fn new(entry: DesktopEntry) -> DesktopResult<Self> {
        let name = entry.require("Name")?;
        let icon = entry.require("Icon")?;
        let launcher_visible = Toggle::new(!entry.no_display(), true);
        let removable = !is_protected_application(entry.path());

        Ok(Self {
            entry,
            name,
            icon,
            launcher_visible,
            removable,
            removed: false,
            appearance: RowAppearance::default(),
        })
    }

    #[cfg(test)]
    pub(crate) fn load(path: &Path) -> DesktopResult<Self> {
        Self::new(DesktopEntry::load(path)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        self.entry.path()
    }

    pub fn launcher_visible(&self) -> Toggle {
        self.launcher_visible
    }

    pub fn removable(&self) -> bool {
        self.removable
    }

    pub fn removed(&self) -> bool {
        self.removed
    }

    pub fn appearance(&self) -> RowAppearance {
        self.appearance
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        if !self.removed {
            self.appearance.expanded = expanded;
        }
    }

    /// Shows or hides the application in the launcher. A failed write is only logged.
    pub fn toggle_visibility(&mut self, active: bool) {
        let Some(active) = self.launcher_visible.set_by_user(active) else {
            return;
        };
        self.entry.set_no_display(!active);
        if let Err(err) = self.entry.save() {
            tracing::warn!(app = %self.name, %err, "failed to persist launcher visibility");
        }
    }

    pub fn request_remove(&self) -> Option<RemovalPrompt> {
        if !self.removable || self.removed {
            return None;
        }
        Some(RemovalPrompt::for_application(&self.name))
    }

    /// Acts on the confirmation answer; returns whether removal was started.
    pub fn respond_to_removal(&mut self, response: &str, launcher: &dyn CommandLauncher) -> bool {
        if response != RESPONSE_REMOVE || !self.removable || self.removed {
            return false;
        }

        let exec = self.entry.exec().unwrap_or_default();
        let command = removal_command(&exec);
        tracing::info!(app = %self.name, command, "removing android application");
        if let Err(err) = launcher.launch(&command) {
            tracing::warn!(app = %self.name, %err, "failed to start application removal");
        }

        self.removed = true;
        self.launcher_visible.set_sensitive(false);
        self.appearance = RowAppearance::REMOVED;
        true
    }
}

impl ListEntry for AppEntry {
    fn title(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> Option<&str> {
        Some(self.icon.as_str())
    }

    fn primary_action_label(&self) -> &str {
        "Remove"
    }

    fn primary_action_sensitive(&self) -> bool {
        self.removable && !self.removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::HelperResult;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLauncher {
        commands: Mutex<Vec<String>>,
    }

    impl CommandLauncher for RecordingLauncher {
        fn launch(&self, command_line: &str) -> HelperResult<()> {
            self.commands.lock().unwrap().push(command_line.to_string());
            Ok(())
        }
    }

    fn write_app(dir: &Path, package: &str, extra: &str) -> PathBuf {
        let path = dir.join(format!("waydroid.{package}.desktop"));
        fs::write(
            &path,
            format!(
                "[Desktop Entry]\nType=Application\nName=App {package}\n\
                 Exec=waydroid app launch {package}\nIcon=/icons/{package}.png\n{extra}"
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn protected_ids_match_anywhere_in_path() {
        assert!(is_protected_application(Path::new(
            "/home/u/.local/share/applications/waydroid.com.android.settings.desktop"
        )));
        assert!(!is_protected_application(Path::new(
            "/home/u/.local/share/applications/waydroid.org.fdroid.fdroid.desktop"
        )));
    }

    #[test]
    fn removal_command_swaps_launch_verb() {
        assert_eq!(
            removal_command("waydroid app launch com.example.maps"),
            "waydroid app remove com.example.maps"
        );
    }

    #[test]
    fn removal_command_keeps_package_id_containing_launch() {
        assert_eq!(
            removal_command("waydroid app launch com.android.launcher3"),
            "waydroid app remove com.android.launcher3"
        );
        assert_eq!(
            removal_command("/usr/bin/waydroid app launch org.example.launchpad"),
            "/usr/bin/waydroid app remove org.example.launchpad"
        );
    }

    #[test]
    fn hidden_entry_starts_with_launcher_switch_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_app(dir.path(), "com.example.notes", "NoDisplay=true\n");
        let app = AppEntry::load(&path).unwrap();

        assert!(!app.launcher_visible().active());
        assert_eq!(app.title(), "App com.example.notes");
        assert_eq!(app.icon(), Some("/icons/com.example.notes.png"));
    }

    #[test]
    fn toggling_visibility_persists_inverse_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_app(dir.path(), "com.example.notes", "");
        let mut app = AppEntry::load(&path).unwrap();

        app.toggle_visibility(false);
        assert!(DesktopEntry::load(&path).unwrap().no_display());

        app.toggle_visibility(true);
        assert!(!DesktopEntry::load(&path).unwrap().no_display());
        assert!(app.launcher_visible().active());
    }

    #[test]
    fn missing_icon_rejects_entry() {
        let entry = DesktopEntry::from_contents(
            PathBuf::from("/tmp/waydroid.x.desktop"),
            "[Desktop Entry]\nName=X\nExec=waydroid app launch x\n",
        );
        assert!(AppEntry::new(entry).is_err());
    }

    #[test]
    fn protected_application_cannot_be_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_app(dir.path(), "com.android.settings", "");
        let mut app = AppEntry::load(&path).unwrap();
        let launcher = RecordingLauncher::default();

        assert!(!app.primary_action_sensitive());
        assert!(app.request_remove().is_none());
        assert!(!app.respond_to_removal(RESPONSE_REMOVE, &launcher));
        assert!(launcher.commands.lock().unwrap().is_empty());
    }

    #[test]
    fn confirmed_removal_spawns_remove_command_and_dims_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_app(dir.path(), "com.example.maps", "");
        let mut app = AppEntry::load(&path).unwrap();
        app.set_expanded(true);
        let launcher = RecordingLauncher::default();

        let prompt = app.request_remove().expect("removable app prompts");
        assert_eq!(prompt.body, "This will remove App com.example.maps");
        assert_eq!(prompt.response_at(0), RESPONSE_CANCEL);
        assert_eq!(prompt.response_at(7), RESPONSE_CANCEL);

        assert!(!app.respond_to_removal(RESPONSE_CANCEL, &launcher));
        assert!(!app.removed());

        assert!(app.respond_to_removal(prompt.response_at(1), &launcher));
        assert_eq!(
            *launcher.commands.lock().unwrap(),
            vec!["waydroid app remove com.example.maps".to_string()]
        );
        assert!(app.removed());
        assert_eq!(app.appearance(), RowAppearance::REMOVED);
        assert!(!app.primary_action_sensitive());
        assert!(app.request_remove().is_none());
    }
}
