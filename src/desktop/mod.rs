use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

mod keyfile;

pub use keyfile::KeyFile;

pub const DESKTOP_GROUP: &str = "Desktop Entry";
const KEY_NAME: &str = "Name";
const KEY_ICON: &str = "Icon";
const KEY_EXEC: &str = "Exec";
const KEY_NO_DISPLAY: &str = "NoDisplay";
const DEFAULT_DATA_DIRS: &str = "/usr/local/share:/usr/share";

#[derive(Debug, Error)]
pub enum DesktopError {
    #[error("failed to read desktop entry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write desktop entry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("desktop entry {path} has no {key} key")]
    MissingKey { path: PathBuf, key: &'static str },
}

pub type DesktopResult<T> = std::result::Result<T, DesktopError>;

/// An application descriptor backed by a `.desktop` file on disk.
#[derive(Debug, Clone)]
pub struct DesktopEntry {
    path: PathBuf,
    keyfile: KeyFile,
}

impl DesktopEntry {
    pub fn load(path: &Path) -> DesktopResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| DesktopError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_contents(path.to_path_buf(), &contents))
    }

    pub fn from_contents(path: PathBuf, contents: &str) -> Self {
        Self {
            path,
            keyfile: KeyFile::parse(contents),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> Option<String> {
        self.keyfile.get(DESKTOP_GROUP, KEY_NAME)
    }

    pub fn icon(&self) -> Option<String> {
        self.keyfile.get(DESKTOP_GROUP, KEY_ICON)
    }

    pub fn exec(&self) -> Option<String> {
        self.keyfile.get(DESKTOP_GROUP, KEY_EXEC)
    }

    pub fn require(&self, key: &'static str) -> DesktopResult<String> {
        self.keyfile
            .get(DESKTOP_GROUP, key)
            .ok_or_else(|| DesktopError::MissingKey {
                path: self.path.clone(),
                key,
            })
    }

    /// Only a literal `true` hides the entry, matching how launchers read the key.
    pub fn no_display(&self) -> bool {
        self.keyfile.get_bool(DESKTOP_GROUP, KEY_NO_DISPLAY) == Some(true)
    }

    pub fn set_no_display(&mut self, hidden: bool) {
        self.keyfile.set_bool(DESKTOP_GROUP, KEY_NO_DISPLAY, hidden);
    }

    pub fn exec_contains(&self, needle: &str) -> bool {
        self.exec().is_some_and(|exec| exec.contains(needle))
    }

    /// Writes the entry back through a sibling temp file so readers never see a torn file.
    pub fn save(&self) -> DesktopResult<()> {
        let write_err = |source| DesktopError::Write {
            path: self.path.clone(),
            source,
        };
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| write_err(io::Error::from(io::ErrorKind::InvalidInput)))?;
        let mut temp_name = OsStr::new(".").to_os_string();
        temp_name.push(file_name);
        temp_name.push(".tmp");
        let temp_path = self.path.with_file_name(temp_name);

        let result = fs::File::create(&temp_path)
            .and_then(|mut file| {
                file.write_all(self.keyfile.to_string().as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(err) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(write_err(err));
        }
        Ok(())
    }
}

/// `applications/` directories in lookup order: user data dir first, then system dirs.
pub fn application_dirs() -> Vec<PathBuf> {
    let data_home = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from);
    let home = dirs::home_dir();
    let data_dirs = std::env::var_os("XDG_DATA_DIRS");
    application_dirs_with(data_home.as_deref(), home.as_deref(), data_dirs.as_deref())
}

fn application_dirs_with(
    data_home: Option<&Path>,
    home: Option<&Path>,
    data_dirs: Option<&OsStr>,
) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    match data_home.filter(|path| !path.as_os_str().is_empty()) {
        Some(path) => roots.push(path.to_path_buf()),
        None => {
            if let Some(home) = home {
                roots.push(home.join(".local/share"));
            }
        }
    }

    let data_dirs = data_dirs
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| OsStr::new(DEFAULT_DATA_DIRS));
    roots.extend(std::env::split_paths(data_dirs).filter(|path| !path.as_os_str().is_empty()));

    let mut seen = HashSet::new();
    roots
        .into_iter()
        .map(|root| root.join("applications"))
        .filter(|dir| seen.insert(dir.clone()))
        .collect()
}

/// Desktop files whose desktop id contains `term`, first directory wins on duplicate ids.
pub fn search_applications(dirs: &[PathBuf], term: &str) -> Vec<PathBuf> {
    let term = term.to_lowercase();
    let mut seen_ids = HashSet::new();
    let mut matches = Vec::new();

    for dir in dirs {
        let mut found = Vec::new();
        collect_desktop_files(dir, dir, &mut found);
        found.sort();
        for (id, path) in found {
            if !seen_ids.insert(id.clone()) {
                continue;
            }
            if id.to_lowercase().contains(&term) {
                matches.push(path);
            }
        }
    }

    tracing::debug!(term, count = matches.len(), "desktop entry search finished");
    matches
}

fn collect_desktop_files(root: &Path, dir: &Path, found: &mut Vec<(String, PathBuf)>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::debug!(dir = %dir.display(), ?err, "skipping unreadable applications dir");
            }
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_desktop_files(root, &path, found);
            continue;
        }
        if path.extension().and_then(OsStr::to_str) != Some("desktop") {
            continue;
        }
        if let Some(id) = desktop_id(root, &path) {
            found.push((id, path));
        }
    }
}

fn desktop_id(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|part| part.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_entry(dir: &Path, file: &str, name: &str, exec: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(file);
        fs::write(
            &path,
            format!("[Desktop Entry]\nType=Application\nName={name}\nExec={exec}\nIcon=app.png\n"),
        )
        .unwrap();
        path
    }

    #[test]
    fn visibility_flag_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_entry(
            dir.path(),
            "waydroid.org.lineageos.jelly.desktop",
            "Browser",
            "waydroid app launch org.lineageos.jelly",
        );

        let mut entry = DesktopEntry::load(&path).unwrap();
        assert!(!entry.no_display());

        entry.set_no_display(true);
        entry.save().unwrap();
        assert!(DesktopEntry::load(&path).unwrap().no_display());

        entry.set_no_display(false);
        entry.save().unwrap();
        let reloaded = DesktopEntry::load(&path).unwrap();
        assert!(!reloaded.no_display());
        assert_eq!(reloaded.name().as_deref(), Some("Browser"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn require_reports_missing_key() {
        let entry = DesktopEntry::from_contents(
            PathBuf::from("/tmp/x.desktop"),
            "[Desktop Entry]\nName=X\n",
        );
        let err = entry.require("Icon").unwrap_err();
        assert!(matches!(err, DesktopError::MissingKey { key: "Icon", .. }));
    }

    #[test]
    fn application_dirs_follow_xdg_lookup_order() {
        let dirs = application_dirs_with(
            None,
            Some(Path::new("/home/user")),
            Some(OsStr::new("/usr/share:/usr/share:/opt/share")),
        );
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/home/user/.local/share/applications"),
                PathBuf::from("/usr/share/applications"),
                PathBuf::from("/opt/share/applications"),
            ]
        );

        let defaults = application_dirs_with(Some(Path::new("/data")), None, None);
        assert_eq!(
            defaults,
            vec![
                PathBuf::from("/data/applications"),
                PathBuf::from("/usr/local/share/applications"),
                PathBuf::from("/usr/share/applications"),
            ]
        );
    }

    #[test]
    fn search_matches_ids_and_prefers_earlier_dirs() {
        let user = tempfile::tempdir().unwrap();
        let system = tempfile::tempdir().unwrap();
        let user_app = write_entry(
            user.path(),
            "waydroid.com.android.settings.desktop",
            "Settings",
            "waydroid app launch com.android.settings",
        );
        write_entry(
            system.path(),
            "waydroid.com.android.settings.desktop",
            "Settings (system)",
            "waydroid app launch com.android.settings",
        );
        let nested = write_entry(
            &system.path().join("waydroid"),
            "org.fdroid.fdroid.desktop",
            "F-Droid",
            "waydroid app launch org.fdroid.fdroid",
        );
        write_entry(system.path(), "firefox.desktop", "Firefox", "firefox %u");

        let found = search_applications(
            &[user.path().to_path_buf(), system.path().to_path_buf()],
            "Waydroid",
        );
        assert_eq!(found, vec![user_app, nested]);
    }
}
