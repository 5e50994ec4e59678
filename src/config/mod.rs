use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "waydroid-panel";
const APP_CONFIG_FILE: &str = "config.json";
const SHARED_FOLDER_DIR: &str = "Droidian";
const SHARED_FOLDER_MARKER: &str = "waydroid_shared_folder";

/// Panel settings from `config.json`; every field falls back to the stock Waydroid setup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub helper_program: PathBuf,
    pub package_name: String,
    pub store_apk_url: String,
    pub store_apk_path: PathBuf,
    pub store_package: String,
    pub search_term: String,
    pub launch_marker: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            helper_program: PathBuf::from("/usr/bin/waydroid"),
            package_name: "waydroid".to_string(),
            store_apk_url: "https://f-droid.org/F-Droid.apk".to_string(),
            store_apk_path: PathBuf::from("/tmp/fdroid.apk"),
            store_package: "org.fdroid.fdroid".to_string(),
            search_term: "waydroid".to_string(),
            launch_marker: "waydroid app launch ".to_string(),
        }
    }
}

pub fn load_panel_config() -> PanelConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_panel_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_panel_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> PanelConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return PanelConfig::default(),
    };
    if !path.exists() {
        return PanelConfig::default();
    }
    match fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            PanelConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            PanelConfig::default()
        }
    }
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

/// Marker file whose presence asks the container to mount the shared folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFolder {
    directory: PathBuf,
    marker: PathBuf,
}

impl SharedFolder {
    pub fn in_config_root(root: &Path) -> Self {
        let directory = root.join(SHARED_FOLDER_DIR);
        let marker = directory.join(SHARED_FOLDER_MARKER);
        Self { directory, marker }
    }

    pub fn for_current_user() -> Result<Self, ConfigPathError> {
        let (xdg_config_home, home) = config_env_dirs();
        let root = config_root(xdg_config_home.as_deref(), home.as_deref())?;
        Ok(Self::in_config_root(&root))
    }

    pub fn marker(&self) -> &Path {
        &self.marker
    }

    pub fn is_enabled(&self) -> bool {
        self.marker.is_file()
    }

    pub fn enable(&self) -> io::Result<()> {
        fs::create_dir_all(&self.directory)?;
        OpenOptions::new()
            .write(true)
            .create(true)
            .mode(0o600)
            .open(&self.marker)?;
        Ok(())
    }

    pub fn disable(&self) -> io::Result<()> {
        match fs::remove_file(&self.marker) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}
