use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::helper::run_shell_sync;

mod waydroid;

pub use waydroid::WaydroidContainer;

const DENSITY_ENV: &str = "GRID_UNIT_PX";
const DENSITY_PROBE: &str = "getprop ro.sf.lcd_density";
const WAYLAND_DISPLAY: &str = "wayland-0";

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("container service unreachable: {0}")]
    Unreachable(#[from] zbus::Error),
}

pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// Session map returned by `GetSession`; empty when no session is running.
pub type SessionState = HashMap<String, String>;

/// Control-plane service that owns the container lifecycle.
pub trait ContainerService: Send + Sync {
    fn session(&self) -> ContainerResult<SessionState>;
    fn start(&self, session: &SessionInfo) -> ContainerResult<()>;
    fn stop(&self, quit_session: bool) -> ContainerResult<()>;
}

/// Produces the session parameters for a start request.
pub trait SessionSource: Send + Sync {
    fn collect(&self) -> SessionInfo;
}

/// Parameters describing the user session the container attaches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    entries: Vec<(&'static str, String)>,
}

impl SessionInfo {
    pub fn from_environment(env: &SessionEnvironment) -> Self {
        let path = |path: &Path| path.to_string_lossy().into_owned();
        let entries = vec![
            ("user_name", env.user_name.clone()),
            ("user_id", env.uid.to_string()),
            ("group_id", env.gid.to_string()),
            ("host_user", path(&env.home)),
            ("pid", env.pid.to_string()),
            ("state", "STOPPED".to_string()),
            ("xdg_data_home", path(&env.data_home)),
            ("xdg_runtime_dir", path(&env.runtime_dir)),
            ("wayland_display", WAYLAND_DISPLAY.to_string()),
            ("pulse_runtime_path", path(&env.runtime_dir.join("pulse"))),
            ("lcd_density", env.lcd_density.clone()),
            ("background_start", "true".to_string()),
            (
                "waydroid_data",
                path(&env.home.join(".local/share/waydroid/data")),
            ),
        ];
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value.as_str())
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEnvironment {
    pub user_name: String,
    pub uid: u32,
    pub gid: u32,
    pub pid: u32,
    pub home: PathBuf,
    pub data_home: PathBuf,
    pub runtime_dir: PathBuf,
    pub lcd_density: String,
}

impl SessionEnvironment {
    pub fn current() -> Self {
        // SAFETY: getuid/getgid have no preconditions and cannot fail.
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        let user_name = ["USER", "LOGNAME"]
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|value| !value.is_empty()))
            .unwrap_or_else(|| uid.to_string());
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
        let data_home = dirs::data_dir().unwrap_or_else(|| home.join(".local/share"));
        let runtime_dir = dirs::runtime_dir()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(|| home.join(".cache"));

        Self {
            user_name,
            uid,
            gid,
            pid: std::process::id(),
            home,
            data_home,
            runtime_dir,
            lcd_density: lcd_density(),
        }
    }
}

/// Session parameters of the user running the panel.
#[derive(Debug, Default)]
pub struct HostSession;

impl SessionSource for HostSession {
    fn collect(&self) -> SessionInfo {
        SessionInfo::from_environment(&SessionEnvironment::current())
    }
}

/// Display density override, else the device property; empty when neither is available.
pub fn lcd_density() -> String {
    lcd_density_with(std::env::var(DENSITY_ENV).ok(), || {
        run_shell_sync(DENSITY_PROBE).map_err(|err| err.to_string())
    })
}

fn lcd_density_with<P>(env_override: Option<String>, probe: P) -> String
where
    P: FnOnce() -> Result<String, String>,
{
    if let Some(value) = env_override {
        return value;
    }
    probe().unwrap_or_else(|err| {
        tracing::debug!(err, "lcd density probe failed");
        String::new()
    })
}
