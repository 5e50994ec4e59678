use std::sync::Mutex;

use zbus::blocking::{Connection, Proxy};

use super::{ContainerResult, ContainerService, SessionInfo, SessionState};

const WAYDROID_DBUS_NAME: &str = "id.waydro.Container";
const WAYDROID_DBUS_PATH: &str = "/ContainerManager";
const WAYDROID_DBUS_INTERFACE: &str = "id.waydro.ContainerManager";

/// Waydroid's `ContainerManager` on the system bus.
///
/// The bus connection is opened on first use and kept for the lifetime of the
/// value; a failed attempt is retried on the next call.
#[derive(Default)]
pub struct WaydroidContainer {
    proxy: Mutex<Option<Proxy<'static>>>,
}

impl WaydroidContainer {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_proxy<T>(
        &self,
        call: impl FnOnce(&Proxy<'static>) -> zbus::Result<T>,
    ) -> ContainerResult<T> {
        let mut slot = self
            .proxy
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let proxy = match slot.take() {
            Some(proxy) => proxy,
            None => open_proxy()?,
        };
        let result = call(&proxy);
        *slot = Some(proxy);
        Ok(result?)
    }
}

fn open_proxy() -> zbus::Result<Proxy<'static>> {
    let connection = Connection::system()?;
    let proxy = Proxy::new(
        &connection,
        WAYDROID_DBUS_NAME,
        WAYDROID_DBUS_PATH,
        WAYDROID_DBUS_INTERFACE,
    )?;
    tracing::debug!("opened waydroid container proxy");
    Ok(proxy)
}

impl ContainerService for WaydroidContainer {
    fn session(&self) -> ContainerResult<SessionState> {
        self.with_proxy(|proxy| proxy.call("GetSession", &()))
    }

    fn start(&self, session: &SessionInfo) -> ContainerResult<()> {
        let session = session.to_map();
        self.with_proxy(|proxy| proxy.call("Start", &(session,)))
    }

    fn stop(&self, quit_session: bool) -> ContainerResult<()> {
        self.with_proxy(|proxy| proxy.call("Stop", &(quit_session,)))
    }
}
