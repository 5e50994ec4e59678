use std::fs;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;

use crate::config::{PanelConfig, SharedFolder};
use crate::container::{
    ContainerResult, ContainerService, HostSession, SessionSource, SessionState,
    WaydroidContainer,
};
use crate::desktop::{self, DesktopEntry};
use crate::download::{AssetFetcher, DownloadResult, HttpFetcher};
use crate::error::{PanelError, PanelResult};
use crate::helper::{
    parse_property_line, CommandLauncher, HelperResult, HelperTool, RuntimeProperty,
    SpawnLauncher, WaydroidCli,
};
use crate::packages::{PackageBackend, PackageKitBackend, PackageResult, Resolution};
use crate::rows::{AppEntry, PanelRow, RemovalPrompt, StoreEntry};
use crate::state::{StateMachine, ViewEvent, ViewState};
use crate::toggle::Toggle;
use crate::worker::Dispatcher;

mod view;

pub use view::{PanelView, Screen, StatusMessage};

/// External systems the panel talks to.
pub struct Services {
    pub packages: Arc<dyn PackageBackend>,
    pub container: Arc<dyn ContainerService>,
    pub session: Arc<dyn SessionSource>,
    pub helper: Arc<dyn HelperTool>,
    pub launcher: Arc<dyn CommandLauncher>,
    pub fetcher: Arc<dyn AssetFetcher>,
}

impl Services {
    pub fn system(config: &PanelConfig) -> PanelResult<Self> {
        Ok(Self {
            packages: Arc::new(PackageKitBackend),
            container: Arc::new(WaydroidContainer::new()),
            session: Arc::new(HostSession),
            helper: Arc::new(WaydroidCli::new(config.helper_program.clone())),
            launcher: Arc::new(SpawnLauncher),
            fetcher: Arc::new(HttpFetcher::new()?),
        })
    }
}

/// Filesystem locations the panel reads and writes.
#[derive(Debug, Clone, Default)]
pub struct PanelPaths {
    pub application_dirs: Vec<PathBuf>,
    pub shared_folder: Option<SharedFolder>,
}

impl PanelPaths {
    pub fn for_current_user() -> Self {
        let shared_folder = SharedFolder::for_current_user()
            .map_err(|err| tracing::warn!(?err, "shared folder location unavailable"))
            .ok();
        Self {
            application_dirs: desktop::application_dirs(),
            shared_folder,
        }
    }
}

enum PanelEvent {
    Resolved(PackageResult<Resolution>),
    Installed(PackageResult<()>),
    SessionQueried(ContainerResult<SessionState>),
    RunningStateChanged {
        requested: bool,
        result: ContainerResult<()>,
    },
    PropertyRead {
        property: RuntimeProperty,
        result: HelperResult<String>,
    },
    PropertyWritten {
        property: RuntimeProperty,
        result: HelperResult<()>,
    },
    StoreDownloaded(DownloadResult<u64>),
    StoreInstallExited(HelperResult<ExitStatus>),
}

fn log_failure(context: &str, err: impl Into<PanelError>) {
    let err = err.into();
    tracing::warn!(kind = ?err.kind(), %err, "{context}");
}

/// Controller behind the Waydroid settings panel.
///
/// Every operation either updates the view model directly or hands blocking
/// work to a worker thread. Results are applied by [`WaydroidPanel::pump`],
/// which the host calls from its UI loop. Dropping the panel cancels work
/// that is still queued.
pub struct WaydroidPanel {
    config: PanelConfig,
    services: Services,
    paths: PanelPaths,
    machine: StateMachine,
    view: PanelView,
    install_target: Option<String>,
    rows: Vec<PanelRow>,
    rows_generation: u64,
    dispatcher: Dispatcher<PanelEvent>,
}

impl WaydroidPanel {
    pub fn new(config: PanelConfig, services: Services, paths: PanelPaths) -> Self {
        let shared_folder = match &paths.shared_folder {
            Some(folder) => Toggle::new(folder.is_enabled(), true),
            None => Toggle::new(false, false),
        };
        Self {
            config,
            services,
            paths,
            machine: StateMachine::new(),
            view: PanelView::initial(shared_folder),
            install_target: None,
            rows: Vec::new(),
            rows_generation: 0,
            dispatcher: Dispatcher::new(),
        }
    }

    pub fn view(&self) -> &PanelView {
        &self.view
    }

    pub fn state(&self) -> ViewState {
        self.machine.state()
    }

    pub fn install_target(&self) -> Option<&str> {
        self.install_target.as_deref()
    }

    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    /// Bumped whenever the row list is rebuilt.
    pub fn rows_generation(&self) -> u64 {
        self.rows_generation
    }

    pub fn has_pending_work(&self) -> bool {
        self.dispatcher.pending() > 0
    }

    /// Cancels background work; results that arrive afterwards are dropped.
    ///
    /// Called when the host tears the panel down while it still lives.
    pub fn shutdown(&self) {
        tracing::debug!(pending = self.dispatcher.pending(), "shutting down panel");
        self.dispatcher.cancel();
    }

    pub fn start(&mut self) {
        self.check_installed();
        self.list_applications();
    }

    /// Applies finished background work; returns how many results were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.dispatcher.try_next() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Blocks until every queued operation, including follow-ups, has finished.
    pub fn run_until_idle(&mut self) {
        while let Some(event) = self.dispatcher.wait_next() {
            self.handle(event);
        }
    }

    fn handle(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Resolved(result) => self.on_resolved(result),
            PanelEvent::Installed(result) => self.on_installed(result),
            PanelEvent::SessionQueried(result) => self.on_session(result),
            PanelEvent::RunningStateChanged { requested, result } => {
                self.on_running_state_changed(requested, result)
            }
            PanelEvent::PropertyRead { property, result } => {
                self.on_property_read(property, result)
            }
            PanelEvent::PropertyWritten { property, result } => {
                if let Err(err) = result {
                    log_failure(&format!("can't write property {}", property.as_str()), err);
                }
            }
            PanelEvent::StoreDownloaded(result) => self.on_store_downloaded(result),
            PanelEvent::StoreInstallExited(result) => self.on_store_install_exited(result),
        }
    }

    fn advance(&mut self, event: ViewEvent) {
        if let Err(err) = self.machine.transition(event) {
            log_failure("view transition rejected", err);
        }
    }

    pub fn check_installed(&mut self) {
        self.advance(ViewEvent::CheckInstall);
        let packages = Arc::clone(&self.services.packages);
        let name = self.config.package_name.clone();
        self.dispatcher.spawn("resolve package", move || {
            PanelEvent::Resolved(packages.resolve(&name))
        });
    }

    fn on_resolved(&mut self, result: PackageResult<Resolution>) {
        match result {
            Ok(resolution) if resolution.is_installed() => {
                tracing::info!(package = %self.config.package_name, "container package installed");
                self.view.set_package_installed(true);
                self.advance(ViewEvent::PackageFound);
                self.check_running();
            }
            Ok(resolution) => {
                self.install_target = resolution.install_candidate().map(|p| p.id.clone());
                tracing::info!(
                    package = %self.config.package_name,
                    target = ?self.install_target,
                    "container package needs installing"
                );
                self.view.set_package_installed(false);
                self.view.install_button_sensitive = self.install_target.is_some();
                self.view.screen = Screen::Install;
                self.advance(ViewEvent::PackageMissing);
            }
            Err(err) => {
                log_failure("can't resolve container package", err);
                self.advance(ViewEvent::ResolveFailed);
                self.check_running();
            }
        }
    }

    pub fn install_package(&mut self) {
        let Some(target) = self.install_target.clone() else {
            tracing::warn!("no install candidate recorded");
            return;
        };
        if !self.machine.can_transition(ViewEvent::Install) {
            tracing::debug!(state = ?self.machine.state(), "install already in progress");
            return;
        }
        self.advance(ViewEvent::Install);
        self.view.install_button_sensitive = false;
        self.view.spinner_active = true;

        let packages = Arc::clone(&self.services.packages);
        self.dispatcher.spawn("install package", move || {
            PanelEvent::Installed(packages.install(&[target]))
        });
    }

    fn on_installed(&mut self, result: PackageResult<()>) {
        self.view.spinner_active = false;
        match result {
            Ok(()) => {
                tracing::info!(target = ?self.install_target, "container package installed");
                self.view.screen = Screen::Configure;
                self.view.running.set_sensitive(true);
                self.view.set_package_installed(true);
                self.advance(ViewEvent::InstallSucceeded);
                self.check_running();
            }
            Err(err) => {
                log_failure("can't install container package", err);
                self.view.set_package_installed(false);
                self.advance(ViewEvent::InstallFailed);
            }
        }
    }

    pub fn check_running(&mut self) {
        self.advance(ViewEvent::CheckRunning);
        let container = Arc::clone(&self.services.container);
        self.dispatcher.spawn("query session", move || {
            PanelEvent::SessionQueried(container.session())
        });
    }

    fn on_session(&mut self, result: ContainerResult<SessionState>) {
        match result {
            Ok(session) => {
                tracing::debug!(running = !session.is_empty(), "container session queried");
                self.advance(ViewEvent::SessionReported);
                self.view.screen = Screen::Configure;
                self.view.running.set_sensitive(true);
                self.view.running.sync(!session.is_empty());
                for property in RuntimeProperty::ALL {
                    self.get_property(property);
                }
            }
            Err(err) => {
                log_failure("can't get container session state", err);
                self.advance(ViewEvent::SessionUnavailable);
                self.view.running.set_sensitive(false);
                self.view.running.sync(false);
                self.view.screen = Screen::Install;
            }
        }
    }

    /// Change handler of the lifecycle switch.
    pub fn set_running_state(&mut self, active: bool) {
        let Some(active) = self.view.running.set_by_user(active) else {
            return;
        };
        tracing::info!(active, "changing container running state");

        let container = Arc::clone(&self.services.container);
        let session = Arc::clone(&self.services.session);
        self.dispatcher.spawn("change running state", move || {
            let result = if active {
                container.start(&session.collect())
            } else {
                container.stop(true)
            };
            PanelEvent::RunningStateChanged {
                requested: active,
                result,
            }
        });
    }

    fn on_running_state_changed(&mut self, requested: bool, result: ContainerResult<()>) {
        if let Err(err) = result {
            log_failure("can't change container running state", err);
            self.view.running.sync(!requested);
        }
        self.check_running();
    }

    pub fn get_property(&mut self, property: RuntimeProperty) {
        let helper = Arc::clone(&self.services.helper);
        self.dispatcher.spawn("read property", move || PanelEvent::PropertyRead {
            property,
            result: helper.get_property(property),
        });
    }

    fn on_property_read(&mut self, property: RuntimeProperty, result: HelperResult<String>) {
        match result {
            Ok(line) => {
                let value = parse_property_line(&line);
                tracing::debug!(property = property.as_str(), value, "property read");
                self.view.property_mut(property).sync(value);
            }
            Err(err) => log_failure(&format!("can't read property {}", property.as_str()), err),
        }
    }

    pub fn set_property(&mut self, property: RuntimeProperty, value: bool) {
        let helper = Arc::clone(&self.services.helper);
        self.dispatcher.spawn("write property", move || PanelEvent::PropertyWritten {
            property,
            result: helper.set_property(property, value),
        });
    }

    /// Change handler of the property switches.
    pub fn property_toggled(&mut self, property: RuntimeProperty, active: bool) {
        if let Some(value) = self.view.property_mut(property).set_by_user(active) {
            self.set_property(property, value);
        }
    }

    pub fn set_uevent(&mut self, active: bool) {
        self.property_toggled(RuntimeProperty::Uevent, active);
    }

    pub fn set_suspend(&mut self, active: bool) {
        self.property_toggled(RuntimeProperty::Suspend, active);
    }

    pub fn toggle_shared_folder(&mut self, active: bool) {
        let Some(active) = self.view.shared_folder.set_by_user(active) else {
            return;
        };
        let Some(folder) = &self.paths.shared_folder else {
            return;
        };
        let result = if active {
            folder.enable()
        } else {
            folder.disable()
        };
        match result {
            Ok(()) => tracing::info!(active, marker = %folder.marker().display(), "shared folder toggled"),
            Err(err) => log_failure("can't update shared folder marker", err),
        }
    }

    pub fn list_applications(&mut self) {
        let paths =
            desktop::search_applications(&self.paths.application_dirs, &self.config.search_term);
        self.rows = collect_rows(&paths, &self.config);
        self.rows_generation += 1;
        tracing::debug!(rows = self.rows.len(), "application list rebuilt");
    }

    pub fn set_row_expanded(&mut self, index: usize, expanded: bool) {
        if let Some(PanelRow::App(app)) = self.rows.get_mut(index) {
            app.set_expanded(expanded);
        }
    }

    pub fn app_visibility_toggled(&mut self, index: usize, active: bool) {
        if let Some(PanelRow::App(app)) = self.rows.get_mut(index) {
            app.toggle_visibility(active);
        }
    }

    pub fn app_removal_prompt(&self, index: usize) -> Option<RemovalPrompt> {
        match self.rows.get(index)? {
            PanelRow::App(app) => app.request_remove(),
            PanelRow::Store(_) => None,
        }
    }

    pub fn app_removal_response(&mut self, index: usize, response: &str) -> bool {
        match self.rows.get_mut(index) {
            Some(PanelRow::App(app)) => {
                app.respond_to_removal(response, self.services.launcher.as_ref())
            }
            _ => false,
        }
    }

    fn store_entry_mut(&mut self) -> Option<&mut StoreEntry> {
        self.rows.iter_mut().find_map(|row| match row {
            PanelRow::Store(store) => Some(store),
            PanelRow::App(_) => None,
        })
    }

    pub fn install_store_app(&mut self) {
        let Some(store) = self.store_entry_mut() else {
            return;
        };
        if !store.begin_install() {
            return;
        }

        let fetcher = Arc::clone(&self.services.fetcher);
        let url = self.config.store_apk_url.clone();
        let destination = self.config.store_apk_path.clone();
        tracing::info!(url, "downloading store application");
        self.dispatcher.spawn("download store", move || {
            PanelEvent::StoreDownloaded(fetcher.fetch(&url, &destination))
        });
    }

    fn on_store_downloaded(&mut self, result: DownloadResult<u64>) {
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) => {
                let message = err.to_string();
                log_failure("can't download store application", err);
                if let Some(store) = self.store_entry_mut() {
                    store.show_error(message);
                }
                return;
            }
        };
        tracing::debug!(bytes, "store application downloaded");
        if let Some(store) = self.store_entry_mut() {
            store.download_finished();
        }

        let helper = Arc::clone(&self.services.helper);
        let apk = self.config.store_apk_path.clone();
        self.dispatcher.spawn("install store", move || {
            PanelEvent::StoreInstallExited(helper.install_app(&apk))
        });
    }

    fn on_store_install_exited(&mut self, result: HelperResult<ExitStatus>) {
        match result {
            Ok(status) => {
                tracing::info!(%status, "store installer exited");
                if let Some(store) = self.store_entry_mut() {
                    store.mark_installed();
                }
                if let Err(err) = fs::remove_file(&self.config.store_apk_path) {
                    tracing::debug!(?err, "leaving downloaded store package behind");
                }
            }
            Err(err) => {
                let message = err.to_string();
                log_failure("can't install store application", err);
                if let Some(store) = self.store_entry_mut() {
                    store.show_error(message);
                }
            }
        }
    }
}

/// Builds the application rows: container apps sorted by name, store row first when missing.
fn collect_rows(paths: &[PathBuf], config: &PanelConfig) -> Vec<PanelRow> {
    let mut apps = Vec::new();
    let mut store_present = false;

    for path in paths {
        let entry = match DesktopEntry::load(path) {
            Ok(entry) => entry,
            Err(err) => {
                log_failure("skipping unreadable desktop entry", err);
                continue;
            }
        };
        if entry.exec_contains(&config.store_package) {
            store_present = true;
        }
        if !entry.exec_contains(&config.launch_marker) {
            continue;
        }
        match AppEntry::new(entry) {
            Ok(app) => apps.push(app),
            Err(err) => log_failure("skipping incomplete desktop entry", err),
        }
    }

    apps.sort_by(|a, b| a.name().cmp(b.name()));

    let mut rows = Vec::with_capacity(apps.len() + 1);
    if !store_present {
        rows.push(PanelRow::Store(StoreEntry::new()));
    }
    rows.extend(apps.into_iter().map(PanelRow::App));
    rows
}
