pub mod config;
pub mod container;
pub mod desktop;
pub mod download;
pub mod error;
pub mod helper;
pub mod logging;
pub mod packages;
pub mod panel;
pub mod rows;
pub mod state;
pub mod toggle;
#[cfg(feature = "gtk")]
pub mod ui;
pub mod worker;

pub use error::{PanelError, PanelResult};
pub use panel::{PanelPaths, Services, WaydroidPanel};

/// Builds a panel wired to the host's package manager, container service and helper tool.
pub fn system_panel() -> PanelResult<WaydroidPanel> {
    let config = config::load_panel_config();
    tracing::debug!(?config, "loaded panel configuration");
    let services = Services::system(&config)?;
    Ok(WaydroidPanel::new(
        config,
        services,
        PanelPaths::for_current_user(),
    ))
}
