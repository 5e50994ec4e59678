use anyhow::Context;
use gtk4::prelude::*;
use gtk4::{Application, ApplicationWindow};
use waydroid_panel::ui::{register_resources, PanelUi, LAYOUT_TOKENS};

const APP_ID: &str = "org.droidian.WaydroidPanel";

fn main() -> anyhow::Result<()> {
    waydroid_panel::logging::init();
    tracing::info!("starting waydroid panel");

    let app = Application::builder().application_id(APP_ID).build();
    app.connect_activate(|app| {
        if let Err(err) = build_window(app) {
            tracing::error!(?err, "failed to build panel window");
            app.quit();
        }
    });

    let status = app.run();
    if status != gtk4::glib::ExitCode::SUCCESS {
        anyhow::bail!("application exited with status {}", status.value());
    }
    Ok(())
}

fn build_window(app: &Application) -> anyhow::Result<()> {
    register_resources();
    let panel = waydroid_panel::system_panel().context("failed to set up system services")?;
    let ui = PanelUi::new(panel);

    let window = ApplicationWindow::builder()
        .application(app)
        .title("Waydroid")
        .default_width(LAYOUT_TOKENS.window_width)
        .default_height(LAYOUT_TOKENS.window_height)
        .build();
    window.set_child(ui.root());
    window.connect_destroy(move |_| ui.shutdown());
    window.present();
    Ok(())
}
