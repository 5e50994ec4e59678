use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use gtk4::glib::SourceId;
use gtk4::prelude::*;
use gtk4::{
    Align, Box as GtkBox, Button, Dialog, Label, ListBox, Orientation, PolicyType, ResponseType,
    ScrolledWindow, SelectionMode, Spinner, Stack,
};

use crate::panel::{Screen, WaydroidPanel};
use crate::rows::RemovalPrompt;

use super::rows::{RowAction, RowHandler, RowWidgets};
use super::style::{StyleTokens, LAYOUT_TOKENS};
use super::widgets::{section_title, setting_row, SyncedSwitch};

const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);

struct PanelWidgets {
    root: GtkBox,
    stack: Stack,
    status: Label,
    install_box: GtkBox,
    install_button: Button,
    install_spinner: Spinner,
    running: SyncedSwitch,
    uevent: SyncedSwitch,
    suspend: SyncedSwitch,
    shared_folder: SyncedSwitch,
    app_list: ListBox,
}

struct PanelRuntime {
    panel: RefCell<WaydroidPanel>,
    widgets: OnceCell<PanelWidgets>,
    rows: RefCell<Vec<RowWidgets>>,
    rows_generation: Cell<Option<u64>>,
    poll_source: RefCell<Option<SourceId>>,
    tokens: StyleTokens,
}

/// GTK front end of a [`WaydroidPanel`].
///
/// Widgets only hold weak references back to the panel; whoever owns the
/// `PanelUi` decides how long it lives. Dropping it, or calling
/// [`PanelUi::shutdown`], stops result polling and cancels background work.
pub struct PanelUi {
    runtime: Rc<PanelRuntime>,
}

impl PanelUi {
    pub fn new(panel: WaydroidPanel) -> Self {
        let runtime = Rc::new(PanelRuntime {
            panel: RefCell::new(panel),
            widgets: OnceCell::new(),
            rows: RefCell::new(Vec::new()),
            rows_generation: Cell::new(None),
            poll_source: RefCell::new(None),
            tokens: LAYOUT_TOKENS,
        });
        let widgets = build_widgets(&runtime);
        {
            let weak = Rc::downgrade(&runtime);
            widgets.root.connect_unrealize(move |_| {
                if let Some(runtime) = weak.upgrade() {
                    runtime.shutdown();
                }
            });
        }
        if runtime.widgets.set(widgets).is_err() {
            tracing::warn!("panel widgets were already built");
        }

        runtime.apply(WaydroidPanel::start);
        runtime.start_polling();
        Self { runtime }
    }

    pub fn root(&self) -> Option<&GtkBox> {
        self.runtime.widgets.get().map(|widgets| &widgets.root)
    }

    pub fn shutdown(&self) {
        self.runtime.shutdown();
    }
}

impl Drop for PanelUi {
    fn drop(&mut self) {
        self.runtime.shutdown();
    }
}

impl PanelRuntime {
    /// Runs a panel operation and redraws. Re-entrant calls are dropped.
    fn apply(self: &Rc<Self>, op: impl FnOnce(&mut WaydroidPanel)) {
        match self.panel.try_borrow_mut() {
            Ok(mut panel) => op(&mut panel),
            Err(_) => {
                tracing::debug!("panel busy; ignoring nested widget event");
                return;
            }
        }
        self.render();
    }

    fn start_polling(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let source = gtk4::glib::timeout_add_local(RESULT_POLL_INTERVAL, move || {
            let Some(runtime) = weak.upgrade() else {
                return gtk4::glib::ControlFlow::Break;
            };
            let handled = match runtime.panel.try_borrow_mut() {
                Ok(mut panel) => panel.pump(),
                Err(_) => 0,
            };
            if handled > 0 {
                runtime.render();
            }
            gtk4::glib::ControlFlow::Continue
        });
        *self.poll_source.borrow_mut() = Some(source);
    }

    /// Stops polling and cancels the panel's workers. Safe to call twice.
    fn shutdown(&self) {
        let Some(source) = self.poll_source.borrow_mut().take() else {
            return;
        };
        source.remove();
        match self.panel.try_borrow() {
            Ok(panel) => panel.shutdown(),
            Err(_) => tracing::warn!("panel busy during shutdown; workers keep running"),
        }
    }

    fn render(self: &Rc<Self>) {
        let Some(widgets) = self.widgets.get() else {
            return;
        };
        let Ok(panel) = self.panel.try_borrow() else {
            return;
        };
        let view = panel.view();

        widgets.stack.set_visible_child_name(view.screen.name());
        widgets.status.set_text(view.status.text());
        widgets.install_box.set_sensitive(view.install_box_visible);
        widgets
            .install_box
            .set_opacity(if view.install_box_visible { 1.0 } else { 0.0 });
        widgets
            .install_button
            .set_sensitive(view.install_button_sensitive);
        widgets.install_spinner.set_spinning(view.spinner_active);
        widgets.running.show(view.running);
        widgets.uevent.show(view.uevent);
        widgets.suspend.show(view.suspend);
        widgets.shared_folder.show(view.shared_folder);

        if self.rows_generation.get() == Some(panel.rows_generation()) {
            for (row_widgets, row) in self.rows.borrow().iter().zip(panel.rows()) {
                row_widgets.update(row);
            }
            return;
        }

        while let Some(child) = widgets.app_list.first_child() {
            widgets.app_list.remove(&child);
        }
        let handler = self.row_handler();
        let rows = panel
            .rows()
            .iter()
            .enumerate()
            .map(|(index, row)| RowWidgets::build(index, row, &handler, self.tokens))
            .collect::<Vec<_>>();
        for row in &rows {
            widgets.app_list.append(row.root());
        }
        *self.rows.borrow_mut() = rows;
        self.rows_generation.set(Some(panel.rows_generation()));
    }

    fn row_handler(self: &Rc<Self>) -> RowHandler {
        let weak = Rc::downgrade(self);
        Rc::new(move |index, action| {
            let Some(runtime) = weak.upgrade() else {
                return;
            };
            match action {
                RowAction::Expanded(expanded) => {
                    runtime.apply(|panel| panel.set_row_expanded(index, expanded))
                }
                RowAction::VisibilityToggled(active) => {
                    runtime.apply(|panel| panel.app_visibility_toggled(index, active))
                }
                RowAction::RemoveClicked => runtime.confirm_removal(index),
                RowAction::StoreInstallClicked => runtime.apply(WaydroidPanel::install_store_app),
            }
        })
    }

    fn confirm_removal(self: &Rc<Self>, index: usize) {
        let prompt = match self.panel.try_borrow() {
            Ok(panel) => panel.app_removal_prompt(index),
            Err(_) => None,
        };
        let Some(prompt) = prompt else {
            return;
        };
        let dialog = removal_dialog(&prompt, self.tokens);
        if let Some(window) = self
            .widgets
            .get()
            .and_then(|widgets| widgets.root.root())
            .and_downcast::<gtk4::Window>()
        {
            dialog.set_transient_for(Some(&window));
        }

        let weak = Rc::downgrade(self);
        dialog.connect_response(move |dialog, response| {
            let answer = match response {
                ResponseType::Other(position) => prompt.response_at(usize::from(position)),
                _ => prompt.close_response,
            };
            if let Some(runtime) = weak.upgrade() {
                runtime.apply(|panel| {
                    panel.app_removal_response(index, answer);
                });
            }
            dialog.close();
        });
        dialog.present();
    }
}

fn removal_dialog(prompt: &RemovalPrompt, tokens: StyleTokens) -> Dialog {
    let dialog = Dialog::new();
    dialog.set_title(Some(prompt.heading.as_str()));
    dialog.set_modal(true);
    dialog.set_destroy_with_parent(true);
    for (position, (id, label)) in (0u16..).zip(prompt.responses.iter()) {
        let response = ResponseType::Other(position);
        dialog.add_button(label, response);
        if *id == prompt.default_response {
            dialog.set_default_response(response);
        }
        if *id == prompt.destructive_response {
            if let Some(button) = dialog.widget_for_response(response) {
                button.add_css_class("destructive-action");
            }
        }
    }

    let body = Label::new(Some(prompt.body.as_str()));
    body.set_wrap(true);
    let content = GtkBox::new(Orientation::Vertical, 0);
    content.set_margin_top(tokens.spacing_12);
    content.set_margin_bottom(tokens.spacing_12);
    content.set_margin_start(tokens.spacing_12);
    content.set_margin_end(tokens.spacing_12);
    content.append(&body);
    dialog.content_area().append(&content);
    dialog
}

fn switch_handler(
    runtime: &Rc<PanelRuntime>,
    op: fn(&mut WaydroidPanel, bool),
) -> impl Fn(bool) + 'static {
    let weak = Rc::downgrade(runtime);
    move |active| {
        if let Some(runtime) = weak.upgrade() {
            runtime.apply(|panel| op(panel, active));
        }
    }
}

fn build_widgets(runtime: &Rc<PanelRuntime>) -> PanelWidgets {
    let tokens = runtime.tokens;

    let status = Label::new(None);
    status.add_css_class("waydroid-status");
    status.set_wrap(true);

    let install_button = Button::with_label("Install");
    install_button.add_css_class("suggested-action");
    {
        let weak = Rc::downgrade(runtime);
        install_button.connect_clicked(move |_| {
            if let Some(runtime) = weak.upgrade() {
                runtime.apply(WaydroidPanel::install_package);
            }
        });
    }
    let install_spinner = Spinner::new();
    let install_box = GtkBox::new(Orientation::Horizontal, tokens.spacing_8);
    install_box.set_halign(Align::Center);
    install_box.append(&install_button);
    install_box.append(&install_spinner);

    let install_page = GtkBox::new(Orientation::Vertical, tokens.spacing_24);
    install_page.set_valign(Align::Center);
    install_page.append(&status);
    install_page.append(&install_box);

    let running = SyncedSwitch::new(switch_handler(runtime, WaydroidPanel::set_running_state));
    let uevent = SyncedSwitch::new(switch_handler(runtime, WaydroidPanel::set_uevent));
    let suspend = SyncedSwitch::new(switch_handler(runtime, WaydroidPanel::set_suspend));
    let shared_folder =
        SyncedSwitch::new(switch_handler(runtime, WaydroidPanel::toggle_shared_folder));

    let settings = GtkBox::new(Orientation::Vertical, tokens.spacing_12);
    settings.add_css_class("waydroid-settings");
    settings.append(&section_title("Container"));
    settings.append(&setting_row("Waydroid container", running.widget(), tokens.spacing_8));
    settings.append(&setting_row("Device hotplug events", uevent.widget(), tokens.spacing_8));
    settings.append(&setting_row(
        "Suspend container when inactive",
        suspend.widget(),
        tokens.spacing_8,
    ));
    settings.append(&setting_row(
        "Share folders with Android",
        shared_folder.widget(),
        tokens.spacing_8,
    ));

    let app_list = ListBox::new();
    app_list.set_selection_mode(SelectionMode::None);
    app_list.add_css_class("boxed-list");
    settings.append(&section_title("Android applications"));
    settings.append(&app_list);

    let configure_page = ScrolledWindow::new();
    configure_page.set_policy(PolicyType::Never, PolicyType::Automatic);
    configure_page.set_vexpand(true);
    configure_page.set_child(Some(&settings));

    let stack = Stack::new();
    stack.add_named(&install_page, Some(Screen::Install.name()));
    stack.add_named(&configure_page, Some(Screen::Configure.name()));

    let root = GtkBox::new(Orientation::Vertical, 0);
    root.add_css_class("waydroid-panel");
    root.append(&stack);

    PanelWidgets {
        root,
        stack,
        status,
        install_box,
        install_button,
        install_spinner,
        running,
        uevent,
        suspend,
        shared_folder,
        app_list,
    }
}
