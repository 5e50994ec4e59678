use std::path::Path;
use std::rc::Rc;

use gtk4::glib::SignalHandlerId;
use gtk4::prelude::*;
use gtk4::{Align, Box as GtkBox, Button, Expander, Image, Label, Orientation, Spinner};

use crate::rows::{AppEntry, ListEntry, PanelRow, StoreEntry};

use super::style::StyleTokens;
use super::widgets::{setting_row, SyncedSwitch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RowAction {
    Expanded(bool),
    VisibilityToggled(bool),
    RemoveClicked,
    StoreInstallClicked,
}

pub(super) type RowHandler = Rc<dyn Fn(usize, RowAction)>;

pub(super) enum RowWidgets {
    App {
        root: GtkBox,
        expander: Expander,
        expanded_handler: SignalHandlerId,
        visibility: SyncedSwitch,
        remove: Button,
    },
    Store {
        root: GtkBox,
        title: Label,
        spinner: Spinner,
        button: Button,
    },
}

impl RowWidgets {
    pub(super) fn build(
        index: usize,
        row: &PanelRow,
        handler: &RowHandler,
        tokens: StyleTokens,
    ) -> Self {
        let widgets = match row {
            PanelRow::App(app) => build_app_row(index, app, handler, tokens),
            PanelRow::Store(store) => build_store_row(index, store, handler, tokens),
        };
        widgets.update(row);
        widgets
    }

    pub(super) fn root(&self) -> &GtkBox {
        match self {
            Self::App { root, .. } | Self::Store { root, .. } => root,
        }
    }

    pub(super) fn update(&self, row: &PanelRow) {
        match (self, row) {
            (
                Self::App {
                    root,
                    expander,
                    expanded_handler,
                    visibility,
                    remove,
                },
                PanelRow::App(app),
            ) => {
                let appearance = app.appearance();
                if expander.is_expanded() != appearance.expanded {
                    expander.block_signal(expanded_handler);
                    expander.set_expanded(appearance.expanded);
                    expander.unblock_signal(expanded_handler);
                }
                root.set_sensitive(appearance.sensitive);
                root.set_opacity(appearance.opacity);
                visibility.show(app.launcher_visible());
                remove.set_sensitive(app.primary_action_sensitive());
            }
            (
                Self::Store {
                    title,
                    spinner,
                    button,
                    ..
                },
                PanelRow::Store(store),
            ) => {
                title.set_text(store.title());
                button.set_label(store.primary_action_label());
                button.set_sensitive(store.primary_action_sensitive());
                spinner.set_spinning(store.busy());
                spinner.set_visible(store.busy());
            }
            _ => tracing::warn!("row widgets no longer match their entry"),
        }
    }
}

fn entry_icon(icon: Option<&str>, tokens: StyleTokens) -> Image {
    let image = match icon {
        Some(icon) if Path::new(icon).is_absolute() => Image::from_file(icon),
        Some(icon) => Image::from_icon_name(icon),
        None => Image::from_icon_name("system-software-install-symbolic"),
    };
    image.set_pixel_size(tokens.icon_size);
    image
}

fn build_app_row(
    index: usize,
    app: &AppEntry,
    handler: &RowHandler,
    tokens: StyleTokens,
) -> RowWidgets {
    let header = GtkBox::new(Orientation::Horizontal, tokens.spacing_12);
    header.append(&entry_icon(app.icon(), tokens));
    let name = Label::new(Some(app.title()));
    name.set_halign(Align::Start);
    header.append(&name);

    let expander = Expander::new(None);
    expander.set_label_widget(Some(&header));
    let expanded_handler = {
        let handler = Rc::clone(handler);
        expander.connect_expanded_notify(move |expander| {
            handler(index, RowAction::Expanded(expander.is_expanded()))
        })
    };

    let visibility = {
        let handler = Rc::clone(handler);
        SyncedSwitch::new(move |active| handler(index, RowAction::VisibilityToggled(active)))
    };

    let remove = Button::with_label(app.primary_action_label());
    remove.add_css_class("destructive-action");
    remove.set_halign(Align::End);
    {
        let handler = Rc::clone(handler);
        remove.connect_clicked(move |_| handler(index, RowAction::RemoveClicked));
    }

    let details = GtkBox::new(Orientation::Vertical, tokens.spacing_8);
    details.set_margin_top(tokens.spacing_8);
    details.set_margin_start(tokens.spacing_24);
    details.append(&setting_row(
        "Show in app launcher",
        visibility.widget(),
        tokens.spacing_8,
    ));
    details.append(&remove);
    expander.set_child(Some(&details));

    let root = GtkBox::new(Orientation::Vertical, 0);
    root.set_margin_top(tokens.spacing_4);
    root.set_margin_bottom(tokens.spacing_4);
    root.append(&expander);

    RowWidgets::App {
        root,
        expander,
        expanded_handler,
        visibility,
        remove,
    }
}

fn build_store_row(
    index: usize,
    store: &StoreEntry,
    handler: &RowHandler,
    tokens: StyleTokens,
) -> RowWidgets {
    let title = Label::new(Some(store.title()));
    title.set_halign(Align::Start);
    title.set_xalign(0.0);
    title.set_wrap(true);

    let subtitle = Label::new(store.subtitle());
    subtitle.add_css_class("waydroid-row-subtitle");
    subtitle.set_halign(Align::Start);
    subtitle.set_xalign(0.0);

    let text = GtkBox::new(Orientation::Vertical, tokens.spacing_4);
    text.set_hexpand(true);
    text.append(&title);
    text.append(&subtitle);

    let spinner = Spinner::new();
    let button = Button::with_label(store.primary_action_label());
    button.set_valign(Align::Center);
    {
        let handler = Rc::clone(handler);
        button.connect_clicked(move |_| handler(index, RowAction::StoreInstallClicked));
    }

    let root = GtkBox::new(Orientation::Horizontal, tokens.spacing_12);
    root.set_margin_top(tokens.spacing_4);
    root.set_margin_bottom(tokens.spacing_4);
    root.append(&entry_icon(store.icon(), tokens));
    root.append(&text);
    root.append(&spinner);
    root.append(&button);

    RowWidgets::Store {
        root,
        title,
        spinner,
        button,
    }
}
