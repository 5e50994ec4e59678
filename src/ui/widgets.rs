use gtk4::glib::SignalHandlerId;
use gtk4::prelude::*;
use gtk4::{Align, Box as GtkBox, Label, Orientation, Switch};

use crate::toggle::Toggle;

/// A switch whose change handler only fires for user input.
///
/// [`SyncedSwitch::show`] blocks the handler while it copies a [`Toggle`]
/// onto the widget.
pub struct SyncedSwitch {
    switch: Switch,
    handler: SignalHandlerId,
}

impl SyncedSwitch {
    pub fn new(on_toggle: impl Fn(bool) + 'static) -> Self {
        let switch = Switch::new();
        switch.set_valign(Align::Center);
        let handler = switch.connect_active_notify(move |switch| on_toggle(switch.is_active()));
        Self { switch, handler }
    }

    pub fn widget(&self) -> &Switch {
        &self.switch
    }

    pub fn show(&self, toggle: Toggle) {
        if self.switch.is_active() != toggle.active() {
            self.switch.block_signal(&self.handler);
            self.switch.set_active(toggle.active());
            self.switch.unblock_signal(&self.handler);
        }
        self.switch.set_sensitive(toggle.sensitive());
    }
}

pub fn section_title(text: &str) -> Label {
    let label = Label::new(Some(text));
    label.add_css_class("waydroid-section-title");
    label.set_halign(Align::Start);
    label.set_xalign(0.0);
    label
}

/// Title on the left, `control` on the right.
pub fn setting_row(title: &str, control: &impl IsA<gtk4::Widget>, spacing: i32) -> GtkBox {
    let label = Label::new(Some(title));
    label.set_halign(Align::Start);
    label.set_xalign(0.0);
    label.set_hexpand(true);

    let row = GtkBox::new(Orientation::Horizontal, spacing);
    row.append(&label);
    row.append(control);
    row
}
