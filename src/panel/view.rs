use crate::helper::RuntimeProperty;
use crate::toggle::Toggle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Install,
    Configure,
}

impl Screen {
    /// Child name in the page stack.
    pub fn name(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Configure => "configure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    ServiceNeedsEnabling,
    PackageNeedsInstalling,
}

impl StatusMessage {
    pub fn text(self) -> &'static str {
        match self {
            Self::ServiceNeedsEnabling => "Waydroid service needs to be enabled",
            Self::PackageNeedsInstalling => "Waydroid package needs to be installed",
        }
    }
}

/// Everything the panel widgets display.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub screen: Screen,
    pub status: StatusMessage,
    pub install_box_visible: bool,
    pub install_button_sensitive: bool,
    pub spinner_active: bool,
    pub running: Toggle,
    pub uevent: Toggle,
    pub suspend: Toggle,
    pub shared_folder: Toggle,
}

impl PanelView {
    pub(super) fn initial(shared_folder: Toggle) -> Self {
        Self {
            screen: Screen::Install,
            status: StatusMessage::ServiceNeedsEnabling,
            install_box_visible: false,
            install_button_sensitive: false,
            spinner_active: false,
            running: Toggle::new(false, false),
            uevent: Toggle::default(),
            suspend: Toggle::default(),
            shared_folder,
        }
    }

    pub(super) fn set_package_installed(&mut self, installed: bool) {
        self.install_box_visible = !installed;
        self.install_button_sensitive = !installed;
        self.status = if installed {
            StatusMessage::ServiceNeedsEnabling
        } else {
            StatusMessage::PackageNeedsInstalling
        };
    }

    pub fn property(&self, property: RuntimeProperty) -> Toggle {
        match property {
            RuntimeProperty::Uevent => self.uevent,
            RuntimeProperty::Suspend => self.suspend,
        }
    }

    pub(super) fn property_mut(&mut self, property: RuntimeProperty) -> &mut Toggle {
        match property {
            RuntimeProperty::Uevent => &mut self.uevent,
            RuntimeProperty::Suspend => &mut self.suspend,
        }
    }
}
