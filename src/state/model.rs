/// Which step of the setup flow the panel is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Uninitialized,
    CheckingInstall,
    InstallNeeded,
    Installing,
    CheckingRunning,
    /// The status query failed; the install screen is shown without an install action.
    ServiceUnavailable,
    Configure,
}

impl ViewState {
    pub fn shows_configure_screen(self) -> bool {
        matches!(self, Self::Configure)
    }
}
