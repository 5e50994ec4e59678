use super::model::ViewState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    CheckInstall,
    PackageMissing,
    PackageFound,
    ResolveFailed,
    Install,
    InstallSucceeded,
    InstallFailed,
    CheckRunning,
    SessionReported,
    SessionUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: Option<ViewState>,
    pub event: ViewEvent,
    pub to: ViewState,
}

impl StateTransition {
    pub const fn new(from: Option<ViewState>, event: ViewEvent, to: ViewState) -> Self {
        Self { from, event, to }
    }
}
