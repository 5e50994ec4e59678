use super::error::{StateError, StateResult};
use super::{event::StateTransition, ViewEvent, ViewState};

#[derive(Debug)]
pub struct StateMachine {
    state: ViewState,
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: ViewState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn can_transition(&self, event: ViewEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: ViewEvent) -> Option<ViewState> {
        use ViewEvent::*;
        use ViewState::*;
        match (self.state, event) {
            (Uninitialized | InstallNeeded | ServiceUnavailable | Configure, CheckInstall) => {
                Some(CheckingInstall)
            }
            (CheckingInstall, PackageMissing) => Some(InstallNeeded),
            (CheckingInstall, PackageFound | ResolveFailed) => Some(CheckingRunning),
            (InstallNeeded, Install) => Some(Installing),
            (Installing, InstallSucceeded) => Some(CheckingRunning),
            (Installing, InstallFailed) => Some(InstallNeeded),
            (CheckingRunning | ServiceUnavailable | Configure, CheckRunning) => {
                Some(CheckingRunning)
            }
            (CheckingRunning | ServiceUnavailable | Configure, SessionReported) => Some(Configure),
            (CheckingRunning | ServiceUnavailable | Configure, SessionUnavailable) => {
                Some(ServiceUnavailable)
            }
            _ => None,
        }
    }

    pub fn transition(&mut self, event: ViewEvent) -> StateResult<ViewState> {
        tracing::debug!(from = ?self.state, event = ?event, "request view transition");
        let next = self
            .next_state(event)
            .ok_or(StateError::InvalidStateTransition {
                from: self.state,
                event,
            })?;

        let record = StateTransition::new(Some(self.state), event, next);
        self.state = next;
        self.transition_history.push(record);

        Ok(self.state)
    }
}

#[cfg(test)]
impl StateMachine {
    fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_flow_reaches_configure_screen() {
        let mut machine = StateMachine::new();
        for event in [
            ViewEvent::CheckInstall,
            ViewEvent::PackageMissing,
            ViewEvent::Install,
            ViewEvent::InstallSucceeded,
            ViewEvent::CheckRunning,
            ViewEvent::SessionReported,
        ] {
            machine
                .transition(event)
                .unwrap_or_else(|err| panic!("{event:?} should transition: {err}"));
        }

        assert_eq!(machine.state(), ViewState::Configure);
        assert_eq!(machine.history().len(), 6);
        assert_eq!(
            machine.history()[2],
            StateTransition::new(
                Some(ViewState::InstallNeeded),
                ViewEvent::Install,
                ViewState::Installing
            )
        );
    }

    #[test]
    fn failed_install_loops_back_to_install_needed() {
        let mut machine = StateMachine::new();
        machine.transition(ViewEvent::CheckInstall).unwrap();
        machine.transition(ViewEvent::PackageMissing).unwrap();
        machine.transition(ViewEvent::Install).unwrap();
        machine.transition(ViewEvent::InstallFailed).unwrap();

        assert_eq!(machine.state(), ViewState::InstallNeeded);
        assert!(machine.can_transition(ViewEvent::Install));
        assert!(!machine.can_transition(ViewEvent::SessionReported));
    }

    #[test]
    fn resolve_failure_still_checks_the_service() {
        let mut machine = StateMachine::new();
        machine.transition(ViewEvent::CheckInstall).unwrap();
        machine.transition(ViewEvent::ResolveFailed).unwrap();
        assert_eq!(machine.state(), ViewState::CheckingRunning);

        machine.transition(ViewEvent::SessionUnavailable).unwrap();
        assert_eq!(machine.state(), ViewState::ServiceUnavailable);
        assert!(!machine.state().shows_configure_screen());

        machine.transition(ViewEvent::CheckRunning).unwrap();
        machine.transition(ViewEvent::SessionReported).unwrap();
        assert!(machine.state().shows_configure_screen());
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_history() {
        let mut machine = StateMachine::new();

        let err = machine
            .transition(ViewEvent::Install)
            .expect_err("uninitialized -> install should fail");
        assert!(matches!(
            err,
            StateError::InvalidStateTransition {
                from: ViewState::Uninitialized,
                event: ViewEvent::Install
            }
        ));
        assert_eq!(machine.state(), ViewState::Uninitialized);
        assert!(machine.history().is_empty());
    }
}
