use crate::container::ContainerError;
use crate::desktop::DesktopError;
use crate::download::DownloadError;
use crate::helper::HelperError;
use crate::packages::PackageError;
use crate::state::StateError;
use thiserror::Error;

pub type PanelResult<T> = std::result::Result<T, PanelError>;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Helper(#[from] HelperError),
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Desktop(#[from] DesktopError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("file operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure classes used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BackendUnreachable,
    NotFound,
    TransactionFailed,
    SpawnFailure,
    NonZeroExit,
    FileIo,
    Network,
    InvalidState,
}

impl PanelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Package(PackageError::Unreachable(_)) | Self::Container(_) => {
                ErrorKind::BackendUnreachable
            }
            Self::Package(PackageError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Package(PackageError::Transaction { .. }) => ErrorKind::TransactionFailed,
            Self::Helper(HelperError::CommandFailed { .. }) => ErrorKind::NonZeroExit,
            Self::Helper(HelperError::Output { .. }) => ErrorKind::FileIo,
            Self::Helper(_) => ErrorKind::SpawnFailure,
            Self::Download(DownloadError::Network { .. } | DownloadError::Client(_)) => {
                ErrorKind::Network
            }
            Self::Download(DownloadError::Io { .. }) | Self::Desktop(_) | Self::Io(_) => {
                ErrorKind::FileIo
            }
            Self::State(_) => ErrorKind::InvalidState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn module_errors_map_to_failure_classes() {
        let not_found = PanelError::from(PackageError::NotFound {
            name: "waydroid".to_string(),
            details: "no package".to_string(),
        });
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let spawn = PanelError::from(HelperError::Spawn {
            command: "waydroid prop get uevent".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert_eq!(spawn.kind(), ErrorKind::SpawnFailure);

        let rejected = PanelError::from(PackageError::Transaction {
            code: 3,
            details: "signature check failed".to_string(),
        });
        assert_eq!(rejected.kind(), ErrorKind::TransactionFailed);
        assert_ne!(rejected.kind(), ErrorKind::BackendUnreachable);

        let desktop = PanelError::from(DesktopError::MissingKey {
            path: PathBuf::from("/tmp/a.desktop"),
            key: "Name",
        });
        assert_eq!(desktop.kind(), ErrorKind::FileIo);
        assert_eq!(
            desktop.to_string(),
            "desktop entry /tmp/a.desktop has no Name key"
        );
    }

    #[test]
    fn rejected_view_transition_is_an_invalid_state() {
        let mut machine = crate::state::StateMachine::new();
        let err = machine
            .transition(crate::state::ViewEvent::Install)
            .unwrap_err();
        assert_eq!(PanelError::from(err).kind(), ErrorKind::InvalidState);
    }
}
