use thiserror::Error;

mod packagekit;

pub use packagekit::PackageKitBackend;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("package backend unreachable: {0}")]
    Unreachable(#[from] zbus::Error),
    #[error("package {name} not found: {details}")]
    NotFound { name: String, details: String },
    #[error("package transaction failed with code {code}: {details}")]
    Transaction { code: u32, details: String },
}

pub type PackageResult<T> = std::result::Result<T, PackageError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub id: String,
    pub installed: bool,
}

/// Candidates returned by a name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub packages: Vec<PackageRecord>,
}

impl Resolution {
    pub fn is_installed(&self) -> bool {
        self.packages.iter().any(|package| package.installed)
    }

    /// First candidate that isn't installed yet.
    pub fn install_candidate(&self) -> Option<&PackageRecord> {
        self.packages.iter().find(|package| !package.installed)
    }
}

/// System package manager as seen by the panel.
pub trait PackageBackend: Send + Sync {
    fn resolve(&self, name: &str) -> PackageResult<Resolution>;
    fn install(&self, package_ids: &[String]) -> PackageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, installed: bool) -> PackageRecord {
        PackageRecord {
            id: id.to_string(),
            installed,
        }
    }

    #[test]
    fn install_candidate_is_first_uninstalled_package() {
        let resolution = Resolution {
            packages: vec![
                record("waydroid;1.4.2;all;main", false),
                record("waydroid;1.4.3;all;updates", false),
            ],
        };
        assert!(!resolution.is_installed());
        assert_eq!(
            resolution.install_candidate().map(|p| p.id.as_str()),
            Some("waydroid;1.4.2;all;main")
        );
    }

    #[test]
    fn any_installed_record_marks_resolution_installed() {
        let resolution = Resolution {
            packages: vec![
                record("waydroid;1.4.3;all;updates", false),
                record("waydroid;1.4.2;all;installed", true),
            ],
        };
        assert!(resolution.is_installed());
        assert!(Resolution::default().install_candidate().is_none());
    }
}
