use zbus::blocking::{Connection, Proxy};
use zbus::zvariant::{DynamicType, OwnedObjectPath};

use super::{PackageBackend, PackageError, PackageRecord, PackageResult, Resolution};

const PK_NAME: &str = "org.freedesktop.PackageKit";
const PK_PATH: &str = "/org/freedesktop/PackageKit";
const PK_INTERFACE: &str = "org.freedesktop.PackageKit";
const PK_TRANSACTION_INTERFACE: &str = "org.freedesktop.PackageKit.Transaction";

const INFO_INSTALLED: u32 = 1;
const FILTER_NONE: u64 = 1 << 1;
const TRANSACTION_FLAGS_NONE: u64 = 0;

#[derive(Debug, Default)]
struct TransactionOutcome {
    packages: Vec<PackageRecord>,
    error: Option<(u32, String)>,
}

/// PackageKit daemon on the system bus.
#[derive(Debug, Default)]
pub struct PackageKitBackend;

impl PackageKitBackend {
    fn run_transaction<B>(&self, method: &str, body: &B) -> PackageResult<TransactionOutcome>
    where
        B: serde::Serialize + DynamicType,
    {
        let connection = Connection::system()?;
        let manager = Proxy::new(&connection, PK_NAME, PK_PATH, PK_INTERFACE)?;
        let path: OwnedObjectPath = manager.call("CreateTransaction", &())?;
        tracing::debug!(method, transaction = %path.as_str(), "created package transaction");

        let transaction = Proxy::new(
            &connection,
            PK_NAME,
            path.into_inner(),
            PK_TRANSACTION_INTERFACE,
        )?;
        let signals = transaction.receive_all_signals()?;
        transaction.call::<_, _, ()>(method, body)?;

        let mut outcome = TransactionOutcome::default();
        for message in signals {
            let header = message.header();
            let Some(member) = header.member() else {
                continue;
            };
            match member.as_str() {
                "Package" => {
                    let (info, id, _summary): (u32, String, String) =
                        message.body().deserialize()?;
                    outcome.packages.push(PackageRecord {
                        id,
                        installed: info == INFO_INSTALLED,
                    });
                }
                "ErrorCode" => {
                    let (code, details): (u32, String) = message.body().deserialize()?;
                    tracing::debug!(method, code, details, "package transaction error");
                    outcome.error = Some((code, details));
                }
                "Finished" => break,
                _ => {}
            }
        }

        Ok(outcome)
    }
}

impl PackageBackend for PackageKitBackend {
    fn resolve(&self, name: &str) -> PackageResult<Resolution> {
        let outcome = self.run_transaction("Resolve", &(FILTER_NONE, vec![name]))?;
        if let Some((_, details)) = outcome.error {
            return Err(PackageError::NotFound {
                name: name.to_string(),
                details,
            });
        }
        Ok(Resolution {
            packages: outcome.packages,
        })
    }

    fn install(&self, package_ids: &[String]) -> PackageResult<()> {
        let outcome = self.run_transaction(
            "InstallPackages",
            &(TRANSACTION_FLAGS_NONE, package_ids.to_vec()),
        )?;
        match outcome.error {
            Some((code, details)) => Err(PackageError::Transaction { code, details }),
            None => Ok(()),
        }
    }
}
