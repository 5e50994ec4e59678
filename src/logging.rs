use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "WAYDROID_PANEL_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the global fmt subscriber once; later calls are no-ops.
pub fn init() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let directives = filter_directives(
            std::env::var(LOG_ENV).ok(),
            std::env::var("RUST_LOG").ok(),
        );
        let filter = EnvFilter::try_new(&directives).unwrap_or_else(|err| {
            eprintln!("invalid log filter {directives:?}: {err}");
            EnvFilter::new(DEFAULT_DIRECTIVE)
        });
        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_err()
        {
            tracing::debug!("global subscriber already installed");
        }
    });
}

fn filter_directives(panel: Option<String>, rust_log: Option<String>) -> String {
    [panel, rust_log]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_variable_wins_over_rust_log() {
        assert_eq!(
            filter_directives(Some("debug".into()), Some("warn".into())),
            "debug"
        );
        assert_eq!(filter_directives(Some("  ".into()), Some("warn".into())), "warn");
        assert_eq!(filter_directives(None, None), "info");
    }

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
