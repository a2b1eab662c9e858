//! Logging configuration using tracing_subscriber.
//!
//! The gateway itself only emits `tracing` events; hosts that do not install
//! their own subscriber can call [`init`].

use std::io::IsTerminal;
use std::sync::Once;

use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Level applied to this crate's target unless `RUST_LOG` names it.
pub const LOG_LEVEL_ENV_VAR: &str = "COMPLIANCE_GATEWAY_LOG";

const CRATE_TARGET: &str = "compliance_gateway";

/// Initializes a tracing subscriber writing to stderr.
pub fn init() {
    // Tests call this repeatedly.
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let (env_filter, level) = env_filter_and_log_level();

        let installed = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .try_init()
            .is_ok();

        if installed {
            tracing::debug!(level = %level, "gateway logging initialized");
        }
    });
}

fn env_filter_and_log_level() -> (EnvFilter, String) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let mut env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(&directives);

    let level = std::env::var(LOG_LEVEL_ENV_VAR).unwrap_or_else(|_| "info".to_string());

    if !directives.contains(&format!("{CRATE_TARGET}=")) {
        // An unparseable level leaves the RUST_LOG filter as is.
        if let Ok(directive) = format!("{CRATE_TARGET}={level}").parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    (env_filter, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        tracing::info!("still logging");
    }
}
