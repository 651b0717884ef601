//! Logging Infrastructure
//!
//! Console logging through `tracing-subscriber`. `RUST_LOG` takes
//! precedence over the configured level.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the logging system (console only)
///
/// # Arguments
/// * `level` - Log level used when `RUST_LOG` is unset (e.g., "info")
/// * `json_format` - JSON lines instead of the human-readable format
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?;
    }

    Ok(())
}

/// Security log helper - records authentication and authorization events
///
/// # Examples
/// ```no_run
/// rental_client::security_log!(WARN, "permission_denied", capability = "deleteDepartment");
/// rental_client::security_log!(INFO, "login", user_id = "42");
/// ```
#[macro_export]
macro_rules! security_log {
    (WARN, $event:expr, $($arg:tt)*) => {
        tracing::warn!(
            target: "security",
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            $($arg)*
        );
    };
    (INFO, $event:expr, $($arg:tt)*) => {
        tracing::info!(
            target: "security",
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            $($arg)*
        );
    };
}
