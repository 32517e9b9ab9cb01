//! Logging setup
//!
//! Logs go to stderr so stdout stays reserved for CSV output. The filter is
//! read from `RUST_LOG` and defaults to `info`.

use crate::cli::LogFormat;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber
///
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if let Err(error) = result {
        tracing::debug!(%error, "Tracing subscriber already installed");
    }
}
