//! Logging initialization.
//!
//! The terminal belongs to the UI, so log output goes to the configured log
//! file rather than stdout/stderr.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::TuiError;

/// `RUST_LOG` when set and valid, otherwise the configured directive.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Install the global subscriber writing to `log_path`.
pub fn init_logging(config: &LoggingConfig, log_path: &Path) -> Result<(), TuiError> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let (json_layer, plain_layer) = if config.json {
        let layer = fmt::layer().json().with_writer(Mutex::new(file));
        (Some(layer), None)
    } else {
        let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
        (None, Some(layer))
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(json_layer)
        .with(plain_layer)
        .try_init()
        .map_err(|e| TuiError::Telemetry(e.to_string()))?;

    tracing::info!(
        log_path = %log_path.display(),
        json = config.json,
        "Logging initialized"
    );
    Ok(())
}
