// SPDX-License-Identifier: GPL-3.0-or-later
use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{anyhow, Context as _};
use tracing_subscriber::EnvFilter;

use crate::settings::LoggingSettings;

/// Send log messages to the configured file, appending to it if it already exists.
///
/// `RUST_LOG` takes precedence over the configured level.
pub(crate) fn init(settings: &LoggingSettings) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.path)
        .with_context(|| format!("Unable to open log file {}", settings.path.display()))?;
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)
            .with_context(|| format!("Invalid log level '{}'", settings.level))?,
    };
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!("Unable to set up logging: {}", err))
}
