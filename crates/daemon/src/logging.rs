// SPDX-License-Identifier: MIT

//! Logging setup: a rotating file appender plus an `RUST_LOG`-driven
//! filter (spec §9 ambient logging stack).

use crate::config::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let dir = config.log_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let file_name = config.log_path.file_name().ok_or_else(|| std::io::Error::other("log path has no file name"))?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = config.foreground.then(|| fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .with(stderr_layer)
        .init();

    Ok(guard)
}
