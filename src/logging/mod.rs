//! Runtime diagnostics setup.
//!
//! Installs an env-filtered `fmt` layer on stderr, plus an optional second
//! layer when `--trace <file>` is given: a `tracing-appender` non-blocking
//! file writer scoped to the `vidtex::trace` target, so the presentation
//! decoder can log one event per processed chunk without allocating on the
//! hot path.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Holds the background flush handle for the optional trace-file writer.
/// Dropping it stops the writer thread, so callers must keep it alive for
/// the process lifetime (`main` holds it in a local binding).
pub struct LoggingGuard {
    _trace_guard: Option<WorkerGuard>,
}

/// Initializes `tracing` for the process: an env-filtered `fmt` layer on
/// stderr (`vidtex=info` by default), plus an optional trace-level file
/// layer when `trace_path` is given.
pub fn init(trace_path: Option<&Path>) -> anyhow::Result<LoggingGuard> {
    let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "vidtex=info".into());
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let (trace_layer, guard) = match trace_path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .map_err(|source| crate::error::SessionError::DumpWrite {
                    path: path.display().to_string(),
                    source,
                })?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(EnvFilter::new("vidtex::trace=trace"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(trace_layer)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;

    Ok(LoggingGuard { _trace_guard: guard })
}
