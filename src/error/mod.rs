//! Error types for the CLI/session boundary. The presentation and
//! telesoftware decoders stay total and never return `Result`; only I/O,
//! connection setup, and config loading can fail here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to connect to {host}:{port}")]
    Connect {
        host: String,
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {path}")]
    LoadFrame {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write dump file {path}")]
    DumpWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no profile named {0:?} in vidtexrc")]
    UnknownProfile(String),

    #[error("--host/--port or --profile/--file is required")]
    NoTarget,

    #[error("session I/O error")]
    Io(#[source] std::io::Error),
}
