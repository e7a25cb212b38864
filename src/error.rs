use std::{io, process::ExitStatus, time::Duration};

use thiserror::Error;

use crate::config::ConfigError;

/// Everything that can stop the LED from turning on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open serial port {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },
    #[error("serial write failed: {0}")]
    Io(#[from] io::Error),
    /// The writer task owning the serial connection has gone away.
    #[error("serial connection is closed")]
    Closed,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} failed with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
