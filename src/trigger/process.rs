use std::process::Stdio;

use tokio::{process::Command, sync::Mutex};
use tracing::{debug, info};

use crate::{Error, Result};

/// Runs an external sender program for every trigger.
///
/// Children are started one at a time so two of them never fight over the serial device.
#[derive(Debug)]
pub struct ProcessLauncher {
    program: String,
    args: Vec<String>,
    running: Mutex<()>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            running: Mutex::new(()),
        }
    }

    /// Build a launcher from a full command line, program first.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Launch the program and wait for it to exit.
    ///
    /// The child is killed if this future is dropped before it finishes.
    pub async fn run(&self) -> Result<()> {
        let _guard = self.running.lock().await;

        debug!(program = %self.program, args = ?self.args, "launching sender");
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            info!(program = %self.program, "sender finished");
            Ok(())
        } else {
            Err(Error::ProcessFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
