pub mod process;

use std::time::Duration;

use process::ProcessLauncher;

use crate::{serial::LedController, Error, Result};

/// How a trigger reaches the LED.
#[derive(Debug)]
pub enum Backend {
    /// Write the command through the long-lived serial controller.
    Serial(LedController),
    /// Launch an external sender program and judge it by its exit code.
    Process(ProcessLauncher),
}

/// The action behind `/turn_on_led`, bounded in time.
#[derive(Debug)]
pub struct Trigger {
    backend: Backend,
    timeout: Duration,
}

impl Trigger {
    pub fn new(backend: Backend, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub async fn turn_on_led(&self) -> Result<()> {
        let action = async {
            match &self.backend {
                Backend::Serial(controller) => controller.turn_on_led().await,
                Backend::Process(launcher) => launcher.run().await,
            }
        };

        tokio::time::timeout(self.timeout, action)
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }
}
