pub mod config;
mod error;
pub mod sender;
pub mod serial;
pub mod trigger;
pub mod web;

pub use config::{Config, SerialConfig};
pub use error::{Error, Result};
pub use serial::{CommandCodec, LedCommand, LedController};
pub use trigger::{process::ProcessLauncher, Backend, Trigger};
