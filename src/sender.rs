//! Interactive sender: one `p` keypress, one LED command.
pub mod terminal;

use std::{
    future::Future,
    io::{self, IsTerminal},
};

use terminal::{Crossterm, RawModeGuard};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::{config::SerialConfig, serial::LedController, Result};

pub const TRIGGER_KEY: u8 = b'p';

/// What Ctrl-C and Ctrl-D produce once the terminal is raw.
const INTERRUPT: u8 = 0x03;
const END_OF_TRANSMISSION: u8 = 0x04;

/// Turn keypresses from `keys` into LED commands until the input ends or `interrupt`
/// resolves.
///
/// Every `p` sends exactly one command and prints a confirmation to `out`. Returns the
/// number of commands sent, also when interrupted while waiting for a key.
pub async fn run<R, W, F>(
    mut keys: R,
    controller: &LedController,
    mut out: W,
    interrupt: F,
) -> Result<usize>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let mut sent = 0;

    loop {
        let read = tokio::select! {
            read = keys.read_u8() => read,
            () = &mut interrupt => {
                debug!("interrupted");
                break;
            }
        };

        let key = match read {
            Ok(key) => key,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                debug!("end of input");
                break;
            }
            Err(err) => return Err(err.into()),
        };

        match key {
            TRIGGER_KEY => {
                controller.turn_on_led().await?;
                sent += 1;
                debug!(sent, "LED turned on");

                // Raw mode: no output post-processing, so spell out the carriage return.
                out.write_all(b"LED turned on\r\n").await?;
                out.flush().await?;
            }
            INTERRUPT | END_OF_TRANSMISSION => {
                debug!("interrupted");
                break;
            }
            other => debug!(key = other, "ignoring key"),
        }
    }

    Ok(sent)
}

/// Resolves on SIGINT. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Open the serial port and run the keypress loop on the controlling terminal.
///
/// The terminal is put back into its previous mode and the serial connection is closed
/// before this returns, whichever way the loop ended. Stdin is read on a blocking thread
/// that may still be parked in `read` afterwards; the runtime must be shut down without
/// waiting for it.
pub async fn run_interactive(config: &SerialConfig) -> Result<usize> {
    let (controller, writer) = LedController::connect(config)?;

    info!("press 'p' to turn the LED on, Ctrl-C to quit");
    let sent = {
        let _raw = if io::stdin().is_terminal() {
            Some(RawModeGuard::enter(Crossterm::default())?)
        } else {
            None
        };

        run(tokio::io::stdin(), &controller, tokio::io::stdout(), ctrl_c()).await
    };

    drop(controller);
    let port_closed = writer.await.map_err(io::Error::other).and_then(|res| res.map(drop));
    let sent = sent?;
    port_closed?;

    Ok(sent)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::serial::testing::RecordingPort;

    async fn press(keys: &[u8]) -> (usize, RecordingPort, String) {
        let (controller, handle) = LedController::spawn(RecordingPort::default());
        let mut out = Vec::new();

        let sent = run(keys, &controller, &mut out, std::future::pending())
            .await
            .unwrap();
        drop(controller);

        let port = handle.await.unwrap().unwrap();
        (sent, port, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_p_sends_one_command_per_press() {
        let (sent, port, out) = press(b"xpyp").await;
        assert_eq!(sent, 2);
        assert_eq!(port.written, b"PP");
        assert_eq!(out, "LED turned on\r\nLED turned on\r\n");
    }

    #[tokio::test]
    async fn test_other_keys_write_nothing() {
        let (sent, port, out) = press(b"abcP q\r\n").await;
        assert_eq!(sent, 0);
        assert!(port.written.is_empty());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_stops_and_closes_once() {
        let (sent, port, _) = press(b"p\x03pp").await;
        assert_eq!(sent, 1);
        assert_eq!(port.written, b"P");
        assert_eq!(port.shutdowns, 1);
        assert_eq!(port.writes_after_shutdown, 0);
    }

    #[tokio::test]
    async fn test_end_of_transmission_stops() {
        let (sent, port, _) = press(b"\x04p").await;
        assert_eq!(sent, 0);
        assert!(port.written.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (sent, port, _) = press(b"").await;
        assert_eq!(sent, 0);
        assert_eq!(port.shutdowns, 1);
    }

    #[tokio::test]
    async fn test_closed_controller_is_an_error() {
        let (controller, handle) = LedController::spawn(RecordingPort::default());
        handle.abort();
        let _ = handle.await;

        let err = run(&b"p"[..], &controller, Vec::new(), std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Closed), "{err:?}");
    }

    #[tokio::test]
    async fn test_interrupt_while_input_is_silent() {
        let (controller, handle) = LedController::spawn(RecordingPort::default());
        // The writing half stays open and never sends another byte.
        let (keys, mut terminal) = tokio::io::duplex(16);
        terminal.write_all(b"p").await.unwrap();

        let interrupt = tokio::time::sleep(Duration::from_millis(200));
        let sent = tokio::time::timeout(
            Duration::from_secs(5),
            run(keys, &controller, Vec::new(), interrupt),
        )
        .await
        .expect("interrupt did not stop the sender")
        .unwrap();
        drop(controller);

        assert_eq!(sent, 1);
        let port = handle.await.unwrap().unwrap();
        assert_eq!(port.written, b"P");
        assert_eq!(port.shutdowns, 1);
        assert_eq!(port.writes_after_shutdown, 0);
        drop(terminal);
    }
}
