//! Exclusive ownership of the serial line to the LED controller.
mod codec;

use std::io;

pub use codec::{CommandCodec, LedCommand};

use futures_util::SinkExt;
use serialport::SerialPortInfo;
use tokio::{
    io::AsyncWrite,
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tokio_util::codec::FramedWrite;
use tracing::{debug, info, warn};

use crate::{config::SerialConfig, Error, Result};

/// Pending commands allowed to queue up behind the one being written.
const QUEUE_DEPTH: usize = 8;

/// Open the serial device 8N1 without flow control.
///
/// Must be called from within a Tokio runtime.
pub fn open(config: &SerialConfig) -> Result<SerialStream> {
    let port = tokio_serial::new(config.path.as_str(), config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open_native_async()
        .map_err(|source| Error::Open {
            path: config.path.clone(),
            source,
        })?;

    info!(path = %config.path, baud_rate = config.baud_rate, "serial port opened");
    Ok(port)
}

/// Serial ports the operating system knows about.
pub fn available_ports() -> serialport::Result<Vec<SerialPortInfo>> {
    serialport::available_ports()
}

struct Request {
    command: LedCommand,
    reply: oneshot::Sender<io::Result<()>>,
}

/// Handle to the task that owns the serial connection.
///
/// Clones share the same connection; writes from all of them are serialized. The
/// connection is closed once every handle has been dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct LedController {
    tx: mpsc::Sender<Request>,
}

impl LedController {
    /// Open the configured port and start the writer task.
    pub fn connect(config: &SerialConfig) -> Result<(Self, JoinHandle<io::Result<SerialStream>>)> {
        let port = open(config)?;
        Ok(Self::spawn(port))
    }

    /// Start the writer task on an already opened transport.
    ///
    /// The returned handle resolves to the transport after it has been shut down.
    pub fn spawn<W>(port: W) -> (Self, JoinHandle<io::Result<W>>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let sink = FramedWrite::new(port, CommandCodec::default());
        let handle = tokio::spawn(write_commands(sink, rx));
        (Self { tx }, handle)
    }

    /// Write a command and wait until it has been flushed to the device.
    pub async fn send(&self, command: LedCommand) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request { command, reply })
            .await
            .map_err(|_| Error::Closed)?;

        response.await.map_err(|_| Error::Closed)?.map_err(Error::Io)
    }

    pub async fn turn_on_led(&self) -> Result<()> {
        self.send(LedCommand::On).await
    }
}

async fn write_commands<W>(
    mut sink: FramedWrite<W, CommandCodec>,
    mut rx: mpsc::Receiver<Request>,
) -> io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(Request { command, reply }) = rx.recv().await {
        // Caller gave up (timed out) while queued.
        if reply.is_closed() {
            debug!(?command, "dropping abandoned command");
            continue;
        }

        let res = sink.send(command).await;
        match &res {
            Ok(()) => debug!(?command, "command written"),
            Err(err) => warn!(?command, %err, "serial write failed"),
        }
        let _ = reply.send(res);
    }

    sink.close().await?;
    info!("serial connection closed");
    Ok(sink.into_inner())
}
