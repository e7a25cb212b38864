use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use led_trigger::{sender, serial, web, Backend, Config, LedController, ProcessLauncher, Trigger};
use serialport::SerialPortType;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Turn on a serial-attached LED from the browser or the keyboard.
///
/// Settings default to the `LED_*` environment variables; flags take precedence.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Serial device of the LED controller
    #[arg(long, global = true)]
    port: Option<String>,

    /// Baud rate of the serial device
    #[arg(long, global = true)]
    baud_rate: Option<u32>,

    #[command(subcommand)]
    operation: Operation,
}

#[derive(Debug, Subcommand)]
enum Operation {
    /// Serve the web trigger
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Give up on a single trigger after this many seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_secs: Option<u64>,
    },
    /// Send the LED command for every 'p' pressed on this terminal
    Send,
    /// List the serial ports of this machine
    Ports,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(port) = &self.port {
            config.serial.path = port.clone();
        }
        if let Some(baud_rate) = self.baud_rate {
            config.serial.baud_rate = baud_rate;
        }
        if let Operation::Serve { bind, timeout_secs } = &self.operation {
            if let Some(bind) = bind {
                config.bind_addr = *bind;
            }
            if let Some(secs) = timeout_secs {
                config.timeout = Duration::from_secs(*secs);
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    cli.apply(&mut config);

    run_detached(run(cli.operation, config))?
}

/// Drive `future` to completion on a fresh runtime, then shut the runtime down without
/// waiting for blocking threads. `send` leaves one parked in a stdin read that only
/// returns on the next key.
fn run_detached<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

async fn run(operation: Operation, config: Config) -> anyhow::Result<()> {
    match operation {
        Operation::Serve { .. } => serve(config).await,
        Operation::Send => {
            let sent = sender::run_interactive(&config.serial).await?;
            info!(sent, "sender stopped");
            Ok(())
        }
        Operation::Ports => list_ports(),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let (backend, writer) = match &config.sender_command {
        Some(argv) => {
            let launcher =
                ProcessLauncher::from_argv(argv).context("LED_SENDER_COMMAND is empty")?;
            info!(program = launcher.program(), "launching a sender per request");
            (Backend::Process(launcher), None)
        }
        None => {
            let (controller, writer) = LedController::connect(&config.serial)?;
            (Backend::Serial(controller), Some(writer))
        }
    };

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    let trigger = Arc::new(Trigger::new(backend, config.timeout));

    web::serve(listener, trigger, shutdown_signal()).await?;

    if let Some(writer) = writer {
        writer.await??;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "cannot listen for Ctrl-C, serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn list_ports() -> anyhow::Result<()> {
    let ports = serial::available_ports()?;
    if ports.is_empty() {
        println!("no serial ports found");
    }

    for port in ports {
        let kind = match port.port_type {
            SerialPortType::UsbPort(usb) => format!("usb {:04x}:{:04x}", usb.vid, usb.pid),
            SerialPortType::PciPort => "pci".to_string(),
            SerialPortType::BluetoothPort => "bluetooth".to_string(),
            SerialPortType::Unknown => "unknown".to_string(),
        };
        println!("{}\t{}", port.port_name, kind);
    }

    Ok(())
}
