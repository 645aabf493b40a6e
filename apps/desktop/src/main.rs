use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{Dispatcher, Intent, Panel, TcpTransport};
use shared::domain::MotorState;
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::{mpsc, watch},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod input;

use config::{load_settings, DEFAULT_CONFIG_PATH};
use input::{parse_line, Command, InputError, HELP};

const INTENT_QUEUE_DEPTH: usize = 64;
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "motor-panel", about = "Operator panel for the networked motor board")]
struct Args {
    /// Motor board host or IP.
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Speed applied by `start`, in percent.
    #[arg(long)]
    start_speed: Option<u8>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(address) = args.address {
        settings.address = address;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(start_speed) = args.start_speed {
        settings.start_speed = start_speed;
    }
    settings.validate()?;

    let (transport, writer) = TcpTransport::connect(
        &settings.address,
        settings.port,
        settings.connect_timeout(),
    )
    .await
    .context("could not reach the motor board")?;
    println!("Connected to motor board at {}", transport.peer_addr());

    let dispatcher = Dispatcher::new(transport, settings.dispatch_policy());
    let panel = Panel::new(dispatcher, settings.check_interval());
    let state_rx = panel.subscribe();
    let (intent_tx, intent_rx) = mpsc::channel(INTENT_QUEUE_DEPTH);
    let panel_task = tokio::spawn(panel.run(intent_rx));

    println!("{HELP}");
    operator_loop(intent_tx, state_rx).await?;

    let summary = panel_task.await.context("panel task failed")?;
    info!(
        intents = summary.intents,
        rejected = summary.rejected,
        dispatches = summary.dispatches,
        dropped = summary.dropped,
        "panel closed"
    );

    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer)
        .await
        .is_err()
    {
        warn!("transport writer did not drain in time");
    }
    Ok(())
}

/// Reads operator lines until `quit`, end of input or Ctrl-C. Dropping the
/// intent sender on return shuts the panel loop down.
async fn operator_loop(
    intent_tx: mpsc::Sender<Intent>,
    state_rx: watch::Receiver<MotorState>,
) -> Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read operator input")?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                return Ok(());
            }
        };
        let Some(line) = line else {
            return Ok(());
        };

        match parse_line(&line) {
            Ok(Command::Intent(intent)) => {
                if intent_tx.send(intent).await.is_err() {
                    warn!("panel loop is gone; exiting");
                    return Ok(());
                }
            }
            Ok(Command::Status) => {
                let state = *state_rx.borrow();
                println!("{}", serde_json::to_string(&state)?);
            }
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Quit) => return Ok(()),
            Err(InputError::Empty) => {}
            Err(err) => eprintln!("{err}"),
        }
    }
}
