use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{TcpTransport, Transport};
use shared::{
    domain::{Direction, Speed},
    protocol::{CommandDecoder, MotorCommand},
};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    net::TcpListener,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const READ_CHUNK: usize = 256;

#[derive(Parser, Debug)]
#[command(name = "motor-tools", about = "Bench tooling for the motor board protocol")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Listen like the motor board and log every packet received.
    Simulate {
        #[arg(long, default_value = "127.0.0.1:5050")]
        bind: SocketAddr,
    },
    /// Send a single packet and exit.
    Send {
        #[arg(long)]
        address: String,
        #[arg(long, default_value_t = 5050)]
        port: u16,
        #[arg(long)]
        speed: i64,
        #[arg(long, value_enum, default_value_t = DirectionArg::Fwd)]
        direction: DirectionArg,
        #[arg(long, default_value_t = 5_000)]
        timeout_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionArg {
    Fwd,
    Rev,
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Fwd => Direction::Forward,
            DirectionArg::Rev => Direction::Reverse,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate { bind } => simulate(bind).await?,
        Command::Send {
            address,
            port,
            speed,
            direction,
            timeout_ms,
        } => {
            let command = MotorCommand {
                speed: Speed::new(speed)?,
                direction: direction.into(),
            };
            let (transport, writer) =
                TcpTransport::connect(&address, port, Duration::from_millis(timeout_ms))
                    .await
                    .context("could not reach the motor board")?;
            transport.send(command.encode().as_bytes())?;
            drop(transport);
            writer.await.context("transport writer failed")?;
            println!("sent {command}");
        }
    }

    Ok(())
}

async fn simulate(bind: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %listener.local_addr()?, "simulated motor board listening");

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted.context("accept failed")?,
            _ = tokio::signal::ctrl_c() => return Ok(()),
        };
        info!(%peer, "panel connected");
        tokio::spawn(async move {
            match serve_connection(stream, peer).await {
                Ok(packets) => info!(%peer, packets, "panel disconnected"),
                Err(err) => warn!(%peer, error = %err, "connection error"),
            }
        });
    }
}

/// Decodes packets until the peer closes, returning how many were valid.
async fn serve_connection<R: AsyncRead + Unpin>(
    mut reader: R,
    peer: SocketAddr,
) -> Result<usize> {
    let mut decoder = CommandDecoder::new();
    let mut buf = [0u8; READ_CHUNK];
    let mut packets = 0;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        for decoded in decoder.feed(&buf[..n]) {
            match decoded {
                Ok(command) => {
                    packets += 1;
                    info!(
                        %peer,
                        packet = %command,
                        speed = command.speed.percent(),
                        direction = ?command.direction,
                        "received"
                    );
                }
                Err(err) => warn!(%peer, error = %err, "bad packet"),
            }
        }
    }

    if !decoder.pending().is_empty() {
        warn!(
            %peer,
            trailing = %String::from_utf8_lossy(decoder.pending()),
            "connection closed mid-packet"
        );
    }
    Ok(packets)
}
