use anyhow::Context;
use std::io::BufRead;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use spectrum_client::{
    config::Config,
    oracle::HttpOracle,
    runtime::{Command, GameLoop, Notice},
    terminal::{DEFAULT_COLUMNS, DEFAULT_ROWS, USAGE, describe_notice, parse_command},
};
use spectrum_core::SystemClock;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays the game display
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Failed to read configuration")?;
    info!("Using oracle at {}", config.oracle_url);

    let oracle = HttpOracle::new(config.oracle_url.clone(), config.request_timeout())
        .context("Failed to build oracle client")?;

    let (commands_tx, commands_rx) = mpsc::unbounded_channel::<Command>();
    let (notices_tx, mut notices_rx) = mpsc::unbounded_channel::<Notice>();

    // Blocking stdin reads get their own thread so they never hold up shutdown
    // Weak so a blocked reader never keeps the printer alive
    let input_notices = notices_tx.downgrade();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_command(&line) {
                Ok(command) => {
                    if commands_tx.send(command).is_err() {
                        break;
                    }
                }
                Err(usage) => match input_notices.upgrade() {
                    Some(notices) => {
                        let _ = notices.send(Notice::Info(usage));
                    }
                    None => break,
                },
            }
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(notice) = notices_rx.recv().await {
            if let Some(text) = describe_notice(&notice, DEFAULT_COLUMNS, DEFAULT_ROWS) {
                println!("{}", text);
            }
        }
    });

    println!("{}", USAGE);
    let game_loop = GameLoop::new(&config, Arc::new(oracle), Arc::new(SystemClock), notices_tx);
    game_loop.run(commands_rx, shutdown_signal()).await?;

    // The loop's senders are gone, so the printer exits once the queue is empty
    printer.await.context("Notice printer failed")?;

    info!("Goodbye.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let kinds = (
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
            signal::unix::signal(signal::unix::SignalKind::terminate()),
        );
        match kinds {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {
                        info!("Received SIGINT, shutting down gracefully...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully...");
                    }
                }
            }
            _ => {
                error!("Failed to install signal handlers");
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
