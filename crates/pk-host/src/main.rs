//! Passkeep native messaging host.
//!
//! Speaks Chrome's native messaging protocol on stdin/stdout: each message
//! is a little-endian u32 length prefix followed by a JSON body, one
//! response per request, in order. All logging goes to stderr. SIGINT and
//! SIGTERM clear the session (zeroizing the MEK) before a clean exit.

mod confusables;
mod domaincheck;
mod framing;
mod handlers;
mod phishing;
mod protocol;
mod session;

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use crate::handlers::Host;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let host = Arc::new(Host::new());
    spawn_signal_handler(host.clone());

    let mut reader = stdin();
    let mut writer = stdout();

    loop {
        let payload = match framing::read_frame(&mut reader).await {
            Ok(Some(payload)) => payload,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "read error, closing connection");
                break;
            }
        };

        // Argon2, SQLite, and AEAD work is blocking; keep it off the reactor.
        let handler = host.clone();
        let response = tokio::task::spawn_blocking(move || handler.dispatch(&payload)).await?;

        let encoded = serde_json::to_vec(&response)?;
        if let Err(e) = framing::write_frame(&mut writer, &encoded).await {
            tracing::error!(error = %e, "write error, closing connection");
            break;
        }
    }

    host.clear_session();
    Ok(())
}

#[cfg(unix)]
fn spawn_signal_handler(host: Arc<Host>) {
    use tokio::signal::unix::{signal, SignalKind};
    tokio::spawn(async move {
        let mut interrupt = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "cannot install SIGINT handler");
                return;
            }
        };
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "cannot install SIGTERM handler");
                return;
            }
        };
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
        host.clear_session();
        std::process::exit(0);
    });
}

#[cfg(not(unix))]
fn spawn_signal_handler(host: Arc<Host>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            host.clear_session();
            std::process::exit(0);
        }
    });
}
