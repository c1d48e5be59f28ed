#![forbid(unsafe_code)]

//! `vault-sentinel` — idle-session sentinel binary.
//!
//! Bootstraps configuration, unlocks a vault session behind a completed
//! sign-in snapshot, and runs a console loop where every input line counts
//! as activity until the idle countdown locks the vault.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use vault_sentinel::config::GlobalConfig;
use vault_sentinel::session::controller::SessionController;
use vault_sentinel::signin::AuthSnapshot;
use vault_sentinel::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "vault-sentinel", about = "Idle-session sentinel for vault sessions", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the configured idle timeout, in seconds.
    #[arg(long)]
    idle_timeout: Option<u64>,

    /// Override the configured countdown display format.
    #[arg(long)]
    countdown_format: Option<String>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("vault-sentinel bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.apply_overrides(args.idle_timeout, args.countdown_format)?;
    let config = Arc::new(config);
    info!(
        account = %config.account,
        idle_timeout_seconds = config.session.idle_timeout_seconds,
        "configuration loaded"
    );

    // ── Unlock a session ────────────────────────────────
    // The console host stands in for the browser shell: sign-in is assumed
    // to have completed against the backend before the vault opens.
    let controller = SessionController::new(Arc::clone(&config));
    let session = controller
        .unlock(&AuthSnapshot::complete(), &config.account)
        .await?;
    info!(
        session_id = %session.id,
        "session ready; input lines count as activity ('lock' or 'quit' to close)"
    );

    // ── Console loop: activity, lock, expiry, shutdown ──
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            () = controller.wait_expired() => {
                warn!("idle countdown expired; vault locked");
                break;
            }
            maybe_line = lines.next_line() => {
                match maybe_line {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.eq_ignore_ascii_case("quit") {
                            break;
                        }
                        if trimmed.eq_ignore_ascii_case("lock") {
                            match controller.lock().await {
                                Ok(locked) => info!(session_id = %locked.id, "locked by request"),
                                Err(err) => warn!(%err, "lock failed"),
                            }
                            break;
                        }
                        controller.notify_activity().await;
                        let remaining = controller.countdown_display().await;
                        info!(display = %remaining, "activity recorded; countdown restarting");
                    }
                    Ok(None) => {
                        info!("stdin closed");
                        break;
                    }
                    Err(err) => {
                        warn!(%err, "stdin read failed");
                        break;
                    }
                }
            }
        }
    }

    // ── Sign out and summarize ──────────────────────────
    if let Some(closed) = controller.sign_out().await {
        info!(
            session_id = %closed.id,
            status = ?closed.status,
            created_at = %closed.created_at,
            "session closed"
        );
    }
    info!("vault-sentinel shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
