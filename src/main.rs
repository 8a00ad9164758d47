mod cli;
mod config;
mod error;
mod output;

use std::io;
use std::sync::Arc;

use clap::Parser;
use cli::Command;
use protego::{
    ApiClient, HttpProvider, MonitorRequest, OperationKind, PendingOperation, WalletController,
    WalletProvider,
};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Settings;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    if let Err(e) = run(cli.command, settings, cancel).await {
        tracing::error!(error = %e, recoverable = e.is_recoverable(), "command failed");
        std::process::exit(1);
    }
}

async fn run(
    command: Command,
    settings: Settings,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();

    match command {
        Command::Status(args) => {
            let ctl = wallet(&settings);
            if let Err(e) = ctl.connect().await {
                tracing::warn!(error = %e, "connection incomplete");
            }
            let session = ctl.session().await;
            let token = ctl.descriptor().await;
            let text = if args.json {
                output::to_json(&output::session_json(&session, token.as_ref()))?
            } else {
                output::session_tsv(&session, token.as_ref())
            };
            output::emit(&mut stdout, &text)?;
            ctl.disconnect().await;
        }

        Command::Approve(args) => {
            let ctl = wallet(&settings);
            ctl.connect().await?;
            let result = ctl.approve(args.amount).await;
            report(&ctl, OperationKind::Approve, result, &mut stdout).await?;
        }

        Command::Deposit(args) => {
            let ctl = wallet(&settings);
            ctl.connect().await?;
            let result = ctl.deposit(args.amount).await;
            report(&ctl, OperationKind::Deposit, result, &mut stdout).await?;
        }

        Command::EmergencyWithdraw => {
            let (tx, mut rx) = mpsc::channel(8);
            tokio::spawn(async move {
                while let Some(action) = rx.recv().await {
                    info!(?action, "dashboard action");
                }
            });
            let ctl = wallet(&settings).with_action_hook(tx);
            ctl.connect().await?;
            let result = ctl.emergency_withdraw().await;
            report(&ctl, OperationKind::Withdraw, result, &mut stdout).await?;
        }

        Command::Watch => {
            let ctl = wallet(&settings);
            let session = ctl.connect().await?;
            let token = ctl.descriptor().await;
            output::emit(&mut stdout, &output::session_tsv(&session, token.as_ref()))?;
            ctl.run_events(cancel).await?;
            let session = ctl.session().await;
            let token = ctl.descriptor().await;
            output::emit(&mut stdout, &output::session_tsv(&session, token.as_ref()))?;
            ctl.disconnect().await;
        }

        Command::Threats(args) => {
            let threats = ApiClient::from_config(&settings.analysis).threats().await?;
            info!(count = threats.len(), "threats fetched");
            let text = if args.json {
                output::to_json(&json!(threats))?
            } else {
                output::threats_tsv(&threats)
            };
            output::emit(&mut stdout, &text)?;
        }

        Command::SocialAlerts(args) => {
            let alerts = ApiClient::from_config(&settings.analysis)
                .social_alerts()
                .await?;
            info!(count = alerts.len(), "social alerts fetched");
            let text = if args.json {
                output::to_json(&json!(alerts))?
            } else {
                output::alerts_tsv(&alerts)
            };
            output::emit(&mut stdout, &text)?;
        }

        Command::AnalyzeContract { address } => {
            let analysis = ApiClient::from_config(&settings.analysis)
                .analyze_contract(&address)
                .await?;
            output::emit(&mut stdout, &output::to_json(&analysis)?)?;
        }

        Command::SocialMonitor(args) => {
            let request = MonitorRequest {
                platforms: args.platforms,
                keywords: args.keywords,
                group_ids: args.group_ids,
            };
            let monitoring = ApiClient::from_config(&settings.analysis)
                .social_monitor(&request)
                .await?;
            output::emit(&mut stdout, &output::to_json(&monitoring)?)?;
        }

        Command::Sessions { user_id } => {
            let sessions = ApiClient::from_config(&settings.chat)
                .chat_sessions(&user_id)
                .await?;
            output::emit(&mut stdout, &output::chat_sessions_tsv(&sessions))?;
        }

        Command::NewSession { user_id, message } => {
            let id = ApiClient::from_config(&settings.chat)
                .create_chat_session(&user_id, &message)
                .await?;
            info!(session_id = %id, "chat session created");
            output::emit(&mut stdout, &id)?;
        }
    }

    Ok(())
}

/// Controller backed by the configured JSON-RPC endpoint.
fn wallet(settings: &Settings) -> WalletController {
    let provider: Arc<dyn WalletProvider> = Arc::new(HttpProvider::new(&settings.rpc_url));
    WalletController::new(Some(provider), settings.wallet.clone())
}

/// Print the operation outcome and the session status line.
async fn report<W: io::Write>(
    ctl: &WalletController,
    kind: OperationKind,
    result: protego::Result<PendingOperation>,
    writer: &mut W,
) -> Result<(), CliError> {
    let message = ctl.session().await.last_message;
    match result {
        Ok(op) => {
            output::emit(writer, &output::operation_tsv(&op))?;
            output::emit(writer, &message)?;
            Ok(())
        }
        Err(e) => {
            if let Some(op) = ctl.operation(kind).await {
                output::emit(writer, &output::operation_tsv(&op))?;
            }
            output::emit(writer, &message)?;
            Err(e.into())
        }
    }
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sig = match signal(SignalKind::terminate()) {
                Ok(sig) => sig,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to register SIGTERM handler");
                    return;
                }
            };
            sig.recv().await;
            info!("received SIGTERM, shutting down");
            cancel_clone.cancel();
        });
    }

    cancel
}
