mod cli;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

use cli::{Cli, Command};
use letterhub::api;
use letterhub::config::LetterHubConfig;
use letterhub::error::WorkflowError;
use letterhub::notify::AnyNotifier;
use letterhub::store::FileStore;
use letterhub::telemetry;
use letterhub::workflow::{
    Actor, Applied, ProofUpload, Role, StatusWorkflowEngine, TransitionCatalog,
};
use ui::Printer;

type Engine = StatusWorkflowEngine<FileStore, AnyNotifier>;

/// Exit code for business-rule rejections, as opposed to runtime failures.
const REJECTED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = LetterHubConfig::load()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    telemetry::init_tracing(config.log_format, cli.verbose);

    let store = FileStore::open(&config.data_dir)
        .await
        .with_context(|| format!("failed to open order store in {}", config.data_dir.display()))?;
    let notifier = AnyNotifier::from_webhook_url(config.webhook_url.as_deref(), config.notify_timeout_ms);
    let engine = StatusWorkflowEngine::new(store, notifier, config.engine_settings());
    let ui = Printer::new();

    match cli.command {
        Command::Create {
            practice,
            customer,
            title,
        } => {
            let order = engine.create_order(practice, customer, title).await;
            match order {
                Ok(order) => {
                    ui.created(&order);
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => Ok(rejected(&ui, &err)),
            }
        }
        Command::Transition {
            order,
            status,
            actor,
            role,
            comment,
        } => {
            let actor = Actor {
                id: actor,
                role: role.into(),
            };
            let result = engine
                .apply_transition(&order, status, &actor, comment.as_deref())
                .await;
            Ok(finish(&ui, result).await)
        }
        Command::UploadProof {
            order,
            actor,
            role,
            artifact,
            comment,
        } => {
            let actor = Actor {
                id: actor,
                role: role.into(),
            };
            let upload = ProofUpload {
                artifact,
                comments: comment,
            };
            let result = engine.upload_proof(&order, &actor, upload).await;
            Ok(finish(&ui, result).await)
        }
        Command::Resolve {
            order,
            action,
            actor,
            role,
            notes,
        } => {
            let actor = Actor {
                id: actor,
                role: role.into(),
            };
            let result = engine
                .resolve_escalation(&order, &actor, action, notes.as_deref())
                .await;
            Ok(finish(&ui, result).await)
        }
        Command::Status { order, role, json } => show_status(&engine, &ui, &order, role.into(), json).await,
        Command::History { order, json } => match engine.history(&order).await {
            Ok(history) if json => {
                println!("{}", serde_json::to_string_pretty(&history)?);
                Ok(ExitCode::SUCCESS)
            }
            Ok(history) => {
                ui.history(&history);
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(rejected(&ui, &err)),
        },
        Command::Catalog { from, role } => {
            let role: Option<Role> = role.map(Into::into);
            let transitions: Vec<_> = TransitionCatalog::global()
                .entries()
                .iter()
                .filter(|t| from.is_none_or(|from| t.from == from))
                .filter(|t| role.is_none_or(|role| t.allows(role)))
                .collect();
            ui.catalog(&transitions);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn show_status(engine: &Engine, ui: &Printer, order: &str, role: Role, json: bool) -> Result<ExitCode> {
    match api::status_view(engine, order, role).await {
        Ok(view) if json => {
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(ExitCode::SUCCESS)
        }
        Ok(view) => {
            ui.status_view(&view);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(rejected(ui, &err)),
    }
}

/// Prints the outcome and waits for the notification so the process does not
/// exit before it is delivered.
async fn finish(ui: &Printer, result: Result<Applied, WorkflowError>) -> ExitCode {
    match result {
        Ok(mut applied) => {
            ui.applied(&applied);
            if let Some(handle) = applied.notification.take() {
                if let Err(err) = handle.await {
                    warn!(error = %err, "notification task aborted");
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => rejected(ui, &err),
    }
}

fn rejected(ui: &Printer, err: &WorkflowError) -> ExitCode {
    ui.rejected(err);
    if matches!(err, WorkflowError::Persistence(_)) {
        ExitCode::FAILURE
    } else {
        ExitCode::from(REJECTED)
    }
}
