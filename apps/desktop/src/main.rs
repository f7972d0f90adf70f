use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    report::REPORT_FILE_NAME, Action, FileExportSink, HttpDirectoryService, ViewState,
    ViewStateCoordinator,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod console;
mod render;
mod shell;

use commands::{Command, Planned};
use config::load_settings;
use console::ConsoleNotifier;
use render::{render_report, render_state};

#[derive(Parser, Debug)]
#[command(name = "server-manager", about = "Manage servers registered in a directory service")]
struct Args {
    /// Config file (defaults to ./server-manager.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    report_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    if let Some(report_dir) = args.report_dir {
        settings.report_dir = report_dir;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    info!(api_url = %settings.api_url, policy = ?settings.overlap_policy, "starting server manager");

    let directory = HttpDirectoryService::new(&settings.api_url)
        .with_context(|| format!("invalid directory url '{}'", settings.api_url))?;
    let coordinator = ViewStateCoordinator::builder(Arc::new(directory))
        .notifier(Arc::new(ConsoleNotifier))
        .export_sink(Arc::new(FileExportSink::new(&settings.report_dir)))
        .overlap_policy(settings.overlap_policy)
        .build();
    let report_target = settings
        .report_dir
        .join(REPORT_FILE_NAME)
        .display()
        .to_string();

    match args.command.unwrap_or(Command::Shell) {
        Command::Shell => shell::run(coordinator, report_target).await,
        command => run_once(&coordinator, command, &report_target).await,
    }
}

async fn run_once(
    coordinator: &ViewStateCoordinator,
    command: Command,
    report_target: &str,
) -> Result<()> {
    let initial = coordinator.activate().await;
    if let ViewState::Error(message) = &initial {
        bail!("failed to load server list: {message}");
    }

    let planned = command
        .plan(coordinator.snapshot().as_ref())
        .map_err(anyhow::Error::msg)?;
    match planned {
        Planned::Action(Action::Refresh) => println!("{}", render_state(&initial)),
        Planned::Action(action) => {
            let state = coordinator.run(action).await;
            println!("{}", render_state(&state));
            if let ViewState::Error(message) = state {
                bail!(message);
            }
        }
        Planned::Report => {
            println!("{}", render_report(coordinator.print_report(), report_target));
        }
        Planned::Shell => bail!("the shell cannot be started from a one-shot command"),
    }
    Ok(())
}
