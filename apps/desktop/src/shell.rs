//! Interactive session: every command runs as its own pipeline while a
//! renderer task prints whatever the coordinator publishes.

use anyhow::Context;
use clap::Parser;
use client_core::{ViewStateCoordinator, ViewUpdate};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{broadcast, watch},
};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};
use tracing::{debug, warn};

use crate::{
    commands::{Command, Planned},
    render::{render_report, render_update},
};

#[derive(Parser, Debug)]
#[command(name = "server-manager", no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

/// Splits on whitespace; double quotes group words.
pub fn split_line(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

pub fn parse_line(line: &str) -> Result<Command, String> {
    let tokens = split_line(line)?;
    ShellLine::try_parse_from(tokens)
        .map(|parsed| parsed.command)
        .map_err(|err| err.to_string())
}

pub async fn run(coordinator: ViewStateCoordinator, report_target: String) -> anyhow::Result<()> {
    let renderer = tokio::spawn(render_loop(RenderFeed::attach(&coordinator)));
    let _ = coordinator.dispatch(client_core::Action::Refresh);
    println!("Type a command (list, ping, save, filter, delete, report, help) or 'quit'.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read shell input")?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }
        match parse_line(line) {
            Ok(command) => dispatch_command(&coordinator, command, &report_target),
            Err(message) => eprintln!("{message}"),
        }
    }

    renderer.abort();
    Ok(())
}

fn dispatch_command(coordinator: &ViewStateCoordinator, command: Command, report_target: &str) {
    let name = command.name();
    match command.plan(coordinator.snapshot().as_ref()) {
        Ok(Planned::Action(action)) => {
            debug!(command = name, "queued shell command");
            // Not awaited; commands may overlap.
            let _ = coordinator.dispatch(action);
        }
        Ok(Planned::Report) => {
            println!("{}", render_report(coordinator.print_report(), report_target));
        }
        Ok(Planned::Shell) => eprintln!("already in the interactive shell"),
        Err(message) => eprintln!("{message}"),
    }
}

/// Renderer inputs, taken before the first dispatch so no update is missed.
struct RenderFeed {
    updates: broadcast::Receiver<ViewUpdate>,
    loading: watch::Receiver<bool>,
    marker: watch::Receiver<Option<String>>,
}

impl RenderFeed {
    fn attach(coordinator: &ViewStateCoordinator) -> Self {
        Self {
            updates: coordinator.subscribe(),
            loading: coordinator.loading(),
            marker: coordinator.filter_marker(),
        }
    }
}

async fn render_loop(feed: RenderFeed) {
    let RenderFeed {
        updates,
        mut loading,
        mut marker,
    } = feed;
    let mut updates = BroadcastStream::new(updates);

    loop {
        tokio::select! {
            item = updates.next() => match item {
                Some(Ok(update)) => println!("{}", render_update(&update)),
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    warn!(skipped, "renderer fell behind the view stream");
                }
                None => break,
            },
            changed = loading.changed() => {
                if changed.is_err() {
                    break;
                }
                if *loading.borrow_and_update() {
                    println!("Saving server...");
                }
            }
            changed = marker.changed() => {
                if changed.is_err() {
                    break;
                }
                let pinging = marker.borrow_and_update().clone();
                if let Some(ip_address) = pinging {
                    println!("Pinging {ip_address}...");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use client_core::{Action, HttpDirectoryService, Phase, ViewState};
    use shared::domain::{Status, StatusFilter};

    use super::*;

    #[tokio::test]
    async fn feed_attached_before_dispatch_sees_initial_loading() {
        let directory = HttpDirectoryService::new("http://127.0.0.1:1/api").expect("directory");
        let coordinator = ViewStateCoordinator::builder(Arc::new(directory)).build();

        let mut feed = RenderFeed::attach(&coordinator);
        let finished = coordinator
            .dispatch(Action::Refresh)
            .await
            .expect("pipeline");
        assert!(matches!(finished, ViewState::Error(_)));

        let first = feed.updates.recv().await.expect("loading update");
        assert_eq!(first.seq, 1);
        assert_eq!(first.state, ViewState::Loading);
        let second = feed.updates.recv().await.expect("final update");
        assert_eq!(second.phase, Phase::Final);
        assert!(matches!(second.state, ViewState::Error(_)));
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            split_line(r#"save --ip 10.0.0.9 --name "Ubuntu Linux" --type "Dell Tower""#)
                .expect("split"),
            vec![
                "save",
                "--ip",
                "10.0.0.9",
                "--name",
                "Ubuntu Linux",
                "--type",
                "Dell Tower"
            ]
        );
        assert!(split_line("ping \"10.0.0.1").is_err());
    }

    #[test]
    fn empty_quotes_make_an_empty_argument() {
        assert_eq!(
            split_line(r#"save --memory """#).expect("split"),
            vec!["save", "--memory", ""]
        );
    }

    #[test]
    fn parses_shell_commands() {
        assert_eq!(
            parse_line("ping 192.168.1.160").expect("ping"),
            Command::Ping {
                ip_address: "192.168.1.160".to_string()
            }
        );
        assert_eq!(
            parse_line("filter up").expect("filter"),
            Command::Filter {
                status: StatusFilter::Only(Status::ServerUp)
            }
        );
        assert_eq!(parse_line("delete 4").expect("delete"), Command::Delete { id: 4 });
    }

    #[test]
    fn save_defaults_status_to_down() {
        match parse_line("save --ip 10.0.0.9 --name edge").expect("save") {
            Command::Save { status, memory, .. } => {
                assert_eq!(status, Status::ServerDown);
                assert_eq!(memory, "");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_commands_and_bad_status() {
        assert!(parse_line("reboot everything").is_err());
        assert!(parse_line("filter sideways").is_err());
    }
}
