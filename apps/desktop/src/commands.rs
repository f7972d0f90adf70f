//! User commands, shared by the one-shot CLI and the interactive shell.

use clap::Subcommand;
use client_core::Action;
use shared::{
    domain::{ServerDraft, ServerId, Status, StatusFilter},
    protocol::Envelope,
};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reload the server list.
    List,
    /// Ping a server by IP address and refresh its status.
    Ping { ip_address: String },
    /// Register a new server.
    Save {
        #[arg(long)]
        ip: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        memory: String,
        #[arg(long = "type", default_value = "")]
        server_type: String,
        #[arg(long, default_value = "SERVER_DOWN")]
        status: Status,
    },
    /// Show only servers with the given status (up, down, all).
    Filter { status: StatusFilter },
    /// Delete a server from the list by id.
    Delete { id: i64 },
    /// Export the table on screen to a spreadsheet file.
    Report,
    /// Interactive session (default).
    Shell,
}

#[derive(Debug, Clone)]
pub enum Planned {
    Action(Action),
    Report,
    Shell,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::List => "list",
            Command::Ping { .. } => "ping",
            Command::Save { .. } => "save",
            Command::Filter { .. } => "filter",
            Command::Delete { .. } => "delete",
            Command::Report => "report",
            Command::Shell => "shell",
        }
    }

    /// Deletes act on a row of the current list, so the id must be on screen.
    pub fn plan(self, cached: Option<&Envelope>) -> Result<Planned, String> {
        let action = match self {
            Command::List => Action::Refresh,
            Command::Ping { ip_address } => Action::Ping { ip_address },
            Command::Save {
                ip,
                name,
                memory,
                server_type,
                status,
            } => Action::Save {
                draft: ServerDraft {
                    ip_address: ip,
                    name,
                    memory,
                    server_type,
                    status,
                },
            },
            Command::Filter { status } => Action::Filter { status },
            Command::Delete { id } => {
                let server = cached
                    .and_then(|envelope| {
                        envelope
                            .servers()
                            .iter()
                            .find(|server| server.id == ServerId(id))
                    })
                    .cloned()
                    .ok_or_else(|| format!("no server with id {id} in the current list"))?;
                Action::Delete { server }
            }
            Command::Report => return Ok(Planned::Report),
            Command::Shell => return Ok(Planned::Shell),
        };
        Ok(Planned::Action(action))
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::Server;

    use super::*;

    fn cached() -> Envelope {
        Envelope::with_servers(
            "Servers retrieved",
            vec![Server {
                id: ServerId(5),
                ip_address: "192.168.1.5".to_string(),
                name: "Red Hat".to_string(),
                memory: "64 GB".to_string(),
                server_type: "Mail Server".to_string(),
                image_url: None,
                status: Status::ServerUp,
            }],
        )
    }

    #[test]
    fn delete_resolves_server_from_cache() {
        let planned = Command::Delete { id: 5 }
            .plan(Some(&cached()))
            .expect("planned");
        match planned {
            Planned::Action(Action::Delete { server }) => assert_eq!(server.name, "Red Hat"),
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn delete_of_unlisted_id_is_rejected() {
        let err = Command::Delete { id: 6 }
            .plan(Some(&cached()))
            .expect_err("must fail");
        assert_eq!(err, "no server with id 6 in the current list");
        assert!(Command::Delete { id: 5 }.plan(None).is_err());
    }

    #[test]
    fn save_builds_draft() {
        let planned = Command::Save {
            ip: "10.1.1.1".to_string(),
            name: "edge".to_string(),
            memory: String::new(),
            server_type: String::new(),
            status: Status::ServerDown,
        }
        .plan(None)
        .expect("planned");
        match planned {
            Planned::Action(Action::Save { draft }) => {
                assert_eq!(draft.ip_address, "10.1.1.1");
                assert_eq!(draft.status, Status::ServerDown);
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }
}
