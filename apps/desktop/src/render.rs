//! Plain-text rendering of view states for the terminal.

use client_core::{Phase, ReportOutcome, ViewState, ViewUpdate};
use shared::domain::Server;

const HEADERS: [&str; 6] = ["ID", "IP Address", "Name", "Memory", "Type", "Status"];

pub fn render_update(update: &ViewUpdate) -> String {
    let marker = match update.phase {
        Phase::Provisional => "~",
        Phase::Final => "=",
    };
    format!("{marker} #{} {}", update.seq, render_state(&update.state))
}

pub fn render_state(state: &ViewState) -> String {
    match state {
        ViewState::Loading => "Loading servers...".to_string(),
        ViewState::Error(message) => format!("Error: {message}"),
        ViewState::Loaded(envelope) => {
            let mut out = String::new();
            if !envelope.message.is_empty() {
                out.push_str(&envelope.message);
                out.push('\n');
            }
            out.push_str(&render_table(envelope.servers()));
            out
        }
    }
}

pub fn render_table(servers: &[Server]) -> String {
    if servers.is_empty() {
        return "No servers to display".to_string();
    }

    let rows: Vec<[String; 6]> = servers
        .iter()
        .map(|server| {
            [
                server.id.to_string(),
                server.ip_address.clone(),
                server.name.clone(),
                server.memory.clone(),
                server.server_type.clone(),
                server.status.label().to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(HEADERS.iter().copied(), &widths));
    for row in &rows {
        lines.push(format_row(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn render_report(outcome: ReportOutcome, target: &str) -> String {
    match outcome {
        ReportOutcome::Exported => format!("Report written to {target}"),
        ReportOutcome::NoTable => "No server table on screen; report not written".to_string(),
        ReportOutcome::Failed => "Report could not be written".to_string(),
    }
}
