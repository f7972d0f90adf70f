//! Spreadsheet export of the rendered server table.

use std::{
    fs,
    path::{Path, PathBuf},
};

use shared::domain::Server;
use tracing::info;

use crate::error::ExportError;

pub const REPORT_FILE_NAME: &str = "server-report.xls";
pub const REPORT_MIME_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.12";
pub const REPORT_TABLE_ID: &str = "servers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Exported,
    /// Nothing was on screen to export.
    NoTable,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub markup: String,
}

impl ReportArtifact {
    pub fn from_markup(markup: String) -> Self {
        Self {
            file_name: REPORT_FILE_NAME.to_string(),
            mime_type: REPORT_MIME_TYPE.to_string(),
            markup,
        }
    }

    /// Downloadable `data:` URL. Only spaces are escaped, matching what
    /// spreadsheet importers expect from an inline table.
    pub fn href(&self) -> String {
        format!("data:{},{}", self.mime_type, self.markup.replace(' ', "%20"))
    }
}

/// Destination for a finished report. File sinks store `markup` under
/// `file_name`; sinks that hand the report to a browser or another process
/// use `href()`, which carries `mime_type` inline.
pub trait ExportSink: Send + Sync {
    fn export(&self, artifact: &ReportArtifact) -> Result<(), ExportError>;
}

/// Writes reports into a directory, overwriting the previous one.
pub struct FileExportSink {
    dir: PathBuf,
}

impl FileExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn target_path(&self, artifact: &ReportArtifact) -> PathBuf {
        self.dir.join(&artifact.file_name)
    }
}

impl ExportSink for FileExportSink {
    fn export(&self, artifact: &ReportArtifact) -> Result<(), ExportError> {
        let path = self.target_path(artifact);
        write_report(&self.dir, &path, &artifact.markup)?;
        info!(
            path = %path.display(),
            mime_type = %artifact.mime_type,
            bytes = artifact.markup.len(),
            "report written"
        );
        Ok(())
    }
}

fn write_report(dir: &Path, path: &Path, markup: &str) -> Result<(), ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    fs::write(path, markup).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn render_table(servers: &[Server]) -> String {
    let mut out = String::new();
    out.push_str(&format!("<table id=\"{REPORT_TABLE_ID}\">"));
    out.push_str(
        "<thead><tr><th>IP Address</th><th>Name</th><th>Memory</th><th>Type</th><th>Status</th></tr></thead>",
    );
    out.push_str("<tbody>");
    for server in servers {
        out.push_str("<tr>");
        for cell in [
            server.ip_address.as_str(),
            server.name.as_str(),
            server.memory.as_str(),
            server.server_type.as_str(),
            server.status.label(),
        ] {
            out.push_str("<td>");
            out.push_str(&escape_html(cell));
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
