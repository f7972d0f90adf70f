use std::path::PathBuf;

use thiserror::Error;

/// Failure of a directory operation. The coordinator only ever surfaces the
/// rendered message, so the `Display` text is what the user sees.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("An error occurred - Error code: {code}")]
    Status { code: u16 },
    #[error("An error occurred - {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid directory url: {0}")]
    Url(#[from] url::ParseError),
    #[error("directory url '{0}' cannot carry path segments")]
    BaseUrl(String),
    #[error("{0}")]
    Rejected(String),
}

impl DirectoryError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write report to '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
