use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown server status '{raw}' (expected SERVER_UP, SERVER_DOWN or ALL)")]
pub struct ParseStatusError {
    pub raw: String,
}

impl ParseStatusError {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}
