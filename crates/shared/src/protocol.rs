use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::Server;

/// Payload half of a directory response. List operations fill `servers`,
/// single-record operations (ping, save) fill `server`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<Server>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,
}

/// Response wrapper returned by every directory operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Offset-less backend timestamps are read as UTC; unreadable ones are
    /// dropped rather than failing the whole response.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_stamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_message: Option<String>,
    #[serde(default)]
    pub data: EnvelopeData,
}

impl Envelope {
    pub fn with_servers(message: impl Into<String>, servers: Vec<Server>) -> Self {
        Self {
            message: message.into(),
            data: EnvelopeData {
                servers: Some(servers),
                server: None,
            },
            ..Self::default()
        }
    }

    pub fn with_server(message: impl Into<String>, server: Server) -> Self {
        Self {
            message: message.into(),
            data: EnvelopeData {
                servers: None,
                server: Some(server),
            },
            ..Self::default()
        }
    }

    pub fn servers(&self) -> &[Server] {
        self.data.servers.as_deref().unwrap_or_default()
    }

    pub fn server(&self) -> Option<&Server> {
        self.data.server.as_ref()
    }

    /// Same metadata and message, payload replaced by `servers`.
    pub fn rebased(&self, servers: Vec<Server>) -> Self {
        Self {
            data: EnvelopeData {
                servers: Some(servers),
                server: None,
            },
            ..self.clone()
        }
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
