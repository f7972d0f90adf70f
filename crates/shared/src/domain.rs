use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseStatusError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ServerId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    ServerUp,
    ServerDown,
}

impl Status {
    pub fn as_wire(self) -> &'static str {
        match self {
            Status::ServerUp => "SERVER_UP",
            Status::ServerDown => "SERVER_DOWN",
        }
    }

    /// Human wording used in filter notifications ("SERVER UP").
    pub fn label(self) -> &'static str {
        match self {
            Status::ServerUp => "SERVER UP",
            Status::ServerDown => "SERVER DOWN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SERVER_UP" | "UP" => Ok(Status::ServerUp),
            "SERVER_DOWN" | "DOWN" => Ok(Status::ServerDown),
            _ => Err(ParseStatusError::new(raw)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    All,
    Only(Status),
}

impl StatusFilter {
    pub fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => expected == status,
        }
    }
}

impl From<Status> for StatusFilter {
    fn from(value: Status) -> Self {
        StatusFilter::Only(value)
    }
}

impl From<StatusFilter> for String {
    fn from(value: StatusFilter) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("ALL"),
            StatusFilter::Only(status) => status.fmt(f),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseStatusError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        raw.parse::<Status>().map(StatusFilter::Only)
    }
}

/// A server record as served by the directory backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: ServerId,
    pub ip_address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub memory: String,
    #[serde(rename = "type", default)]
    pub server_type: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub status: Status,
}

/// Fields submitted by the "new server" form; the backend assigns the id and image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDraft {
    pub ip_address: String,
    pub name: String,
    pub memory: String,
    #[serde(rename = "type")]
    pub server_type: String,
    pub status: Status,
}

impl Default for ServerDraft {
    fn default() -> Self {
        Self {
            ip_address: String::new(),
            name: String::new(),
            memory: String::new(),
            server_type: String::new(),
            status: Status::ServerDown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_backend_wire_names() {
        assert_eq!(
            serde_json::to_string(&Status::ServerUp).expect("serialize"),
            "\"SERVER_UP\""
        );
        let parsed: Status = serde_json::from_str("\"SERVER_DOWN\"").expect("deserialize");
        assert_eq!(parsed, Status::ServerDown);
    }

    #[test]
    fn status_filter_parses_short_and_wire_forms() {
        assert_eq!("all".parse::<StatusFilter>().expect("all"), StatusFilter::All);
        assert_eq!(
            "up".parse::<StatusFilter>().expect("up"),
            StatusFilter::Only(Status::ServerUp)
        );
        assert_eq!(
            "SERVER_DOWN".parse::<StatusFilter>().expect("down"),
            StatusFilter::Only(Status::ServerDown)
        );
        assert!("sideways".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn status_filter_round_trips_all_marker() {
        let json = serde_json::to_string(&StatusFilter::All).expect("serialize");
        assert_eq!(json, "\"ALL\"");
        let only: StatusFilter = serde_json::from_str("\"SERVER_UP\"").expect("deserialize");
        assert_eq!(only, StatusFilter::Only(Status::ServerUp));
    }

    #[test]
    fn server_reads_camel_case_record_with_type_field() {
        let raw = r#"{
            "id": 4,
            "ipAddress": "192.168.1.58",
            "name": "Fedora Linux",
            "memory": "16 GB",
            "type": "Dell Tower",
            "imageUrl": "http://localhost:8080/server/image/server2.png",
            "status": "SERVER_UP"
        }"#;
        let server: Server = serde_json::from_str(raw).expect("server");
        assert_eq!(server.id, ServerId(4));
        assert_eq!(server.server_type, "Dell Tower");
        assert_eq!(server.status, Status::ServerUp);
    }

    #[test]
    fn draft_defaults_to_server_down() {
        assert_eq!(ServerDraft::default().status, Status::ServerDown);
    }
}
