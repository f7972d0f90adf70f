//! Directory Service contract and its HTTP implementation.

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use shared::{
    domain::{ServerDraft, ServerId, StatusFilter},
    protocol::Envelope,
};
use tracing::debug;
use url::Url;

use crate::error::DirectoryError;

#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn list_servers(&self) -> Result<Envelope, DirectoryError>;
    async fn ping(&self, ip_address: &str) -> Result<Envelope, DirectoryError>;
    async fn save(&self, draft: &ServerDraft) -> Result<Envelope, DirectoryError>;
    async fn delete(&self, id: ServerId) -> Result<Envelope, DirectoryError>;

    /// Filtering runs over the caller's snapshot, not over the backend.
    async fn filter(
        &self,
        status: StatusFilter,
        current: &Envelope,
    ) -> Result<Envelope, DirectoryError> {
        Ok(filter_envelope(status, current))
    }
}

pub fn filter_envelope(status: StatusFilter, current: &Envelope) -> Envelope {
    let status = match status {
        StatusFilter::All => {
            return Envelope {
                message: "Servers filtered by ALL status".to_string(),
                ..current.clone()
            };
        }
        StatusFilter::Only(status) => status,
    };

    let matching: Vec<_> = current
        .servers()
        .iter()
        .filter(|server| server.status == status)
        .cloned()
        .collect();
    let message = if matching.is_empty() {
        format!("No servers of {status} found")
    } else {
        format!("Servers filtered by {} status", status.label())
    };

    Envelope {
        message,
        ..current.rebased(matching)
    }
}

pub struct HttpDirectoryService {
    http: Client,
    base_url: Url,
}

impl HttpDirectoryService {
    pub fn new(base_url: &str) -> Result<Self, DirectoryError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, DirectoryError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::BaseUrl(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&ServerDraft>,
    ) -> Result<Envelope, DirectoryError> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "directory request");
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let res = request.send().await?;
        decode(res).await
    }
}

async fn decode(res: Response) -> Result<Envelope, DirectoryError> {
    let status = res.status();
    if !status.is_success() {
        return Err(DirectoryError::Status {
            code: status.as_u16(),
        });
    }
    Ok(res.json::<Envelope>().await?)
}

#[async_trait]
impl DirectoryService for HttpDirectoryService {
    async fn list_servers(&self) -> Result<Envelope, DirectoryError> {
        self.send(Method::GET, &["server", "list"], None).await
    }

    async fn ping(&self, ip_address: &str) -> Result<Envelope, DirectoryError> {
        self.send(Method::GET, &["server", "ping", ip_address], None)
            .await
    }

    async fn save(&self, draft: &ServerDraft) -> Result<Envelope, DirectoryError> {
        self.send(Method::POST, &["server", "save"], Some(draft))
            .await
    }

    async fn delete(&self, id: ServerId) -> Result<Envelope, DirectoryError> {
        let id = id.to_string();
        self.send(Method::DELETE, &["server", "delete", id.as_str()], None)
            .await
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
