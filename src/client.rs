use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::site::Site;

/// Items requested per listing call; the remote caps pages at this size.
pub const PAGE_SIZE: u32 = 100;

/// Failure at the remote boundary. `Status` is the remote rejecting the
/// request; `Transport` covers DNS, refused connections, and timeouts.
/// Neither is ever allowed to escape as a panic or an unconverted error.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

/// Remote resource as returned by a collection endpoint. Field shapes vary
/// per endpoint (plain strings vs `{"rendered": ...}` objects), so title and
/// content stay raw JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub content: Value,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl ContentItem {
    /// Best-effort human-readable title.
    pub fn title_text(&self) -> String {
        match &self.title {
            Value::String(s) => s.clone(),
            Value::Object(o) => o
                .get("rendered")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }
}

/// The five operations the executor and rollback are written against.
/// `RemoteClient` is the production implementation; tests substitute their
/// own.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Current snapshot of a collection, newest first. `Err` means the
    /// remote state could not be established; `Ok(vec![])` means zero items.
    async fn fetch_items(&self, endpoint: &str) -> Result<Vec<ContentItem>, ClientError>;

    /// Single-item lookup, returned as raw JSON for snapshotting.
    async fn fetch_item(&self, endpoint: &str, id: &str) -> Result<Value, ClientError>;

    async fn create_item(
        &self,
        endpoint: &str,
        changes: &Map<String, Value>,
    ) -> Result<String, ClientError>;

    async fn update_item(
        &self,
        endpoint: &str,
        id: &str,
        changes: &Map<String, Value>,
    ) -> Result<String, ClientError>;

    async fn delete_item(&self, endpoint: &str, id: &str) -> Result<String, ClientError>;
}

/// Typed wrapper over one site's REST API.
#[derive(Debug)]
pub struct RemoteClient {
    http: reqwest::Client,
    root: Url,
    username: String,
    app_password: String,
}

impl RemoteClient {
    pub fn new(site: &Site) -> Result<Self, ClientError> {
        let root = Url::parse(&site.api_root())
            .map_err(|e| ClientError::Transport(format!("invalid site url: {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent("copydesk/0.1")
            .build()?;
        Ok(Self {
            http,
            root,
            username: site.username.clone(),
            app_password: site.app_password.clone(),
        })
    }

    fn collection_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.root.as_str().trim_end_matches('/'), endpoint)
    }

    fn item_url(&self, endpoint: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(endpoint), id)
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        Ok(req
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?)
    }

    /// Quick credential/URL check against the default collection.
    pub async fn probe(&self) -> bool {
        let url = format!("{}?per_page=1", self.collection_url("posts"));
        match self.send(self.http.get(&url)).await {
            Ok(resp) => resp.status().as_u16() < 400,
            Err(_) => false,
        }
    }
}

/// Convert a non-2xx response into `ClientError::Status`, surfacing the body
/// text verbatim.
async fn status_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    ClientError::Status { status, body }
}

fn id_text(body: &Value) -> String {
    match body.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => "?".to_string(),
    }
}

#[async_trait]
impl ContentApi for RemoteClient {
    async fn fetch_items(&self, endpoint: &str) -> Result<Vec<ContentItem>, ClientError> {
        let url = format!("{}?per_page={}", self.collection_url(endpoint), PAGE_SIZE);
        debug!(%url, "fetching items");
        let resp = self.send(self.http.get(&url)).await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn fetch_item(&self, endpoint: &str, id: &str) -> Result<Value, ClientError> {
        let resp = self.send(self.http.get(&self.item_url(endpoint, id))).await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn create_item(
        &self,
        endpoint: &str,
        changes: &Map<String, Value>,
    ) -> Result<String, ClientError> {
        let resp = self
            .send(self.http.post(&self.collection_url(endpoint)).json(changes))
            .await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Ok(format!("New item created with ID {}", id_text(&body)))
    }

    async fn update_item(
        &self,
        endpoint: &str,
        id: &str,
        changes: &Map<String, Value>,
    ) -> Result<String, ClientError> {
        // The remote updates through POST on the item path, not PUT/PATCH.
        let resp = self
            .send(self.http.post(&self.item_url(endpoint, id)).json(changes))
            .await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        Ok(format!("ID {id} updated."))
    }

    async fn delete_item(&self, endpoint: &str, id: &str) -> Result<String, ClientError> {
        let resp = self.send(self.http.delete(&self.item_url(endpoint, id))).await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        // A 2xx response is a successful delete regardless of body shape.
        Ok(format!("ID {id} deleted."))
    }
}
