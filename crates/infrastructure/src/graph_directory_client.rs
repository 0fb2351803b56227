use std::time::Duration;

use async_trait::async_trait;
use dirsweep_application::{DeletedItemsDirectory, DirectoryObjectRemover};
use dirsweep_core::{AppError, AppResult, GraphErrorInfo};
use dirsweep_domain::DirectoryResourceType;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Public Microsoft Graph v1.0 endpoint.
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

#[derive(Debug, Deserialize)]
struct ODataError {
    error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Connection settings for the Microsoft Graph adapter.
#[derive(Debug, Clone)]
pub struct GraphClientConfig {
    base_url: Url,
    access_token: String,
    request_timeout: Duration,
}

impl GraphClientConfig {
    /// Creates validated connection settings.
    pub fn new(
        base_url: &str,
        access_token: impl Into<String>,
        request_timeout: Duration,
    ) -> AppResult<Self> {
        let base_url = Url::parse(base_url.trim()).map_err(|error| {
            AppError::Validation(format!("invalid graph base url '{base_url}': {error}"))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "graph base url '{base_url}' must be an absolute http(s) url"
            )));
        }

        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(AppError::Validation(
                "graph access token must not be empty".to_owned(),
            ));
        }

        if request_timeout.is_zero() {
            return Err(AppError::Validation(
                "graph request timeout must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            base_url,
            access_token,
            request_timeout,
        })
    }

    /// Returns the base url requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// Microsoft Graph adapter for directory deletes and the deleted items view.
#[derive(Debug, Clone)]
pub struct GraphDirectoryClient {
    http_client: reqwest::Client,
    base_url: Url,
    access_token: String,
}

impl GraphDirectoryClient {
    /// Creates a Graph adapter with its own HTTP client.
    pub fn new(config: GraphClientConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self::with_http_client(http_client, config))
    }

    /// Creates a Graph adapter on top of an existing HTTP client.
    #[must_use]
    pub fn with_http_client(http_client: reqwest::Client, config: GraphClientConfig) -> Self {
        Self {
            http_client,
            base_url: config.base_url,
            access_token: config.access_token,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Validation(format!(
                    "graph base url '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn deleted_item_url(&self, object_id: &str) -> AppResult<Url> {
        self.endpoint(&["directory", "deletedItems", object_id])
    }

    async fn send(&self, method: Method, url: Url) -> AppResult<()> {
        let request_id = Uuid::new_v4().to_string();
        let path = url.path().to_owned();

        let response = self
            .http_client
            .request(method.clone(), url)
            .bearer_auth(self.access_token.as_str())
            .header("client-request-id", request_id.as_str())
            .send()
            .await
            .map_err(|error| {
                AppError::Graph(GraphErrorInfo::new(
                    None,
                    None,
                    format!("{method} {path} transport error: {error}"),
                ))
            })?;

        let status = response.status();
        debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            request_id = %request_id,
            "graph request completed"
        );

        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response body unavailable>".to_owned());
        Err(AppError::Graph(parse_graph_error(status.as_u16(), body.as_str())))
    }
}

/// Builds error detail from a failed Graph response.
fn parse_graph_error(status_code: u16, body: &str) -> GraphErrorInfo {
    if let Ok(odata) = serde_json::from_str::<ODataError>(body) {
        let message = odata
            .error
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("request failed with status {status_code}"));
        return GraphErrorInfo::new(Some(status_code), odata.error.code, message);
    }

    let body = body.trim();
    let message = if body.is_empty() {
        format!("request failed with status {status_code}")
    } else {
        body.to_owned()
    };
    GraphErrorInfo::from_status(status_code, message)
}

#[async_trait]
impl DeletedItemsDirectory for GraphDirectoryClient {
    async fn get_deleted_item(&self, object_id: &str) -> AppResult<()> {
        let url = self.deleted_item_url(object_id)?;
        self.send(Method::GET, url).await
    }

    async fn purge_deleted_item(&self, object_id: &str) -> AppResult<()> {
        let url = self.deleted_item_url(object_id)?;
        self.send(Method::DELETE, url).await
    }
}

#[async_trait]
impl DirectoryObjectRemover for GraphDirectoryClient {
    async fn delete_object(
        &self,
        resource_type: DirectoryResourceType,
        object_id: &str,
    ) -> AppResult<()> {
        let url = self.endpoint(&[resource_type.collection_path(), object_id])?;
        self.send(Method::DELETE, url).await
    }
}
