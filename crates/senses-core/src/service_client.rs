//! HTTP client for the persona persistence API.
//!
//! Implements [`PersistenceService`] over REST. Enabled by the
//! `service-client` feature.
//!
//! # Example
//!
//! ```no_run
//! use senses_core::service_client::ServiceClient;
//! use senses_core::{PersistenceService, PersonaDocument};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ServiceClient::new("http://localhost:8080")?;
//! client.update_persona("persona-1", &PersonaDocument::default()).await?;
//! client.delete_connection("conn-7").await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;

use crate::error::Error;
use crate::persistence::{NewConnection, PersistedConnection, PersistenceService, PersonaDocument};

/// HTTP client for the persona persistence API.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
    base_url: String,
}

/// Error type for service client operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceClientError {
    /// The service is not reachable.
    #[error("Service not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// API returned an error response.
    #[error("API error: {message}")]
    ApiError { status: u16, message: String },
}

/// Result type for service client operations.
pub type Result<T> = std::result::Result<T, ServiceClientError>;

impl ServiceClientError {
    /// Convert into the crate error, tagged with the failed operation.
    pub fn into_persistence(self, operation: &str) -> Error {
        Error::persistence(operation, self.to_string())
    }
}

impl ServiceClient {
    /// Create a new service client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the API (e.g., "http://localhost:8080")
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(ServiceClientError::Request)?;

        Self::with_client(base_url, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        // Normalize URL (remove trailing slash)
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ServiceClientError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }
        Url::parse(&base_url)
            .map_err(|e| ServiceClientError::InvalidUrl(format!("{base_url}: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ServiceClientError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| {
                ServiceClientError::InvalidUrl(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    fn persona_url(&self, persona_id: &str) -> Result<String> {
        self.endpoint(&["personas", persona_id])
    }

    fn connections_url(&self) -> Result<String> {
        self.endpoint(&["oauth-connections"])
    }

    fn connection_url(&self, connection_id: &str) -> Result<String> {
        self.endpoint(&["oauth-connections", connection_id])
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    async fn post_json<T: serde::de::DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        debug!(url, "POST");
        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            ServiceClientError::NotReachable {
                url: url.to_string(),
                source: e,
            }
        })?;

        let response = Self::check_status(response).await?;
        response.json().await.map_err(ServiceClientError::Request)
    }

    async fn put_json<B: Serialize>(&self, url: &str, body: &B) -> Result<()> {
        debug!(url, "PUT");
        let response = self.client.put(url).json(body).send().await.map_err(|e| {
            ServiceClientError::NotReachable {
                url: url.to_string(),
                source: e,
            }
        })?;

        Self::check_status(response).await.map(|_| ())
    }

    async fn delete(&self, url: &str) -> Result<()> {
        debug!(url, "DELETE");
        let response =
            self.client
                .delete(url)
                .send()
                .await
                .map_err(|e| ServiceClientError::NotReachable {
                    url: url.to_string(),
                    source: e,
                })?;

        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| status.to_string());

        Err(ServiceClientError::ApiError {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PersistenceService for ServiceClient {
    async fn update_persona(
        &self,
        persona_id: &str,
        document: &PersonaDocument,
    ) -> crate::error::Result<()> {
        let url = self
            .persona_url(persona_id)
            .map_err(|e| e.into_persistence("update_persona"))?;
        self.put_json(&url, document)
            .await
            .map_err(|e| e.into_persistence("update_persona"))
    }

    async fn create_connection(
        &self,
        request: &NewConnection,
    ) -> crate::error::Result<PersistedConnection> {
        let url = self
            .connections_url()
            .map_err(|e| e.into_persistence("create_connection"))?;
        self.post_json(&url, request)
            .await
            .map_err(|e| e.into_persistence("create_connection"))
    }

    async fn delete_connection(&self, connection_id: &str) -> crate::error::Result<()> {
        let url = self
            .connection_url(connection_id)
            .map_err(|e| e.into_persistence("delete_connection"))?;
        self.delete(&url)
            .await
            .map_err(|e| e.into_persistence("delete_connection"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ServiceClient::new("http://localhost:8080");
        assert!(client.is_ok());

        let client = client.unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_normalizes_url() {
        let client = ServiceClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_invalid_url() {
        let result = ServiceClient::new("localhost:8080");
        assert!(matches!(result, Err(ServiceClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_endpoint_paths() {
        let client = ServiceClient::new("https://api.example.com/v1/").unwrap();
        assert_eq!(
            client.persona_url("p-1").unwrap(),
            "https://api.example.com/v1/personas/p-1"
        );
        assert_eq!(
            client.connections_url().unwrap(),
            "https://api.example.com/v1/oauth-connections"
        );
        assert_eq!(
            client.connection_url("c-9").unwrap(),
            "https://api.example.com/v1/oauth-connections/c-9"
        );

        let root = ServiceClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            root.persona_url("p-1").unwrap(),
            "http://localhost:8080/personas/p-1"
        );
    }

    #[test]
    fn test_endpoint_ids_are_escaped() {
        let client = ServiceClient::new("https://api.example.com/v1").unwrap();
        assert_eq!(
            client.connection_url("a/b?c").unwrap(),
            "https://api.example.com/v1/oauth-connections/a%2Fb%3Fc"
        );
        assert_eq!(
            client.persona_url("../admin#x").unwrap(),
            "https://api.example.com/v1/personas/..%2Fadmin%23x"
        );
    }

    #[test]
    fn test_error_into_persistence() {
        let err = ServiceClientError::ApiError {
            status: 500,
            message: "boom".into(),
        }
        .into_persistence("update_persona");
        assert_eq!(
            err.to_string(),
            "Persistence call 'update_persona' failed: API error: boom"
        );
    }
}
