//! HTTP backend for the provisioning control plane

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use cvdfleet_api::requests::{CreateCvdRequest, CreateHostRequest};
use cvdfleet_api::responses::{DeviceDescriptor, ListHostsResponse, Operation};

use crate::error::{BackendError, Result};
use crate::traits::ProvisioningBackend;

/// reqwest-based [`ProvisioningBackend`] against one control-plane endpoint
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a new backend for the given base URL
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    ///
    /// # Example
    /// ```no_run
    /// use cvdfleet_client::HttpBackend;
    ///
    /// let backend = HttpBackend::new("http://localhost:8080")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    /// Create a new backend with a custom `reqwest::Client`
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    pub fn with_client(base_url: impl AsRef<str>, client: Client) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self { client, base_url })
    }

    /// The endpoint this backend talks to
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a full URL from a path
    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(BackendError::Url)
    }

    /// Perform a GET request and deserialize the response
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, message });
        }

        Ok(response.json().await?)
    }

    /// Perform a POST request with JSON body
    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl serde::Serialize,
    ) -> Result<T> {
        let url = self.url(path)?;
        debug!(%url, "POST");
        let response = self.client.post(url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, message });
        }

        Ok(response.json().await?)
    }

    /// Perform a DELETE request and deserialize the response
    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        debug!(%url, "DELETE");
        let response = self.client.delete(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, message });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ProvisioningBackend for HttpBackend {
    async fn create_host(&self, zone: &str, req: &CreateHostRequest) -> Result<Operation> {
        self.post(&format!("/v1/zones/{zone}/hosts"), req).await
    }

    async fn list_hosts(&self, zone: &str) -> Result<ListHostsResponse> {
        self.get(&format!("/v1/zones/{zone}/hosts")).await
    }

    async fn create_cvds(
        &self,
        zone: &str,
        host: &str,
        req: &CreateCvdRequest,
    ) -> Result<Operation> {
        self.post(&format!("/v1/zones/{zone}/hosts/{host}/cvds"), req)
            .await
    }

    async fn delete_cvd(&self, zone: &str, host: &str, name: &str) -> Result<Operation> {
        self.delete(&format!("/v1/zones/{zone}/hosts/{host}/cvds/{name}"))
            .await
    }

    async fn list_devices(&self, zone: &str, host: &str) -> Result<Vec<DeviceDescriptor>> {
        self.get(&format!("/v1/zones/{zone}/hosts/{host}/devices"))
            .await
    }

    async fn get_operation(&self, wait_url: &str) -> Result<Operation> {
        self.get(wait_url).await
    }

    fn backend_type(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_creation() {
        let backend = HttpBackend::new("http://localhost:8080");
        assert!(backend.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let backend = HttpBackend::new("not a url");
        assert!(backend.is_err());
    }

    #[test]
    fn test_url_building() {
        let backend = HttpBackend::new("http://localhost:8080").unwrap();
        let url = backend.url("/v1/zones/us-central1-b/hosts").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/v1/zones/us-central1-b/hosts"
        );
    }

    #[test]
    fn test_wait_url_joins_against_base() {
        let backend = HttpBackend::new("http://orchestrator:1080/").unwrap();
        let url = backend
            .url("/v1/zones/us-central1-b/operations/op-42")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://orchestrator:1080/v1/zones/us-central1-b/operations/op-42"
        );
    }

    #[test]
    fn test_operation_decoding_pending() {
        let op: Operation =
            serde_json::from_str(r#"{"name":"/v1/zones/z/operations/op-1","done":false}"#).unwrap();
        assert_eq!(op.name, "/v1/zones/z/operations/op-1");
        assert!(!op.done);
        assert!(op.error_message().is_none());
    }

    #[test]
    fn test_operation_decoding_failed() {
        let op: Operation = serde_json::from_str(
            r#"{"name":"op-1","done":true,"result":{"error":{"error":"quota exceeded"}}}"#,
        )
        .unwrap();
        assert!(op.done);
        assert_eq!(op.error_message(), Some("quota exceeded"));
    }

    #[test]
    fn test_operation_decoding_response() {
        let op: Operation = serde_json::from_str(
            r#"{"name":"op-1","done":true,"result":{"response":{"name":"cf-1234"}}}"#,
        )
        .unwrap();
        assert!(op.done);
        assert_eq!(op.response().unwrap()["name"], "cf-1234");
    }
}
