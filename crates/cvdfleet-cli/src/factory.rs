//! Backend factory creating HTTP backends for control-plane endpoints

use std::sync::Arc;

use async_trait::async_trait;

use cvdfleet_client::{HttpBackend, ProvisioningBackend};
use cvdfleet_core::{BackendFactory, CoreError};

/// Default implementation of `BackendFactory`
pub struct HttpBackendFactory;

impl HttpBackendFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        Self
    }
}

impl Default for HttpBackendFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendFactory for HttpBackendFactory {
    async fn create_backend(&self, url: &str) -> Result<Arc<dyn ProvisioningBackend>, CoreError> {
        let backend = HttpBackend::new(url)
            .map_err(|e| CoreError::ConfigError(format!("invalid control-plane URL {url}: {e}")))?;
        Ok(Arc::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backend_creation() {
        let factory = HttpBackendFactory::new();
        let backend = factory.create_backend("http://localhost:8080").await;
        assert!(backend.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_config_error() {
        let factory = HttpBackendFactory::new();
        let err = match factory.create_backend("not a url").await {
            Ok(_) => panic!("expected error for invalid URL"),
            Err(e) => e,
        };
        assert!(matches!(err, CoreError::ConfigError(_)));
    }
}
