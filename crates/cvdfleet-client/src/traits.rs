//! Provisioning backend trait

use async_trait::async_trait;

use cvdfleet_api::requests::{CreateCvdRequest, CreateHostRequest};
use cvdfleet_api::responses::{DeviceDescriptor, ListHostsResponse, Operation};

use crate::error::Result;

/// Narrow interface the orchestration core uses to reach a control plane.
///
/// Implementations own all I/O; callers never see a transport.
#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    /// Request creation of a host instance, returning an operation handle.
    async fn create_host(&self, zone: &str, req: &CreateHostRequest) -> Result<Operation>;

    /// List host instances in a zone.
    async fn list_hosts(&self, zone: &str) -> Result<ListHostsResponse>;

    /// Request creation of CVDs on a host, returning an operation handle.
    async fn create_cvds(
        &self,
        zone: &str,
        host: &str,
        req: &CreateCvdRequest,
    ) -> Result<Operation>;

    /// Request deletion of a CVD on a host.
    async fn delete_cvd(&self, zone: &str, host: &str, name: &str) -> Result<Operation>;

    /// List virtual devices running on a host.
    async fn list_devices(&self, zone: &str, host: &str) -> Result<Vec<DeviceDescriptor>>;

    /// Fetch the current status of an operation by its wait URL.
    async fn get_operation(&self, wait_url: &str) -> Result<Operation>;

    fn backend_type(&self) -> &'static str;
}
