//! Response types for the provisioning control plane

use serde::{Deserialize, Serialize};

use crate::requests::GcpInstance;

/// Handle for an asynchronous control-plane operation.
///
/// `name` doubles as the path the operation can be polled at. While `done`
/// is `false` the operation is still in progress; once `true`, `result`
/// carries either an error or the response object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<OperationResult>,
}

impl Operation {
    /// Error message of a completed, failed operation.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|r| r.error.as_ref())
            .map(|e| e.error.as_str())
    }

    /// Response payload of a completed, successful operation.
    #[must_use]
    pub fn response(&self) -> Option<&serde_json::Value> {
        self.result.as_ref().and_then(|r| r.response.as_ref())
    }
}

/// Terminal outcome of an operation, either an error or a response object
/// but never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorMsg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

/// Error body returned by the control plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMsg {
    pub error: String,
}

/// A host instance as described by the control plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInstance {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpInstance>,
}

/// Response of `GET /v1/zones/{zone}/hosts`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListHostsResponse {
    #[serde(default)]
    pub hosts: Vec<HostInstance>,
}

/// A virtual device running on a host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}
