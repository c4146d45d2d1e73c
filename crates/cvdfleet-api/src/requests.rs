//! Request types for the provisioning control plane

use serde::{Deserialize, Serialize};

/// Body for `POST /v1/zones/{zone}/hosts`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHostRequest {
    pub create_host_instance_request: CreateHostInstanceRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHostInstanceRequest {
    pub gcp: GcpInstance,
}

/// GCP shape of a host instance, used both when requesting one and when
/// the control plane describes an existing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpInstance {
    pub disk_size_gb: u32,
    pub machine_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_cpu_platform: Option<String>,
}

/// Body for `POST /v1/zones/{zone}/hosts/{host}/cvds`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCvdRequest {
    pub build_info: BuildInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_cvd_build_id: Option<String>,
}

/// Android build the CVDs boot from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfo {
    pub build_id: String,
    pub target: String,
}
