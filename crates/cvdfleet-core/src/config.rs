//! Configuration types for fleet operations

use std::time::Duration;

use serde::{Deserialize, Serialize};

use cvdfleet_api::requests::{
    BuildInfo, CreateCvdRequest, CreateHostInstanceRequest, CreateHostRequest, GcpInstance,
};

/// Top-level configuration for the fleet controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Control-plane endpoint used for host and environment operations
    #[serde(default = "default_service_url")]
    pub service_url: String,
    /// Zone host instances are created in
    #[serde(default = "default_zone")]
    pub zone: String,
    /// Wait polling settings
    #[serde(default)]
    pub poll: PollPolicy,
    /// Defaults for host creation requests
    #[serde(default)]
    pub host: HostDefaults,
    /// Defaults for CVD creation requests
    #[serde(default)]
    pub build: BuildDefaults,
    /// Runtimes registered at startup
    #[serde(default)]
    pub runtime: Vec<RuntimeEndpoint>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            zone: default_zone(),
            poll: PollPolicy::default(),
            host: HostDefaults::default(),
            build: BuildDefaults::default(),
            runtime: Vec::new(),
        }
    }
}

fn default_service_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_zone() -> String {
    "us-central1-b".to_string()
}

/// A preconfigured control-plane endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEndpoint {
    /// Unique alias the runtime is addressed by
    pub alias: String,
    /// Base URL of the control plane
    pub url: String,
}

/// Polling settings for operation waits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Interval between poll requests in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    /// Give up on a wait after this many seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl PollPolicy {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_poll_timeout_secs() -> u64 {
    300
}

/// Defaults for host creation requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostDefaults {
    #[serde(default = "default_disk_size_gb")]
    pub disk_size_gb: u32,
    #[serde(default = "default_machine_type")]
    pub machine_type: String,
    #[serde(default = "default_min_cpu_platform")]
    pub min_cpu_platform: String,
}

impl Default for HostDefaults {
    fn default() -> Self {
        Self {
            disk_size_gb: default_disk_size_gb(),
            machine_type: default_machine_type(),
            min_cpu_platform: default_min_cpu_platform(),
        }
    }
}

impl HostDefaults {
    /// Build a host creation request from these defaults
    #[must_use]
    pub fn to_request(&self) -> CreateHostRequest {
        CreateHostRequest {
            create_host_instance_request: CreateHostInstanceRequest {
                gcp: GcpInstance {
                    disk_size_gb: self.disk_size_gb,
                    machine_type: self.machine_type.clone(),
                    min_cpu_platform: Some(self.min_cpu_platform.clone()),
                },
            },
        }
    }
}

fn default_disk_size_gb() -> u32 {
    30
}

fn default_machine_type() -> String {
    "zones/us-central1-b/machineTypes/n1-standard-4".to_string()
}

fn default_min_cpu_platform() -> String {
    "Intel Haswell".to_string()
}

/// Defaults for CVD creation requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildDefaults {
    #[serde(default = "default_build_id")]
    pub build_id: String,
    #[serde(default = "default_build_target")]
    pub target: String,
    /// Optional separate build the fetcher tool comes from
    pub fetch_cvd_build_id: Option<String>,
}

impl Default for BuildDefaults {
    fn default() -> Self {
        Self {
            build_id: default_build_id(),
            target: default_build_target(),
            fetch_cvd_build_id: None,
        }
    }
}

impl BuildDefaults {
    /// Build a CVD creation request from these defaults
    #[must_use]
    pub fn to_request(&self, instances_count: Option<u32>) -> CreateCvdRequest {
        CreateCvdRequest {
            build_info: BuildInfo {
                build_id: self.build_id.clone(),
                target: self.target.clone(),
            },
            instances_count,
            fetch_cvd_build_id: self.fetch_cvd_build_id.clone(),
        }
    }
}

fn default_build_id() -> String {
    "8673413".to_string()
}

fn default_build_target() -> String {
    "aosp_cf_x86_64_phone-userdebug".to_string()
}
