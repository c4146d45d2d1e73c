//! Entity records and the owned orchestrator state

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registration status of a runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeStatus {
    Pending,
    Registered,
    Error,
}

/// A registered connection to a provisioning control plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Runtime {
    /// Unique alias, the merge key across loads
    pub alias: String,
    /// Base URL of the control plane
    pub url: String,
    pub status: RuntimeStatus,
    /// Post-registration setup completed
    #[serde(default)]
    pub initialized: bool,
    /// When the record was last confirmed against the endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// A named grouping of virtual devices on a host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Name, unique per runtime
    pub name: String,
    /// Alias of the owning runtime
    pub runtime_alias: String,
    /// Host the devices run on
    pub host: String,
    /// Member device ids
    #[serde(default)]
    pub devices: Vec<String>,
}

/// Creation status of a host instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostStatus {
    Waiting,
    Ready,
    Error,
}

/// A cloud compute instance that can run virtual devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    /// Name assigned by the control plane, absent until the host is ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub zone: String,
    pub status: HostStatus,
    /// Wait tracking the creation request while it is in flight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_url: Option<String>,
}

/// Outcome of an in-flight asynchronous operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitOutcome {
    #[default]
    Pending,
    Resolved,
    Failed,
}

/// Handle for an in-flight asynchronous backend operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wait {
    /// Poll URL, the key identifying the wait
    pub url: String,
    /// Zone of the entity the wait tracks
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub outcome: WaitOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl Wait {
    /// A pending wait started now
    #[must_use]
    pub fn new(url: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            zone: zone.into(),
            outcome: WaitOutcome::Pending,
            started_at: Some(Utc::now()),
        }
    }
}

/// Phase of the runtime registration flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationPhase {
    #[default]
    Idle,
    Pending,
    Failed,
}

/// The single owned snapshot of orchestrator state.
///
/// The reducer produces a fresh value per action; consumers only ever hold
/// `Arc`-shared snapshots and never observe in-place mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Runtimes keyed by alias
    pub runtimes: BTreeMap<String, Runtime>,
    /// Alias of the runtime the UI is working against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_runtime: Option<String>,
    pub registration: RegistrationPhase,
    /// A runtime refresh cycle is in progress
    #[serde(default)]
    pub refreshing: bool,
    pub environments: Vec<Environment>,
    pub hosts: Vec<Host>,
    /// In-flight waits keyed by poll URL
    pub waits: BTreeMap<String, Wait>,
}

impl State {
    /// The host record tracking the given wait, if any
    #[must_use]
    pub fn host_for_wait(&self, wait_url: &str) -> Option<&Host> {
        self.hosts
            .iter()
            .find(|h| h.wait_url.as_deref() == Some(wait_url))
    }

    /// The active runtime record, if one is set and present
    #[must_use]
    pub fn active(&self) -> Option<&Runtime> {
        self.active_runtime
            .as_deref()
            .and_then(|alias| self.runtimes.get(alias))
    }
}
