//! Fleet event types published to front-end subscribers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FleetEvent {
    StoreReset,
    RuntimeRegistering {
        alias: String,
    },
    RuntimeRegistered {
        alias: String,
    },
    RuntimeRegisterFailed,
    RuntimeUnregistered {
        alias: String,
    },
    RuntimeInitialized {
        alias: String,
    },
    RuntimeRefreshStarted,
    RuntimeLoaded {
        alias: String,
    },
    RuntimeRefreshCompleted,
    EnvironmentRequested {
        runtime: String,
        name: String,
    },
    EnvironmentDeleteRequested {
        runtime: String,
        name: String,
    },
    HostRequested {
        wait_url: String,
    },
    HostReady {
        wait_url: String,
        name: String,
    },
    HostFailed {
        wait_url: Option<String>,
    },
}
