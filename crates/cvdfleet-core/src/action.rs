//! Action vocabulary for the orchestration core

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::state::{Environment, Host, Runtime, Wait};

/// Closed set of events the orchestrator reacts to.
///
/// The serde representation tags each variant with its kebab-case name
/// under `type`, so `host-create-complete` and friends are the wire tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    Init,
    RuntimeRegisterStart { alias: String, url: String },
    RuntimeRegisterComplete { runtime: Runtime },
    RuntimeRegisterError,
    RuntimeUnregister { alias: String },
    RuntimeInit,
    RuntimeRefreshStart,
    RuntimeLoad { runtime: Runtime },
    RuntimeLoadComplete,
    EnvCreateStart { env: Environment },
    EnvDeleteStart { target: Environment },
    HostCreateStart { wait: Wait },
    HostCreateComplete { wait_url: String, host: Host },
    HostCreateError { wait_url: Option<String> },
}

/// Every tag in the vocabulary, in declaration order
pub const ACTION_TAGS: &[&str] = &[
    "init",
    "runtime-register-start",
    "runtime-register-complete",
    "runtime-register-error",
    "runtime-unregister",
    "runtime-init",
    "runtime-refresh-start",
    "runtime-load",
    "runtime-load-complete",
    "env-create-start",
    "env-delete-start",
    "host-create-start",
    "host-create-complete",
    "host-create-error",
];

impl Action {
    /// Wire tag of this action
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Action::Init => "init",
            Action::RuntimeRegisterStart { .. } => "runtime-register-start",
            Action::RuntimeRegisterComplete { .. } => "runtime-register-complete",
            Action::RuntimeRegisterError => "runtime-register-error",
            Action::RuntimeUnregister { .. } => "runtime-unregister",
            Action::RuntimeInit => "runtime-init",
            Action::RuntimeRefreshStart => "runtime-refresh-start",
            Action::RuntimeLoad { .. } => "runtime-load",
            Action::RuntimeLoadComplete => "runtime-load-complete",
            Action::EnvCreateStart { .. } => "env-create-start",
            Action::EnvDeleteStart { .. } => "env-delete-start",
            Action::HostCreateStart { .. } => "host-create-start",
            Action::HostCreateComplete { .. } => "host-create-complete",
            Action::HostCreateError { .. } => "host-create-error",
        }
    }

    /// Parse an action from its JSON form.
    ///
    /// An unknown `type` tag and a malformed payload are programming
    /// errors on the dispatching side and come back as distinguishable
    /// [`CoreError`] kinds rather than being silently dropped.
    ///
    /// # Errors
    /// [`CoreError::UnhandledAction`] for an unknown tag,
    /// [`CoreError::MalformedAction`] for a missing tag or bad payload.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        let Some(tag) = value.get("type").and_then(|t| t.as_str()) else {
            return Err(CoreError::MalformedAction(
                "missing `type` tag".to_string(),
            ));
        };
        if !ACTION_TAGS.contains(&tag) {
            return Err(CoreError::UnhandledAction(tag.to_string()));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::MalformedAction(format!("{tag}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tags_round_trip() {
        let action = Action::RuntimeUnregister {
            alias: "lab".to_string(),
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "runtime-unregister");
        assert_eq!(Action::from_json(&value).unwrap(), action);
    }

    #[test]
    fn test_unknown_tag_fails_loudly() {
        let err = Action::from_json(&json!({"type": "host-reboot-start"})).unwrap_err();
        assert!(matches!(err, CoreError::UnhandledAction(tag) if tag == "host-reboot-start"));
    }

    #[test]
    fn test_missing_tag_is_malformed() {
        let err = Action::from_json(&json!({"alias": "lab"})).unwrap_err();
        assert!(matches!(err, CoreError::MalformedAction(_)));
    }

    #[test]
    fn test_missing_payload_field_is_malformed() {
        // runtime-unregister requires an alias
        let err = Action::from_json(&json!({"type": "runtime-unregister"})).unwrap_err();
        assert!(matches!(err, CoreError::MalformedAction(_)));
    }

    #[test]
    fn test_host_create_start_accepts_minimal_wait() {
        let action =
            Action::from_json(&json!({"type": "host-create-start", "wait": {"url": "/op/1"}}))
                .unwrap();
        match action {
            Action::HostCreateStart { wait } => {
                assert_eq!(wait.url, "/op/1");
                assert_eq!(wait.outcome, crate::state::WaitOutcome::Pending);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }
}
