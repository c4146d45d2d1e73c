//! Pure orchestration reducer
//!
//! The only place fleet state changes. `apply` maps one action onto the
//! current snapshot and returns a fresh one together with the effects the
//! dispatcher must execute; it performs no I/O and never suspends.

use tracing::{debug, warn};

use crate::action::Action;
use crate::config::RuntimeEndpoint;
use crate::effect::Effect;
use crate::state::{Host, HostStatus, RegistrationPhase, State, WaitOutcome};

/// Result of applying one action: the next snapshot plus requested effects
#[derive(Debug, Clone, Default)]
pub struct Transition {
    pub state: State,
    pub effects: Vec<Effect>,
}

/// Apply `action` to `state`.
///
/// Deterministic and total over the action vocabulary. The returned state
/// is a fresh value; callers holding the previous snapshot never see it
/// change underneath them.
#[must_use]
pub fn apply(state: &State, action: &Action) -> Transition {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match action {
        Action::Init => {
            next = State::default();
        }

        Action::RuntimeRegisterStart { alias, url } => {
            next.registration = RegistrationPhase::Pending;
            effects.push(Effect::ProbeRuntime {
                alias: alias.clone(),
                url: url.clone(),
            });
        }
        Action::RuntimeRegisterComplete { runtime } => {
            next.registration = RegistrationPhase::Idle;
            next.active_runtime = Some(runtime.alias.clone());
            next.runtimes.insert(runtime.alias.clone(), runtime.clone());
        }
        Action::RuntimeRegisterError => {
            next.registration = RegistrationPhase::Failed;
        }
        Action::RuntimeUnregister { alias } => {
            if next.runtimes.remove(alias).is_none() {
                debug!(%alias, "unregister for unknown runtime, ignoring");
            }
            next.environments.retain(|e| e.runtime_alias != *alias);
            if next.active_runtime.as_deref() == Some(alias.as_str()) {
                next.active_runtime = None;
            }
            // in-flight waits are left to settle as stale completions
        }
        Action::RuntimeInit => match next.active_runtime.clone() {
            Some(alias) => {
                if let Some(runtime) = next.runtimes.get_mut(&alias) {
                    runtime.initialized = true;
                }
            }
            None => warn!("runtime-init with no active runtime, ignoring"),
        },
        Action::RuntimeRefreshStart => {
            next.refreshing = true;
            let endpoints = next
                .runtimes
                .values()
                .map(|r| RuntimeEndpoint {
                    alias: r.alias.clone(),
                    url: r.url.clone(),
                })
                .collect();
            effects.push(Effect::LoadRuntimes { endpoints });
        }
        Action::RuntimeLoad { runtime } => {
            // alias is the merge key: replace, never duplicate
            next.runtimes.insert(runtime.alias.clone(), runtime.clone());
        }
        Action::RuntimeLoadComplete => {
            next.refreshing = false;
        }

        Action::EnvCreateStart { env } => {
            next.environments
                .retain(|e| !(e.runtime_alias == env.runtime_alias && e.name == env.name));
            next.environments.push(env.clone());
            effects.push(Effect::CreateEnvironment { env: env.clone() });
        }
        Action::EnvDeleteStart { target } => {
            // request-only: the delete is forwarded regardless, the
            // backend is the source of truth for what exists
            let before = next.environments.len();
            next.environments
                .retain(|e| !(e.runtime_alias == target.runtime_alias && e.name == target.name));
            if next.environments.len() == before {
                debug!(env = %target.name, "delete for unrecorded environment");
            }
            effects.push(Effect::DeleteEnvironment {
                env: target.clone(),
            });
        }

        Action::HostCreateStart { wait } => {
            if next.waits.contains_key(&wait.url) {
                warn!(wait_url = %wait.url, "duplicate wait, keeping existing poller");
            } else {
                let mut wait = wait.clone();
                wait.outcome = WaitOutcome::Pending;
                next.hosts.push(Host {
                    name: None,
                    zone: wait.zone.clone(),
                    status: HostStatus::Waiting,
                    wait_url: Some(wait.url.clone()),
                });
                effects.push(Effect::PollWait { wait: wait.clone() });
                next.waits.insert(wait.url.clone(), wait);
            }
        }
        Action::HostCreateComplete { wait_url, host } => {
            if next.waits.remove(wait_url).is_none() {
                debug!(%wait_url, "stale host-create completion, ignoring");
            } else if let Some(pending) = next
                .hosts
                .iter_mut()
                .find(|h| h.wait_url.as_deref() == Some(wait_url.as_str()))
            {
                let zone = if host.zone.is_empty() {
                    pending.zone.clone()
                } else {
                    host.zone.clone()
                };
                *pending = Host {
                    name: host.name.clone(),
                    zone,
                    status: HostStatus::Ready,
                    wait_url: None,
                };
            } else {
                // completed host with no pending record
                let mut host = host.clone();
                host.status = HostStatus::Ready;
                host.wait_url = None;
                next.hosts.push(host);
            }
        }
        Action::HostCreateError { wait_url } => match wait_url {
            Some(url) => {
                if next.waits.remove(url).is_none() {
                    debug!(wait_url = %url, "stale host-create error, ignoring");
                } else if let Some(pending) = next
                    .hosts
                    .iter_mut()
                    .find(|h| h.wait_url.as_deref() == Some(url.as_str()))
                {
                    pending.status = HostStatus::Error;
                }
            }
            None => {
                // fail open: a global failure must not leave stuck waits
                warn!(
                    pending = next.waits.len(),
                    "global host-create failure, failing all pending waits"
                );
                next.waits.clear();
                for host in &mut next.hosts {
                    if host.status == HostStatus::Waiting {
                        host.status = HostStatus::Error;
                    }
                }
            }
        },
    }

    Transition {
        state: next,
        effects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Environment, Runtime, RuntimeStatus, Wait};

    fn runtime(alias: &str, url: &str) -> Runtime {
        Runtime {
            alias: alias.to_string(),
            url: url.to_string(),
            status: RuntimeStatus::Registered,
            initialized: false,
            refreshed_at: None,
        }
    }

    fn env(name: &str, runtime_alias: &str) -> Environment {
        Environment {
            name: name.to_string(),
            runtime_alias: runtime_alias.to_string(),
            host: "cf-host-1".to_string(),
            devices: vec![],
        }
    }

    fn wait(url: &str) -> Wait {
        Wait {
            url: url.to_string(),
            zone: "us-central1-b".to_string(),
            outcome: WaitOutcome::Pending,
            started_at: None,
        }
    }

    fn dispatch(state: State, actions: &[Action]) -> State {
        actions
            .iter()
            .fold(state, |s, a| apply(&s, a).state)
    }

    #[test]
    fn test_init_resets_to_empty_state() {
        let populated = dispatch(
            State::default(),
            &[
                Action::RuntimeRegisterComplete {
                    runtime: runtime("lab", "http://lab:8080"),
                },
                Action::HostCreateStart { wait: wait("/op/1") },
            ],
        );
        let transition = apply(&populated, &Action::Init);
        assert_eq!(transition.state, State::default());
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn test_register_flow_installs_active_runtime() {
        let transition = apply(
            &State::default(),
            &Action::RuntimeRegisterStart {
                alias: "lab".to_string(),
                url: "http://lab:8080".to_string(),
            },
        );
        assert_eq!(transition.state.registration, RegistrationPhase::Pending);
        assert_eq!(
            transition.effects,
            vec![Effect::ProbeRuntime {
                alias: "lab".to_string(),
                url: "http://lab:8080".to_string(),
            }]
        );

        let state = dispatch(
            transition.state,
            &[Action::RuntimeRegisterComplete {
                runtime: runtime("lab", "http://lab:8080"),
            }],
        );
        assert_eq!(state.registration, RegistrationPhase::Idle);
        assert_eq!(state.active_runtime.as_deref(), Some("lab"));
        assert!(state.runtimes.contains_key("lab"));
    }

    #[test]
    fn test_register_error_is_retryable() {
        let state = dispatch(
            State::default(),
            &[
                Action::RuntimeRegisterStart {
                    alias: "lab".to_string(),
                    url: "http://lab:8080".to_string(),
                },
                Action::RuntimeRegisterError,
            ],
        );
        assert_eq!(state.registration, RegistrationPhase::Failed);
        assert!(state.runtimes.is_empty());

        // operator retries by re-dispatching start
        let retried = apply(
            &state,
            &Action::RuntimeRegisterStart {
                alias: "lab".to_string(),
                url: "http://lab:8080".to_string(),
            },
        );
        assert_eq!(retried.state.registration, RegistrationPhase::Pending);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let state = dispatch(
            State::default(),
            &[Action::RuntimeRegisterComplete {
                runtime: runtime("lab", "http://lab:8080"),
            }],
        );
        let unregister = Action::RuntimeUnregister {
            alias: "lab".to_string(),
        };

        let once = apply(&state, &unregister).state;
        let twice = apply(&once, &unregister).state;
        assert_eq!(once, twice);
        assert!(once.runtimes.is_empty());
        assert_eq!(once.active_runtime, None);
    }

    #[test]
    fn test_unregister_drops_owned_environments() {
        let state = dispatch(
            State::default(),
            &[
                Action::RuntimeRegisterComplete {
                    runtime: runtime("lab", "http://lab:8080"),
                },
                Action::EnvCreateStart { env: env("ci", "lab") },
                Action::EnvCreateStart {
                    env: env("ci", "other"),
                },
                Action::RuntimeUnregister {
                    alias: "lab".to_string(),
                },
            ],
        );
        assert_eq!(state.environments.len(), 1);
        assert_eq!(state.environments[0].runtime_alias, "other");
    }

    #[test]
    fn test_runtime_load_merges_on_alias() {
        let state = dispatch(
            State::default(),
            &[
                Action::RuntimeLoad {
                    runtime: runtime("lab", "http://lab:8080"),
                },
                Action::RuntimeLoad {
                    runtime: runtime("lab", "http://lab:9090"),
                },
            ],
        );
        assert_eq!(state.runtimes.len(), 1);
        assert_eq!(state.runtimes["lab"].url, "http://lab:9090");
    }

    #[test]
    fn test_refresh_cycle_toggles_flag_and_carries_endpoints() {
        let state = dispatch(
            State::default(),
            &[
                Action::RuntimeLoad {
                    runtime: runtime("a", "http://a:8080"),
                },
                Action::RuntimeLoad {
                    runtime: runtime("b", "http://b:8080"),
                },
            ],
        );

        let transition = apply(&state, &Action::RuntimeRefreshStart);
        assert!(transition.state.refreshing);
        assert_eq!(
            transition.effects,
            vec![Effect::LoadRuntimes {
                endpoints: vec![
                    RuntimeEndpoint {
                        alias: "a".to_string(),
                        url: "http://a:8080".to_string(),
                    },
                    RuntimeEndpoint {
                        alias: "b".to_string(),
                        url: "http://b:8080".to_string(),
                    },
                ],
            }]
        );

        let done = apply(&transition.state, &Action::RuntimeLoadComplete).state;
        assert!(!done.refreshing);
    }

    #[test]
    fn test_env_create_records_intent_and_replaces_on_same_name() {
        let first = env("ci", "lab");
        let mut second = env("ci", "lab");
        second.host = "cf-host-2".to_string();

        let transition = apply(&State::default(), &Action::EnvCreateStart { env: first });
        assert_eq!(
            transition.effects,
            vec![Effect::CreateEnvironment {
                env: env("ci", "lab"),
            }]
        );

        let state = apply(
            &transition.state,
            &Action::EnvCreateStart { env: second },
        )
        .state;
        assert_eq!(state.environments.len(), 1);
        assert_eq!(state.environments[0].host, "cf-host-2");
    }

    #[test]
    fn test_env_delete_removes_record_and_requests_backend_delete() {
        let state = apply(
            &State::default(),
            &Action::EnvCreateStart { env: env("ci", "lab") },
        )
        .state;
        let transition = apply(
            &state,
            &Action::EnvDeleteStart {
                target: env("ci", "lab"),
            },
        );
        assert!(transition.state.environments.is_empty());
        assert_eq!(
            transition.effects,
            vec![Effect::DeleteEnvironment {
                env: env("ci", "lab"),
            }]
        );
    }

    #[test]
    fn test_env_delete_unrecorded_still_requests_backend_delete() {
        let transition = apply(
            &State::default(),
            &Action::EnvDeleteStart {
                target: env("ghost", "lab"),
            },
        );
        assert_eq!(transition.state, State::default());
        assert_eq!(
            transition.effects,
            vec![Effect::DeleteEnvironment {
                env: env("ghost", "lab"),
            }]
        );
    }

    #[test]
    fn test_host_create_start_inserts_wait_and_pending_host() {
        let transition = apply(
            &State::default(),
            &Action::HostCreateStart { wait: wait("/op/1") },
        );
        let state = &transition.state;
        assert_eq!(state.waits.len(), 1);
        assert_eq!(state.waits["/op/1"].outcome, WaitOutcome::Pending);
        assert_eq!(state.hosts.len(), 1);
        assert_eq!(state.hosts[0].status, HostStatus::Waiting);
        assert_eq!(state.hosts[0].name, None);
        assert_eq!(transition.effects, vec![Effect::PollWait { wait: wait("/op/1") }]);
    }

    #[test]
    fn test_duplicate_wait_keeps_existing_poller() {
        let state = apply(
            &State::default(),
            &Action::HostCreateStart { wait: wait("/op/1") },
        )
        .state;
        let transition = apply(&state, &Action::HostCreateStart { wait: wait("/op/1") });
        assert_eq!(transition.state, state);
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn test_stale_completion_leaves_state_unchanged() {
        let state = apply(
            &State::default(),
            &Action::HostCreateStart { wait: wait("/op/1") },
        )
        .state;
        let transition = apply(
            &state,
            &Action::HostCreateComplete {
                wait_url: "/op/unknown".to_string(),
                host: Host {
                    name: Some("h1".to_string()),
                    zone: String::new(),
                    status: HostStatus::Ready,
                    wait_url: None,
                },
            },
        );
        assert_eq!(transition.state, state);
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn test_global_error_fails_all_pending_waits() {
        let state = dispatch(
            State::default(),
            &[
                Action::HostCreateStart { wait: wait("/op/1") },
                Action::HostCreateStart { wait: wait("/op/2") },
                Action::HostCreateStart { wait: wait("/op/3") },
            ],
        );
        assert_eq!(state.waits.len(), 3);

        let failed = apply(&state, &Action::HostCreateError { wait_url: None }).state;
        assert!(failed.waits.is_empty());
        assert_eq!(failed.hosts.len(), 3);
        assert!(failed.hosts.iter().all(|h| h.status == HostStatus::Error));
    }

    #[test]
    fn test_targeted_error_fails_only_its_wait() {
        let state = dispatch(
            State::default(),
            &[
                Action::HostCreateStart { wait: wait("/op/1") },
                Action::HostCreateStart { wait: wait("/op/2") },
                Action::HostCreateError {
                    wait_url: Some("/op/1".to_string()),
                },
            ],
        );
        assert_eq!(state.waits.len(), 1);
        assert!(state.waits.contains_key("/op/2"));
        assert_eq!(state.host_for_wait("/op/1").unwrap().status, HostStatus::Error);
        assert_eq!(state.host_for_wait("/op/2").unwrap().status, HostStatus::Waiting);
    }

    #[test]
    fn test_host_create_end_to_end() {
        let state = apply(
            &State::default(),
            &Action::HostCreateStart { wait: wait("/op/1") },
        )
        .state;
        assert_eq!(state.waits.len(), 1);
        assert_eq!(state.hosts.len(), 1);

        let done = apply(
            &state,
            &Action::HostCreateComplete {
                wait_url: "/op/1".to_string(),
                host: Host {
                    name: Some("h1".to_string()),
                    zone: String::new(),
                    status: HostStatus::Ready,
                    wait_url: None,
                },
            },
        )
        .state;
        assert!(done.waits.is_empty());
        assert_eq!(done.hosts.len(), 1);
        assert_eq!(done.hosts[0].name.as_deref(), Some("h1"));
        assert_eq!(done.hosts[0].status, HostStatus::Ready);
        assert_eq!(done.hosts[0].wait_url, None);
        // zone preserved from the pending record
        assert_eq!(done.hosts[0].zone, "us-central1-b");
    }

    #[test]
    fn test_apply_is_deterministic() {
        let state = dispatch(
            State::default(),
            &[
                Action::RuntimeRegisterComplete {
                    runtime: runtime("lab", "http://lab:8080"),
                },
                Action::HostCreateStart { wait: wait("/op/1") },
            ],
        );
        let action = Action::RuntimeRefreshStart;

        let a = apply(&state, &action);
        let b = apply(&state, &action);
        assert_eq!(a.state, b.state);
        assert_eq!(a.effects, b.effects);
    }

    #[test]
    fn test_apply_never_mutates_the_previous_snapshot() {
        let state = apply(
            &State::default(),
            &Action::HostCreateStart { wait: wait("/op/1") },
        )
        .state;
        let before = state.clone();
        let _ = apply(&state, &Action::HostCreateError { wait_url: None });
        assert_eq!(state, before);
    }
}
