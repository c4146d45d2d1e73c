//! Effect execution against the provisioning backend
//!
//! The only component that performs I/O. Results come back into the
//! store as follow-up actions, never as direct state mutation.

use std::sync::Arc;

use chrono::Utc;
use kameo::actor::WeakActorRef;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use cvdfleet_api::responses::{HostInstance, Operation};
use cvdfleet_client::ProvisioningBackend;

use crate::action::Action;
use crate::actor::store::{BackendFactory, StoreActor};
use crate::config::{FleetConfig, RuntimeEndpoint};
use crate::effect::Effect;
use crate::message::Dispatch;
use crate::state::{Host, HostStatus, Runtime, RuntimeStatus, Wait};

/// Execute one effect.
///
/// Request-only effects (environment create/delete) are awaited inline so
/// the dispatch reply implies the request was issued; effects that feed
/// actions back (probes, reloads, wait polls) run in their own tasks.
pub(crate) async fn run_effect(
    effect: Effect,
    backend: Arc<dyn ProvisioningBackend>,
    factory: Arc<dyn BackendFactory>,
    store: WeakActorRef<StoreActor>,
    config: FleetConfig,
) {
    match effect {
        Effect::ProbeRuntime { alias, url } => {
            tokio::spawn(async move {
                probe_runtime(alias, url, factory, &store, &config).await;
            });
        }
        Effect::LoadRuntimes { endpoints } => {
            tokio::spawn(async move {
                load_runtimes(endpoints, factory, &store, &config).await;
            });
        }
        Effect::CreateEnvironment { env } => {
            let instances = u32::try_from(env.devices.len()).ok().filter(|n| *n > 0);
            let req = config.build.to_request(instances);
            match backend.create_cvds(&config.zone, &env.host, &req).await {
                Ok(op) => {
                    info!(env = %env.name, operation = %op.name, "environment creation accepted");
                }
                Err(e) => {
                    error!(env = %env.name, error = %e, "environment creation failed");
                }
            }
            // settles via a later refresh, no completion action
        }
        Effect::DeleteEnvironment { env } => {
            match backend.delete_cvd(&config.zone, &env.host, &env.name).await {
                Ok(op) => {
                    info!(env = %env.name, operation = %op.name, "environment deletion accepted");
                }
                Err(e) => {
                    error!(env = %env.name, error = %e, "environment deletion failed");
                }
            }
        }
        Effect::PollWait { wait } => {
            tokio::spawn(async move {
                poll_wait(wait, backend, &store, &config).await;
            });
        }
    }
}

/// Validate an endpoint and feed the registration outcome back in
async fn probe_runtime(
    alias: String,
    url: String,
    factory: Arc<dyn BackendFactory>,
    store: &WeakActorRef<StoreActor>,
    config: &FleetConfig,
) {
    match probe(&alias, &url, factory.as_ref(), config).await {
        Ok(runtime) => {
            dispatch(store, Action::RuntimeRegisterComplete { runtime }).await;
            // endpoint probing is the post-registration setup
            dispatch(store, Action::RuntimeInit).await;
        }
        Err(e) => {
            error!(%alias, %url, error = %e, "runtime registration failed");
            dispatch(store, Action::RuntimeRegisterError).await;
        }
    }
}

/// Re-probe every known endpoint, one `runtime-load` per item
async fn load_runtimes(
    endpoints: Vec<RuntimeEndpoint>,
    factory: Arc<dyn BackendFactory>,
    store: &WeakActorRef<StoreActor>,
    config: &FleetConfig,
) {
    for endpoint in endpoints {
        let runtime = match probe(&endpoint.alias, &endpoint.url, factory.as_ref(), config).await {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(alias = %endpoint.alias, error = %e, "runtime unreachable during refresh");
                Runtime {
                    alias: endpoint.alias,
                    url: endpoint.url,
                    status: RuntimeStatus::Error,
                    initialized: false,
                    refreshed_at: Some(Utc::now()),
                }
            }
        };
        dispatch(store, Action::RuntimeLoad { runtime }).await;
    }
    dispatch(store, Action::RuntimeLoadComplete).await;
}

async fn probe(
    alias: &str,
    url: &str,
    factory: &dyn BackendFactory,
    config: &FleetConfig,
) -> Result<Runtime, String> {
    let backend = factory
        .create_backend(url)
        .await
        .map_err(|e| e.to_string())?;
    backend
        .list_hosts(&config.zone)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Runtime {
        alias: alias.to_string(),
        url: url.to_string(),
        status: RuntimeStatus::Registered,
        initialized: false,
        refreshed_at: Some(Utc::now()),
    })
}

/// Poll a wait URL until terminal status or timeout
async fn poll_wait(
    wait: Wait,
    backend: Arc<dyn ProvisioningBackend>,
    store: &WeakActorRef<StoreActor>,
    config: &FleetConfig,
) {
    let deadline = Instant::now() + config.poll.timeout();
    let mut interval = tokio::time::interval(config.poll.interval());

    loop {
        interval.tick().await;

        match backend.get_operation(&wait.url).await {
            Ok(op) if op.done => {
                if let Some(message) = op.error_message() {
                    error!(wait_url = %wait.url, error = message, "host creation failed");
                    dispatch(
                        store,
                        Action::HostCreateError {
                            wait_url: Some(wait.url.clone()),
                        },
                    )
                    .await;
                } else {
                    let host = host_from_operation(&wait, &op);
                    dispatch(
                        store,
                        Action::HostCreateComplete {
                            wait_url: wait.url.clone(),
                            host,
                        },
                    )
                    .await;
                }
                return;
            }
            Ok(_) => {
                debug!(wait_url = %wait.url, "operation still in progress");
            }
            Err(e) => {
                error!(wait_url = %wait.url, error = %e, "wait poll failed");
                dispatch(
                    store,
                    Action::HostCreateError {
                        wait_url: Some(wait.url.clone()),
                    },
                )
                .await;
                return;
            }
        }

        if Instant::now() >= deadline {
            warn!(wait_url = %wait.url, "wait timed out");
            dispatch(
                store,
                Action::HostCreateError {
                    wait_url: Some(wait.url.clone()),
                },
            )
            .await;
            return;
        }
    }
}

/// The completed host described by a done operation
fn host_from_operation(wait: &Wait, op: &Operation) -> Host {
    let name = op
        .response()
        .and_then(|r| serde_json::from_value::<HostInstance>(r.clone()).ok())
        .map(|h| h.name);
    if name.is_none() {
        debug!(wait_url = %wait.url, "done operation carried no host record");
    }
    Host {
        name,
        zone: wait.zone.clone(),
        status: HostStatus::Ready,
        wait_url: None,
    }
}

/// Feed a follow-up action back into the store
async fn dispatch(store: &WeakActorRef<StoreActor>, action: Action) {
    let Some(store) = store.upgrade() else {
        debug!(action = action.tag(), "store gone, dropping follow-up action");
        return;
    };
    if let Err(e) = store.tell(Dispatch { action }).await {
        error!(error = %e, "failed to dispatch follow-up action");
    }
}
