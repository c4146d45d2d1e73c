//! `StoreActor`: single-threaded owner of orchestrator state
//!
//! Every mutation passes through this actor's mailbox: it runs the pure
//! reducer, publishes the new snapshot, and hands requested effects to
//! the dispatcher. Consumers only ever hold `Arc<State>` snapshots.

use std::sync::Arc;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use cvdfleet_api::events::FleetEvent;
use cvdfleet_client::ProvisioningBackend;

use crate::action::Action;
use crate::config::FleetConfig;
use crate::dispatcher;
use crate::error::CoreError;
use crate::message::{
    Dispatch, EventStream, GetSnapshot, Snapshot, SnapshotStream, SubscribeEvents, WatchState,
};
use crate::reducer;
use crate::state::State;

/// Factory trait for creating control-plane backends
///
/// Allows one backend per runtime endpoint.
#[async_trait::async_trait]
pub trait BackendFactory: Send + Sync {
    /// Create a backend for the given control-plane URL
    async fn create_backend(&self, url: &str) -> Result<Arc<dyn ProvisioningBackend>, CoreError>;
}

/// Arguments for spawning a `StoreActor`
pub struct StoreActorArgs {
    /// Fleet configuration
    pub config: FleetConfig,
    /// Event broadcast channel capacity
    pub event_channel_capacity: usize,
    /// Factory for creating control-plane backends
    pub backend_factory: Arc<dyn BackendFactory>,
}

/// Store actor owning the fleet state snapshot
pub struct StoreActor {
    config: FleetConfig,
    state: Arc<State>,
    /// Latest-snapshot channel for view-layer watchers
    snapshot_tx: watch::Sender<Arc<State>>,
    /// Event broadcast sender
    event_tx: broadcast::Sender<FleetEvent>,
    /// Backend for the configured service URL
    backend: Arc<dyn ProvisioningBackend>,
    /// Factory for per-runtime backends
    backend_factory: Arc<dyn BackendFactory>,
    /// Own reference handed to effect tasks for follow-up dispatch
    self_ref: WeakActorRef<Self>,
}

impl Actor for StoreActor {
    type Args = StoreActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        let (event_tx, _) = broadcast::channel(args.event_channel_capacity);
        let state = Arc::new(State::default());
        let (snapshot_tx, _) = watch::channel(state.clone());

        let backend = args
            .backend_factory
            .create_backend(&args.config.service_url)
            .await?;

        info!(
            id = %actor_ref.id(),
            service_url = %args.config.service_url,
            backend = backend.backend_type(),
            "StoreActor starting"
        );

        Ok(Self {
            config: args.config,
            state,
            snapshot_tx,
            event_tx,
            backend,
            backend_factory: args.backend_factory,
            self_ref: actor_ref.downgrade(),
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(reason = ?reason, "StoreActor stopping");
        Ok(())
    }
}

impl StoreActor {
    /// Derive the fleet event announcing an applied action
    fn event_for(action: &Action, state: &State) -> Option<FleetEvent> {
        let event = match action {
            Action::Init => FleetEvent::StoreReset,
            Action::RuntimeRegisterStart { alias, .. } => FleetEvent::RuntimeRegistering {
                alias: alias.clone(),
            },
            Action::RuntimeRegisterComplete { runtime } => FleetEvent::RuntimeRegistered {
                alias: runtime.alias.clone(),
            },
            Action::RuntimeRegisterError => FleetEvent::RuntimeRegisterFailed,
            Action::RuntimeUnregister { alias } => FleetEvent::RuntimeUnregistered {
                alias: alias.clone(),
            },
            Action::RuntimeInit => FleetEvent::RuntimeInitialized {
                alias: state.active_runtime.clone()?,
            },
            Action::RuntimeRefreshStart => FleetEvent::RuntimeRefreshStarted,
            Action::RuntimeLoad { runtime } => FleetEvent::RuntimeLoaded {
                alias: runtime.alias.clone(),
            },
            Action::RuntimeLoadComplete => FleetEvent::RuntimeRefreshCompleted,
            Action::EnvCreateStart { env } => FleetEvent::EnvironmentRequested {
                runtime: env.runtime_alias.clone(),
                name: env.name.clone(),
            },
            Action::EnvDeleteStart { target } => FleetEvent::EnvironmentDeleteRequested {
                runtime: target.runtime_alias.clone(),
                name: target.name.clone(),
            },
            Action::HostCreateStart { wait } => FleetEvent::HostRequested {
                wait_url: wait.url.clone(),
            },
            Action::HostCreateComplete { wait_url, host } => FleetEvent::HostReady {
                wait_url: wait_url.clone(),
                name: host.name.clone().unwrap_or_default(),
            },
            Action::HostCreateError { wait_url } => FleetEvent::HostFailed {
                wait_url: wait_url.clone(),
            },
        };
        Some(event)
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<Dispatch> for StoreActor {
    type Reply = Result<Snapshot, CoreError>;

    async fn handle(
        &mut self,
        msg: Dispatch,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        debug!(action = msg.action.tag(), "applying action");

        let transition = reducer::apply(&self.state, &msg.action);
        let next = Arc::new(transition.state);
        self.state = next.clone();

        // Publish the snapshot first so event subscribers reading the
        // watch channel see the state the event describes. send_replace
        // stores the value even with no receivers attached yet.
        let _ = self.snapshot_tx.send_replace(next.clone());
        if let Some(event) = Self::event_for(&msg.action, &next) {
            // Ignore send errors (no subscribers is fine)
            let _ = self.event_tx.send(event);
        }

        for effect in transition.effects {
            dispatcher::run_effect(
                effect,
                self.backend.clone(),
                self.backend_factory.clone(),
                self.self_ref.clone(),
                self.config.clone(),
            )
            .await;
        }

        Ok(Snapshot(next))
    }
}

impl Message<GetSnapshot> for StoreActor {
    type Reply = Snapshot;

    async fn handle(
        &mut self,
        _msg: GetSnapshot,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Snapshot(self.state.clone())
    }
}

impl Message<SubscribeEvents> for StoreActor {
    type Reply = EventStream;

    async fn handle(
        &mut self,
        _msg: SubscribeEvents,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        EventStream(self.event_tx.subscribe())
    }
}

impl Message<WatchState> for StoreActor {
    type Reply = SnapshotStream;

    async fn handle(
        &mut self,
        _msg: WatchState,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        SnapshotStream(self.snapshot_tx.subscribe())
    }
}
