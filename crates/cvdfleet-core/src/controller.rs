//! View-facing facade over the store actor
//!
//! Bundles the store, the primary backend and the configuration into the
//! typed surface front ends drive. Read-only queries go straight to the
//! backend; everything that changes state goes through actions.

use std::sync::Arc;

use kameo::actor::ActorRef;
use kameo::prelude::*;
use tokio::sync::{broadcast, watch};

use cvdfleet_api::events::FleetEvent;
use cvdfleet_api::requests::CreateHostRequest;
use cvdfleet_api::responses::{DeviceDescriptor, ListHostsResponse, Operation};
use cvdfleet_client::ProvisioningBackend;

use crate::action::Action;
use crate::actor::store::{BackendFactory, StoreActor, StoreActorArgs};
use crate::config::FleetConfig;
use crate::error::CoreError;
use crate::message::{Dispatch, GetSnapshot, SubscribeEvents, WatchState};
use crate::state::{Environment, State, Wait};

/// Front-end handle to a running fleet store
pub struct Controller {
    store: ActorRef<StoreActor>,
    backend: Arc<dyn ProvisioningBackend>,
    config: FleetConfig,
}

impl Controller {
    /// Spawn the store actor and connect to the configured service
    ///
    /// # Errors
    /// Returns an error if the primary backend cannot be created.
    pub async fn spawn(
        config: FleetConfig,
        factory: Arc<dyn BackendFactory>,
    ) -> Result<Self, CoreError> {
        let backend = factory.create_backend(&config.service_url).await?;
        let store = StoreActor::spawn(StoreActorArgs {
            config: config.clone(),
            event_channel_capacity: 1024,
            backend_factory: factory,
        });
        Ok(Self {
            store,
            backend,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Apply one action, returning the resulting snapshot
    ///
    /// # Errors
    /// Returns an error if the store is unreachable or rejects the action.
    pub async fn dispatch(&self, action: Action) -> Result<Arc<State>, CoreError> {
        self.store
            .ask(Dispatch { action })
            .await
            .map(|snapshot| snapshot.0)
            .map_err(|e| CoreError::ActorError(e.to_string()))
    }

    /// Parse and apply an action given as JSON
    ///
    /// # Errors
    /// Returns [`CoreError::UnhandledAction`]/[`CoreError::MalformedAction`]
    /// for bad input, or a dispatch error.
    pub async fn dispatch_json(&self, value: &serde_json::Value) -> Result<Arc<State>, CoreError> {
        let action = Action::from_json(value)?;
        self.dispatch(action).await
    }

    /// Current state snapshot
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    pub async fn snapshot(&self) -> Result<Arc<State>, CoreError> {
        self.store
            .ask(GetSnapshot)
            .await
            .map(|snapshot| snapshot.0)
            .map_err(|e| CoreError::ActorError(e.to_string()))
    }

    /// Subscribe to fleet events
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    pub async fn subscribe_events(&self) -> Result<broadcast::Receiver<FleetEvent>, CoreError> {
        self.store
            .ask(SubscribeEvents)
            .await
            .map(|stream| stream.0)
            .map_err(|e| CoreError::ActorError(e.to_string()))
    }

    /// Watch state snapshots as they are published
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    pub async fn watch_state(&self) -> Result<watch::Receiver<Arc<State>>, CoreError> {
        self.store
            .ask(WatchState)
            .await
            .map(|stream| stream.0)
            .map_err(|e| CoreError::ActorError(e.to_string()))
    }

    /// Register a control-plane runtime under the given alias
    ///
    /// # Errors
    /// Returns an error if the action cannot be dispatched.
    pub async fn register_runtime(
        &self,
        alias: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Arc<State>, CoreError> {
        self.dispatch(Action::RuntimeRegisterStart {
            alias: alias.into(),
            url: url.into(),
        })
        .await
    }

    /// Unregister a runtime; unknown aliases are a no-op
    ///
    /// # Errors
    /// Returns an error if the action cannot be dispatched.
    pub async fn unregister_runtime(
        &self,
        alias: impl Into<String>,
    ) -> Result<Arc<State>, CoreError> {
        self.dispatch(Action::RuntimeUnregister {
            alias: alias.into(),
        })
        .await
    }

    /// Start a refresh cycle over all known runtimes
    ///
    /// # Errors
    /// Returns an error if the action cannot be dispatched.
    pub async fn refresh_runtimes(&self) -> Result<Arc<State>, CoreError> {
        self.dispatch(Action::RuntimeRefreshStart).await
    }

    /// Request creation of a host instance.
    ///
    /// POSTs the creation request (the wait URL only exists once the
    /// backend replies), then hands the returned wait to the store; from
    /// there the flow is effect-driven. Returns the wait URL tracking the
    /// request.
    ///
    /// # Errors
    /// Returns an error if the backend rejects the request or the action
    /// cannot be dispatched.
    pub async fn create_host(
        &self,
        req: Option<CreateHostRequest>,
    ) -> Result<String, CoreError> {
        let req = req.unwrap_or_else(|| self.config.host.to_request());
        let op = self
            .backend
            .create_host(&self.config.zone, &req)
            .await
            .map_err(|e| CoreError::Backend(e.to_string()))?;
        let wait = Wait::new(op.name.clone(), self.config.zone.clone());
        self.dispatch(Action::HostCreateStart { wait }).await?;
        Ok(op.name)
    }

    /// Request creation of a CVD environment
    ///
    /// # Errors
    /// Returns an error if the action cannot be dispatched.
    pub async fn create_environment(&self, env: Environment) -> Result<Arc<State>, CoreError> {
        self.dispatch(Action::EnvCreateStart { env }).await
    }

    /// Request deletion of a CVD environment
    ///
    /// # Errors
    /// Returns an error if the action cannot be dispatched.
    pub async fn delete_environment(&self, target: Environment) -> Result<Arc<State>, CoreError> {
        self.dispatch(Action::EnvDeleteStart { target }).await
    }

    // Read-through queries; these never touch state.

    /// List host instances in the configured zone
    ///
    /// # Errors
    /// Returns an error if the backend request fails.
    pub async fn list_hosts(&self) -> Result<ListHostsResponse, CoreError> {
        self.backend
            .list_hosts(&self.config.zone)
            .await
            .map_err(|e| CoreError::Backend(e.to_string()))
    }

    /// List virtual devices on a host
    ///
    /// # Errors
    /// Returns an error if the backend request fails.
    pub async fn list_devices(&self, host: &str) -> Result<Vec<DeviceDescriptor>, CoreError> {
        self.backend
            .list_devices(&self.config.zone, host)
            .await
            .map_err(|e| CoreError::Backend(e.to_string()))
    }

    /// Fetch the status of an operation by its wait URL
    ///
    /// # Errors
    /// Returns an error if the backend request fails.
    pub async fn get_operation(&self, wait_url: &str) -> Result<Operation, CoreError> {
        self.backend
            .get_operation(wait_url)
            .await
            .map_err(|e| CoreError::Backend(e.to_string()))
    }

    /// Stop the store actor gracefully
    ///
    /// # Errors
    /// Returns an error if the actor fails to stop.
    pub async fn shutdown(self) -> Result<(), CoreError> {
        self.store
            .stop_gracefully()
            .await
            .map_err(|e| CoreError::ActorError(e.to_string()))
    }
}
