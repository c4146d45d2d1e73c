//! cvdfleet-core: Orchestration state machine and effect dispatch
//!
//! Implements the action vocabulary, the pure reducer over fleet state,
//! and the `StoreActor` that owns snapshots and hands requested effects
//! to the dispatcher. The core performs no I/O of its own; backends are
//! reached through the `ProvisioningBackend` trait and all results come
//! back in as further actions.

pub mod action;
pub mod actor;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod effect;
pub mod error;
pub mod message;
pub mod reducer;
pub mod state;

pub use action::{ACTION_TAGS, Action};
pub use actor::store::{BackendFactory, StoreActor, StoreActorArgs};
pub use config::{BuildDefaults, FleetConfig, HostDefaults, PollPolicy, RuntimeEndpoint};
pub use controller::Controller;
pub use effect::Effect;
pub use error::CoreError;
pub use message::{
    Dispatch, EventStream, GetSnapshot, Snapshot, SnapshotStream, SubscribeEvents, WatchState,
};
pub use reducer::{Transition, apply};
pub use state::{
    Environment, Host, HostStatus, RegistrationPhase, Runtime, RuntimeStatus, State, Wait,
    WaitOutcome,
};
