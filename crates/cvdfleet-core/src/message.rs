//! Message types for the store actor
//!
//! Message handlers are implemented in `actor::store`.

use std::sync::Arc;

use kameo_macros::Reply;
use tokio::sync::{broadcast, watch};

use cvdfleet_api::events::FleetEvent;

use crate::action::Action;
use crate::state::State;

/// Apply one action to the store
#[derive(Debug)]
pub struct Dispatch {
    pub action: Action,
}

/// Get the current state snapshot
#[derive(Debug)]
pub struct GetSnapshot;

/// Subscribe to fleet events
#[derive(Debug)]
pub struct SubscribeEvents;

/// Watch state snapshots as they are published
#[derive(Debug)]
pub struct WatchState;

/// A shared, immutable state snapshot
#[derive(Debug, Clone, Reply)]
pub struct Snapshot(pub Arc<State>);

/// Receiver half of the fleet event channel
#[derive(Debug, Reply)]
pub struct EventStream(pub broadcast::Receiver<FleetEvent>);

/// Receiver half of the snapshot channel
#[derive(Debug, Reply)]
pub struct SnapshotStream(pub watch::Receiver<Arc<State>>);
