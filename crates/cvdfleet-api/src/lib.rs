//! cvdfleet-api: Shared API types and schemas
//!
//! Contains the request/response types of the provisioning control plane
//! and the fleet event types published to front-end subscribers.

pub mod requests;
pub mod responses;
pub mod events;
