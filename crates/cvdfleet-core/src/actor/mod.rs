//! Actor implementations

pub mod store;

pub use store::{BackendFactory, StoreActor, StoreActorArgs};
