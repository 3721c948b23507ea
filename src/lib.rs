//! Bidirectional sync engine between a locally-owned event store and an
//! external calendar provider reachable through a paginated, cursor-based
//! REST API.
//!
//! A full cycle is two-phase: Phase 1 pulls remote changes into the local
//! store (driven by the provider's incremental sync cursor), Phase 2
//! pushes local-only events out. `SyncOrchestrator` drives full cycles,
//! `SinglePushHandler` propagates one event immediately after a local
//! create/update/delete.
//!
//! The host application supplies persistence by implementing the
//! [`store::EventStore`] and [`store::AccountStore`] ports; provider I/O
//! goes through [`google::CalendarApi`], implemented over HTTP by
//! [`google::RemoteEventClient`].

pub mod config;
pub mod google;
pub mod lock;
pub mod push;
pub mod store;
pub mod sync;
pub mod token;
pub mod transform;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export the shared data model and the main entry points at crate root
pub use calsync_core::*;
pub use config::SyncConfig;
pub use push::{PushAction, SinglePushHandler};
pub use sync::{CancelFlag, SyncOrchestrator, SyncOutcome};
