//! Core types for the calsync engine.
//!
//! This crate provides the data model shared between the sync engine and
//! its host application:
//! - `LocalEvent` and related types for locally stored events
//! - `TokenRecord` / `SyncCursor` for per-owner connection state
//! - `SyncError` for the engine's error taxonomy

pub mod account;
pub mod error;
pub mod event;

// Re-export at crate root for convenience
pub use account::*;
pub use error::*;
pub use event::*;
