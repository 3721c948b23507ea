//! Pure bidirectional mapping between local events and the provider's
//! event representation, including all-day/timezone normalization.
//!
//! The provider models all-day events with an exclusive end date; locally
//! they are stored as inclusive timestamp ranges pinned to the
//! deployment's timezone (00:00:00 start, 23:59:59 end).

mod from_remote;
mod to_remote;

pub use from_remote::{patch_from_remote, remote_to_local};
pub use to_remote::local_to_remote;
