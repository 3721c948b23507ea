//! Provider wire types and the HTTP client for the calendar REST API.

pub mod client;
pub mod types;

pub use client::{CalendarApi, RemoteEventClient};
pub use types::{EventPayload, EventsPage, RemoteEvent, RemoteEventTime, TimePayload};
