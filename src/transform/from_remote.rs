use calsync_core::{EventKind, EventPatch, EventSource, LocalEvent};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::google::types::RemoteEvent;

/// Map a remote event into a fresh local row.
///
/// Returns `None` for cancelled events (deletion is handled separately by
/// the pull phase, not via this mapping) and for events lacking a usable
/// start and end.
pub fn remote_to_local(event: &RemoteEvent, owner_id: &str, tz: Tz) -> Option<LocalEvent> {
    if event.is_cancelled() {
        return None;
    }
    let (starts_at, ends_at) = event_window(event, tz)?;

    Some(LocalEvent {
        id: LocalEvent::new_id(),
        owner_id: owner_id.to_string(),
        title: title_of(event),
        kind: EventKind::Meeting,
        starts_at,
        ends_at,
        project_id: None,
        source: EventSource::Remote,
        external_id: Some(event.id.clone()),
        location: event.location.clone(),
        attendee_ids: Vec::new(),
    })
}

/// The mutable-field subset of a remote event, applied to an already
/// known local row during the pull phase.
pub fn patch_from_remote(event: &RemoteEvent, tz: Tz) -> Option<EventPatch> {
    if event.is_cancelled() {
        return None;
    }
    let (starts_at, ends_at) = event_window(event, tz)?;

    Some(EventPatch {
        title: title_of(event),
        starts_at,
        ends_at,
        location: event.location.clone(),
    })
}

fn title_of(event: &RemoteEvent) -> String {
    event
        .summary
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "(No title)".to_string())
}

/// Resolve the event's start/end to UTC timestamps.
///
/// All-day events carry an exclusive end date; the local end becomes the
/// previous day at 23:59:59 in the deployment timezone. Timed events
/// pass through verbatim.
fn event_window(event: &RemoteEvent, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = event.start.as_ref()?;
    let end = event.end.as_ref()?;

    match (start.date, end.date) {
        (Some(first_day), Some(end_exclusive)) => {
            let last_day = end_exclusive.pred_opt()?;
            let starts_at = resolve_local(tz, first_day.and_time(NaiveTime::MIN))?;
            let ends_at = resolve_local(tz, last_day.and_hms_opt(23, 59, 59)?)?;
            Some((starts_at, ends_at))
        }
        _ => Some((start.date_time?, end.date_time?)),
    }
}

/// Resolve a local wall-clock time in `tz`. Ambiguous times (DST fold)
/// take the earlier instant; times inside a DST gap shift forward an
/// hour, which is where the skipped wall clock lands.
fn resolve_local(tz: Tz, local: chrono::NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(local + chrono::Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
}
