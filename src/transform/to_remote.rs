use calsync_core::LocalEvent;
use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::google::types::{EventPayload, TimePayload};

/// Map a local event to an outbound provider payload.
///
/// An event spanning exactly 00:00:00 to 23:59:59 in the deployment
/// timezone is emitted in all-day `date` form with the provider's
/// exclusive end convention (last included day + 1). Anything else is
/// emitted as RFC 3339 timestamps with the timezone identifier stamped.
pub fn local_to_remote(event: &LocalEvent, tz: Tz) -> EventPayload {
    let start_local = event.starts_at.with_timezone(&tz);
    let end_local = event.ends_at.with_timezone(&tz);

    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59);
    let all_day = start_local.time() == NaiveTime::MIN && Some(end_local.time()) == end_of_day;

    let (start, end) = if all_day {
        let last_day = end_local.date_naive();
        let end_exclusive = last_day.succ_opt().unwrap_or(last_day);
        (
            TimePayload {
                date: Some(start_local.date_naive()),
                date_time: None,
                time_zone: None,
            },
            TimePayload {
                date: Some(end_exclusive),
                date_time: None,
                time_zone: None,
            },
        )
    } else {
        (
            TimePayload {
                date: None,
                date_time: Some(start_local.to_rfc3339()),
                time_zone: Some(tz.name().to_string()),
            },
            TimePayload {
                date: None,
                date_time: Some(end_local.to_rfc3339()),
                time_zone: Some(tz.name().to_string()),
            },
        )
    };

    EventPayload {
        summary: event.title.clone(),
        start,
        end,
        location: event.location.clone(),
    }
}
