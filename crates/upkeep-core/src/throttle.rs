use chrono::{Duration, NaiveDateTime};

/// True when a notification stamped `sent_at` still suppresses repeats at `now`.
///
/// Mirrors `sent_at >= NOW() - INTERVAL days DAY`: with `days == 0` only a row
/// stamped at (or after) the current instant throttles. A window reaching past
/// the earliest representable instant throttles everything.
pub fn within_cooldown(sent_at: NaiveDateTime, now: NaiveDateTime, throttle_days: u32) -> bool {
    now.checked_sub_signed(Duration::days(i64::from(throttle_days)))
        .map_or(true, |cutoff| sent_at >= cutoff)
}
