use chrono::{DateTime, Duration, Utc};

/// Activity recency window for a user to count as online.
pub const ONLINE_WINDOW_MINUTES: i64 = 5;

/// Presence is derived on demand from `last_seen`; nothing tracks
/// connections in the background. `last_seen` is written by the auth
/// middleware on every authenticated request.
pub fn is_online(last_seen: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - last_seen < Duration::minutes(ONLINE_WINDOW_MINUTES)
}
