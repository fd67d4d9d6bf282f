//! Small helpers shared by the core and its clients.

/// Trimmed copy of `value`, or `None` when only whitespace remains.
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Wall-clock time as Unix milliseconds, the unit of every `updated_at`.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
