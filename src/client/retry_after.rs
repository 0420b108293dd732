//! `Retry-After` header parsing.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Obsolete HTTP-date forms recipients must still accept: RFC 850 and asctime.
const OBSOLETE_DATE_FORMATS: &[&str] = &["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"];

/// Parse a `Retry-After` value into a wait duration.
///
/// Accepts delay-seconds (integer or fractional) or an HTTP-date in any of its
/// three forms (IMF-fixdate, RFC 850, asctime). Past dates
/// and negative values clamp to zero. Missing or unparseable values yield
/// `None`, leaving the wait to backoff.
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    parse_retry_after_at(value, Utc::now())
}

pub(crate) fn parse_retry_after_at(value: Option<&str>, now: DateTime<Utc>) -> Option<Duration> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<f64>() {
        if !seconds.is_finite() {
            return None;
        }
        return Duration::try_from_secs_f64(seconds.max(0.0)).ok();
    }

    let retry_at = parse_http_date(value)?;
    Some((retry_at - now).to_std().unwrap_or(Duration::ZERO))
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    OBSOLETE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
