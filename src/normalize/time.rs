//! UTC timestamp parsing and RFC 3339 formatting.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO-8601 timestamp as UTC.
///
/// Offsets (`Z` or `±hh:mm`) are converted to UTC; timestamps without an
/// offset are taken to be UTC already.
pub fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// RFC 3339 in UTC with a literal `Z`, fractional seconds only when non-zero.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) mod rfc3339_z {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_utc(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_utc(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp {raw:?}")))
    }
}

pub(crate) mod rfc3339_z_option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(
        dt: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_str(&super::format_utc(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_utc(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp {raw:?}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_zulu() {
        let dt = parse_utc("2025-01-03T15:52:10Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 3, 15, 52, 10).unwrap());
    }

    #[test]
    fn test_parse_offset_converts_to_utc() {
        let dt = parse_utc("2025-01-03T17:52:10+02:00").unwrap();
        assert_eq!(format_utc(&dt), "2025-01-03T15:52:10Z");
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let dt = parse_utc("2025-01-03T15:52:10.250").unwrap();
        assert_eq!(format_utc(&dt), "2025-01-03T15:52:10.250Z");
        assert!(parse_utc("2025-01-03 15:52:10").is_some());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_utc("").is_none());
        assert!(parse_utc("yesterday").is_none());
        assert!(parse_utc("2025-13-03T15:52:10Z").is_none());
    }

    #[test]
    fn test_format_never_uses_numeric_offset() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap();
        let formatted = format_utc(&dt);
        assert!(formatted.ends_with('Z'));
        assert!(!formatted.contains("+00:00"));
    }
}
